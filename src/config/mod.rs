//! Service configuration
//!
//! Configuration is plain YAML. Every field has a default, so an empty file
//! (or no file at all) yields a working layout under the platform data dir.

mod service_config;

pub use service_config::{EngineModelConfig, ServiceConfig, ServiceConfigBuilder};
