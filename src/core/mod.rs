//! Core framework-level components
//!
//! - `error`: the crate-wide error type and result alias

pub mod error;

pub use error::{AudioOperation, Result, TtsError};
