//! # Unified Voice - voice-cloning orchestration
//!
//! Enroll speakers from reference audio and synthesize speech in their voice
//! through one of two engines:
//!
//! - **feature_vector** (default): the voice is a persisted embedding
//!   extracted once at enrollment
//! - **cached_identity**: the voice is an identifier cached inside the
//!   model runtime, with zero-shot, cross-lingual, instruction and
//!   fine-control modes
//!
//! Inference backends are injected as model loaders; models load lazily on
//! first use and a failed load is retried on the next call.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unified_voice::{EngineKind, SynthesisOptions, VoiceServiceBuilder};
//!
//! let service = VoiceServiceBuilder::new()
//!     .data_dir("./voice-data")
//!     .feature_vector_loader(load_converter)
//!     .cached_identity_loader(load_cached_model)
//!     .build()?;
//!
//! service.extract_and_save_speaker_feature("bob", "bob.wav", Some(EngineKind::CachedIdentity));
//!
//! let wav = service.generate_multilingual_speech("Good morning", "bob", "en");
//! let wav = service.generate_speech(
//!     "今天天气很好",
//!     "bob",
//!     None,
//!     &SynthesisOptions::new().with_emotion("happy").with_speed(1.2),
//! );
//! ```

pub mod audio;
pub mod config;
pub mod core;
pub mod engine;
pub mod sdk;
pub mod speaker;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::core::error::{Result, TtsError};
pub use engine::{EngineKind, SynthesisMode, SynthesisOptions};
pub use sdk::{ServiceStatus, VoiceService, VoiceServiceBuilder};
pub use speaker::{SpeakerFeature, SpeakerSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Marker that terminates every prompt handed to the cached-identity model
pub const END_OF_PROMPT: &str = "<|endofprompt|>";

/// Prompt used when enrolling without a description
pub const DEFAULT_PROMPT: &str = "You are a helpful assistant.<|endofprompt|>";

/// `created_time` format in the registry document
pub const CREATED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
