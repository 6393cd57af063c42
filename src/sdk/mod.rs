//! Service API for callers
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use unified_voice::sdk::VoiceServiceBuilder;
//! use unified_voice::engine::SynthesisOptions;
//!
//! let service = VoiceServiceBuilder::new()
//!     .feature_vector_loader(load_converter)
//!     .build()?;
//!
//! if service.extract_and_save_speaker_feature("bob", "bob.wav", None) {
//!     let wav = service.generate_speech("hello", "bob", None, &SynthesisOptions::default());
//! }
//! ```

pub mod builder;
pub mod facade;
pub mod recommend;
pub mod types;

pub use builder::VoiceServiceBuilder;
pub use facade::VoiceService;
pub use types::*;

/// Re-export commonly used types
pub use crate::engine::{EngineKind, RoutedSynthesis, SynthesisMode, SynthesisOptions};
pub use crate::speaker::SpeakerSummary;
