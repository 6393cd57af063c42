//! Voice engine layer
//!
//! - `traits`: engine kinds, the adapter contract, inference capabilities
//! - `model_handle`: lazy model acquisition with retry
//! - `control`: language tags and fine-control compilation
//! - `request`: options and the resolved request union
//! - `feature_store`: persisted embeddings
//! - `feature_vector` / `cached_identity`: the two adapters
//! - `router`: engine/mode selection and fallback

pub mod cached_identity;
pub mod control;
pub mod feature_store;
pub mod feature_vector;
pub mod model_handle;
pub mod request;
pub mod router;
pub mod traits;

pub use cached_identity::{CachedIdentityEngine, CachedSpeaker};
pub use control::{language_tag, tag_text, Emotion, FineControl, Pitch, LANGUAGE_TAGS};
pub use feature_store::FeatureStore;
pub use feature_vector::FeatureVectorEngine;
pub use model_handle::{ModelHandle, ModelLoader, ModelSpec, ModelState};
pub use request::{SynthesisMode, SynthesisOptions, SynthesisRequest};
pub use router::{EngineSet, RoutedSynthesis, SynthesisRouter};
pub use traits::{
    CachedIdentityModel, EngineKind, Enrollment, FeatureVectorModel, InstructVoice,
    SynthesisOutput, VoiceEngine,
};

use crate::core::error::TtsError;

/// Classify an error raised by an inference capability during a call.
///
/// Errors that already carry a routing meaning pass through; anything else
/// is a runtime failure of `engine`.
pub(crate) fn runtime_error(engine: EngineKind, err: TtsError) -> TtsError {
    match err {
        TtsError::Transient { .. }
        | TtsError::EmptyResult { .. }
        | TtsError::NotFound { .. }
        | TtsError::Unavailable { .. } => err,
        other => TtsError::Transient {
            engine: engine.to_string(),
            message: other.to_string(),
        },
    }
}
