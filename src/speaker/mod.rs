//! Speaker records and the persisted registry

mod feature;
mod registry;

pub use feature::{SpeakerFeature, SpeakerSummary, VoicePayload};
pub use registry::SpeakerRegistry;
