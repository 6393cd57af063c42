//! Speaker feature records

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::EngineKind;
use crate::CREATED_TIME_FORMAT;

/// How a registered voice is referenced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicePayload {
    /// Stored embedding file (feature-vector engine)
    FeatureFile(PathBuf),
    /// Key into the cached-identity engine's runtime cache
    CachedIdentity(String),
}

/// One registered speaker
///
/// `speaker_id` is the registry key and is not repeated inside the
/// persisted record; the registry fills it in on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerFeature {
    #[serde(skip)]
    pub speaker_id: String,
    pub engine: EngineKind,
    pub voice_payload: VoicePayload,
    pub reference_audio_path: PathBuf,
    pub created_time: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl SpeakerFeature {
    /// Build a record stamped with the current local time
    pub fn new(
        speaker_id: impl Into<String>,
        engine: EngineKind,
        voice_payload: VoicePayload,
        reference_audio_path: impl Into<PathBuf>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            engine,
            voice_payload,
            reference_audio_path: reference_audio_path.into(),
            created_time: chrono::Local::now().format(CREATED_TIME_FORMAT).to_string(),
            metadata,
        }
    }

    /// Cached identity key, if this voice has one
    pub fn cached_identity(&self) -> Option<&str> {
        match &self.voice_payload {
            VoicePayload::CachedIdentity(id) => Some(id),
            VoicePayload::FeatureFile(_) => None,
        }
    }

    /// Embedding file, if this voice has one
    pub fn feature_file(&self) -> Option<&PathBuf> {
        match &self.voice_payload {
            VoicePayload::FeatureFile(path) => Some(path),
            VoicePayload::CachedIdentity(_) => None,
        }
    }

    pub fn summary(&self) -> SpeakerSummary {
        SpeakerSummary {
            id: self.speaker_id.clone(),
            engine: self.engine,
            reference_audio: self.reference_audio_path.clone(),
            created_time: self.created_time.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Read-only projection returned by listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSummary {
    pub id: String,
    pub engine: EngineKind,
    pub reference_audio: PathBuf,
    pub created_time: String,
    pub metadata: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let mut record = SpeakerFeature::new(
            "amy",
            EngineKind::CachedIdentity,
            VoicePayload::CachedIdentity("amy".to_string()),
            "/voices/amy.wav",
            BTreeMap::new(),
        );
        record.created_time = "2026-01-02 03:04:05".to_string();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["engine"], "cached_identity");
        assert_eq!(value["voice_payload"]["cached_identity"], "amy");
        assert_eq!(value["reference_audio_path"], "/voices/amy.wav");
        assert!(value.get("speaker_id").is_none());
    }

    #[test]
    fn test_created_time_format() {
        let record = SpeakerFeature::new(
            "bob",
            EngineKind::FeatureVector,
            VoicePayload::FeatureFile(PathBuf::from("bob_se.json")),
            "bob.wav",
            BTreeMap::new(),
        );
        assert!(
            chrono::NaiveDateTime::parse_from_str(&record.created_time, CREATED_TIME_FORMAT)
                .is_ok()
        );
        assert_eq!(record.feature_file(), Some(&PathBuf::from("bob_se.json")));
        assert_eq!(record.cached_identity(), None);
    }

    #[test]
    fn test_summary_projection() {
        let record = SpeakerFeature::new(
            "bob",
            EngineKind::FeatureVector,
            VoicePayload::FeatureFile(PathBuf::from("bob_se.json")),
            "bob.wav",
            BTreeMap::from([("model_version".to_string(), "v2".to_string())]),
        );
        let summary = record.summary();
        assert_eq!(summary.id, "bob");
        assert_eq!(summary.reference_audio, PathBuf::from("bob.wav"));
        assert_eq!(summary.metadata["model_version"], "v2");
    }
}
