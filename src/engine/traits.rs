//! Core traits for voice engine abstraction
//!
//! Two layers meet here. [`VoiceEngine`] is the adapter contract the router
//! and registry talk to. [`FeatureVectorModel`] and [`CachedIdentityModel`]
//! are the inference capabilities an adapter drives once its model handle is
//! ready; they are supplied from outside the crate.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TtsError};
use crate::speaker::{SpeakerFeature, VoicePayload};
use super::model_handle::ModelState;
use super::request::{SynthesisMode, SynthesisRequest};

/// Closed set of engines the service can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Voice is a numeric embedding derived once from reference audio
    FeatureVector,
    /// Voice is an opaque id cached inside the engine runtime
    CachedIdentity,
}

impl EngineKind {
    /// Every engine, default engine first
    pub const ALL: [EngineKind; 2] = [EngineKind::FeatureVector, EngineKind::CachedIdentity];

    /// Stable identifier used in the registry document and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::FeatureVector => "feature_vector",
            EngineKind::CachedIdentity => "cached_identity",
        }
    }
}

impl Default for EngineKind {
    fn default() -> Self {
        EngineKind::FeatureVector
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "feature_vector" => Ok(EngineKind::FeatureVector),
            "cached_identity" => Ok(EngineKind::CachedIdentity),
            other => Err(TtsError::Validation {
                message: format!("unknown engine '{}'", other),
                field: Some("engine".to_string()),
            }),
        }
    }
}

/// What an engine hands back after a successful enrollment
#[derive(Debug, Clone)]
pub struct Enrollment {
    /// How the voice is referenced later
    pub payload: VoicePayload,
    /// Extraction method, model version and similar
    pub metadata: BTreeMap<String, String>,
}

/// Result of one engine synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutput {
    /// Written WAV file
    pub path: PathBuf,
    /// Mode the engine actually ran
    pub mode: SynthesisMode,
}

/// Adapter contract shared by both engines
pub trait VoiceEngine: Send + Sync {
    /// Which engine this is
    fn kind(&self) -> EngineKind;

    /// Whether the engine can be selected right now
    fn is_available(&self) -> bool;

    /// Lifecycle state of the underlying model
    fn model_state(&self) -> ModelState;

    /// Load whatever the engine needs before it can enroll. Called outside
    /// the registry mutation lock.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Enroll a voice from reference audio
    fn extract_feature(
        &self,
        speaker_id: &str,
        reference_audio: &Path,
        description: Option<&str>,
    ) -> Result<Enrollment>;

    /// Render `text` in the voice described by `speaker`
    fn synthesize(
        &self,
        text: &str,
        speaker: &SpeakerFeature,
        request: &SynthesisRequest,
    ) -> Result<SynthesisOutput>;

    /// Drop any engine-side state held for the speaker. Returns whether
    /// anything was released.
    fn release(&self, speaker: &SpeakerFeature) -> bool;
}

/// Inference capability behind the feature-vector engine
pub trait FeatureVectorModel: Send + Sync {
    /// Output sample rate
    fn sample_rate(&self) -> u32;

    /// Derive a speaker embedding from reference audio
    fn extract_embedding(&self, reference_audio: &Path) -> Result<Vec<f32>>;

    /// Render text in the voice of `embedding`
    fn synthesize(&self, text: &str, embedding: &[f32], speed: f32) -> Result<Vec<f32>>;
}

/// How the instruction primitive identifies the voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructVoice<'a> {
    /// A speaker previously registered in the engine runtime
    Cached(&'a str),
    /// A reference recording
    Reference(&'a Path),
}

/// Inference capability behind the cached-identity engine
///
/// Each synthesis primitive yields zero or more audio chunks which the
/// engine concatenates along the time axis.
pub trait CachedIdentityModel: Send + Sync {
    /// Output sample rate
    fn sample_rate(&self) -> u32;

    /// Register `speaker_id` inside the model runtime
    fn add_zero_shot_speaker(&self, prompt_text: &str, prompt_wav: &Path, speaker_id: &str)
        -> Result<()>;

    /// Clone from a reference recording
    fn inference_zero_shot(
        &self,
        text: &str,
        prompt_text: &str,
        prompt_wav: &Path,
        speed: f32,
    ) -> Result<Vec<Vec<f32>>>;

    /// Clone with `text` already carrying a language tag
    fn inference_cross_lingual(
        &self,
        tagged_text: &str,
        prompt_wav: &Path,
        speed: f32,
    ) -> Result<Vec<Vec<f32>>>;

    /// Clone steered by a natural-language instruction
    fn inference_instruct(
        &self,
        text: &str,
        instruct_text: &str,
        voice: InstructVoice<'_>,
        speed: f32,
    ) -> Result<Vec<Vec<f32>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_strings() {
        assert_eq!(EngineKind::FeatureVector.to_string(), "feature_vector");
        assert_eq!(
            "cached-identity".parse::<EngineKind>().unwrap(),
            EngineKind::CachedIdentity
        );
        assert!("openvoice".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_engine_kind_serde() {
        let json = serde_json::to_string(&EngineKind::CachedIdentity).unwrap();
        assert_eq!(json, "\"cached_identity\"");
        let back: EngineKind = serde_json::from_str("\"feature_vector\"").unwrap();
        assert_eq!(back, EngineKind::FeatureVector);
    }

    #[test]
    fn test_default_is_feature_vector() {
        assert_eq!(EngineKind::default(), EngineKind::FeatureVector);
        assert_eq!(EngineKind::ALL[0], EngineKind::FeatureVector);
    }
}
