//! Cached-identity engine adapter
//!
//! Enrollment registers the voice inside the model runtime under the
//! speaker id and mirrors it in an ephemeral [`DashMap`]. The registry
//! record stays the source of truth; this cache is derived state and is
//! empty again after a restart.
//!
//! Four modes are served:
//! - zero-shot: reference audio plus prompt text
//! - cross-lingual: language-tagged text plus reference audio
//! - instruction: free-form instruction plus cached identity or reference audio
//! - fine-control: compiled into an instruction sentence, then run as instruction

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::audio::{concat_chunks, output_file_name, AudioOutput};
use crate::config::ServiceConfig;
use crate::core::error::{Result, TtsError};
use crate::speaker::{SpeakerFeature, VoicePayload};
use crate::CREATED_TIME_FORMAT;
use super::control::{ensure_end_marker, tag_text, LANGUAGE_TAGS};
use super::model_handle::{ModelHandle, ModelLoader, ModelSpec, ModelState};
use super::request::{SynthesisMode, SynthesisRequest};
use super::traits::{
    CachedIdentityModel, EngineKind, Enrollment, InstructVoice, SynthesisOutput, VoiceEngine,
};
use super::runtime_error;

const EXTRACTION_METHOD: &str = "cached_identity_cache";

/// Entry in the engine's runtime speaker cache
#[derive(Debug, Clone, Serialize)]
pub struct CachedSpeaker {
    pub speaker_id: String,
    pub reference_audio: PathBuf,
    pub description: String,
    pub created_at: String,
}

/// File-name label for a language code. Codes with nothing printable get
/// the label of the fallback tag.
fn language_label(code: &str) -> String {
    let label: String = code
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if label.is_empty() {
        LANGUAGE_TAGS[0].0.to_string()
    } else {
        label
    }
}

pub struct CachedIdentityEngine {
    model: ModelHandle<dyn CachedIdentityModel>,
    cache: DashMap<String, CachedSpeaker>,
    output_dir: PathBuf,
    model_version: String,
    default_prompt: String,
}

impl CachedIdentityEngine {
    pub fn new(config: &ServiceConfig, loader: ModelLoader<dyn CachedIdentityModel>) -> Self {
        Self {
            model: ModelHandle::new(
                ModelSpec::from_config(EngineKind::CachedIdentity, &config.cached_identity),
                loader,
            ),
            cache: DashMap::new(),
            output_dir: config.output_dir.clone(),
            model_version: config.cached_identity.model_version.clone(),
            default_prompt: config.default_prompt.clone(),
        }
    }

    pub fn model(&self) -> &ModelHandle<dyn CachedIdentityModel> {
        &self.model
    }

    /// Register a voice in the model runtime under `speaker_id`
    pub fn cache_speaker(
        &self,
        speaker_id: &str,
        reference_audio: &Path,
        description: &str,
    ) -> Result<CachedSpeaker> {
        if !reference_audio.exists() {
            return Err(TtsError::missing_audio(reference_audio));
        }
        let model = self.model.acquire()?;

        let prompt = if description.trim().is_empty() {
            self.default_prompt.as_str()
        } else {
            description
        };
        model
            .add_zero_shot_speaker(&ensure_end_marker(prompt), reference_audio, speaker_id)
            .map_err(|e| runtime_error(EngineKind::CachedIdentity, e))?;

        let entry = CachedSpeaker {
            speaker_id: speaker_id.to_string(),
            reference_audio: reference_audio.to_path_buf(),
            description: description.to_string(),
            created_at: chrono::Local::now().format(CREATED_TIME_FORMAT).to_string(),
        };
        self.cache.insert(speaker_id.to_string(), entry.clone());
        info!("Cached speaker '{}' in engine runtime", speaker_id);
        Ok(entry)
    }

    /// Whether the runtime cache currently holds `speaker_id`
    pub fn is_cached(&self, speaker_id: &str) -> bool {
        self.cache.contains_key(speaker_id)
    }

    /// Remove a speaker from the runtime cache
    pub fn remove_cached_speaker(&self, speaker_id: &str) -> bool {
        let removed = self.cache.remove(speaker_id).is_some();
        if removed {
            debug!("Removed '{}' from runtime cache", speaker_id);
        }
        removed
    }

    /// Snapshot of the runtime cache, sorted by id
    pub fn cached_speakers(&self) -> Vec<CachedSpeaker> {
        let mut speakers: Vec<CachedSpeaker> =
            self.cache.iter().map(|e| e.value().clone()).collect();
        speakers.sort_by(|a, b| a.speaker_id.cmp(&b.speaker_id));
        speakers
    }

    /// Clone from a reference recording
    pub fn zero_shot(
        &self,
        text: &str,
        reference_audio: &Path,
        prompt_text: Option<&str>,
        speed: f32,
    ) -> Result<PathBuf> {
        let reference = self.require_reference(reference_audio)?;
        let model = self.model.acquire()?;
        let prompt = ensure_end_marker(prompt_text.unwrap_or(&self.default_prompt));

        let chunks = model
            .inference_zero_shot(text, &prompt, reference, speed)
            .map_err(|e| runtime_error(EngineKind::CachedIdentity, e))?;
        self.write_chunks(&model, chunks, SynthesisMode::ZeroShot, None)
    }

    /// Clone with a language tag prefixed to `text`
    pub fn cross_lingual(
        &self,
        text: &str,
        reference_audio: &Path,
        language: &str,
        speed: f32,
    ) -> Result<PathBuf> {
        let reference = self.require_reference(reference_audio)?;
        let model = self.model.acquire()?;
        let tagged = tag_text(language, text);
        debug!("Cross-lingual text: {}", tagged);

        let chunks = model
            .inference_cross_lingual(&tagged, reference, speed)
            .map_err(|e| runtime_error(EngineKind::CachedIdentity, e))?;
        let label = language_label(language);
        self.write_chunks(&model, chunks, SynthesisMode::CrossLingual, Some(&label))
    }

    /// Instruction-steered synthesis. A cached identity wins over the
    /// reference recording when both resolve.
    pub fn instruct(
        &self,
        text: &str,
        instruction: &str,
        cached_speaker_id: Option<&str>,
        reference_audio: Option<&Path>,
        speed: f32,
        mode: SynthesisMode,
    ) -> Result<PathBuf> {
        let voice = match cached_speaker_id.filter(|id| self.is_cached(id)) {
            Some(id) => InstructVoice::Cached(id),
            None => match reference_audio {
                Some(path) if path.exists() => InstructVoice::Reference(path),
                Some(path) => return Err(TtsError::missing_audio(path)),
                None => {
                    return Err(TtsError::NotFound {
                        what: "Voice for instruction synthesis".to_string(),
                        target: cached_speaker_id.unwrap_or("<none>").to_string(),
                    })
                }
            },
        };
        let model = self.model.acquire()?;
        let instruction = ensure_end_marker(instruction);

        let chunks = model
            .inference_instruct(text, &instruction, voice, speed)
            .map_err(|e| runtime_error(EngineKind::CachedIdentity, e))?;
        self.write_chunks(&model, chunks, mode, None)
    }

    fn require_reference<'a>(&self, reference_audio: &'a Path) -> Result<&'a Path> {
        if reference_audio.exists() {
            Ok(reference_audio)
        } else {
            Err(TtsError::missing_audio(reference_audio))
        }
    }

    fn write_chunks(
        &self,
        model: &Arc<dyn CachedIdentityModel>,
        chunks: Vec<Vec<f32>>,
        mode: SynthesisMode,
        language: Option<&str>,
    ) -> Result<PathBuf> {
        if chunks.iter().all(Vec::is_empty) {
            return Err(TtsError::EmptyResult {
                engine: EngineKind::CachedIdentity.to_string(),
                mode: mode.to_string(),
            });
        }
        let count = chunks.len();
        let samples = concat_chunks(chunks)?;

        let path = self.output_dir.join(output_file_name(
            EngineKind::CachedIdentity.as_str(),
            mode.as_str(),
            language,
        ));
        AudioOutput::save(&samples, model.sample_rate(), &path)?;
        debug!("Wrote {} chunk(s), {} samples to {:?}", count, samples.len(), path);
        Ok(path)
    }
}

impl VoiceEngine for CachedIdentityEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::CachedIdentity
    }

    fn is_available(&self) -> bool {
        self.model.is_available()
    }

    fn model_state(&self) -> ModelState {
        self.model.state()
    }

    fn prepare(&self) -> Result<()> {
        self.model.acquire().map(|_| ())
    }

    fn extract_feature(
        &self,
        speaker_id: &str,
        reference_audio: &Path,
        description: Option<&str>,
    ) -> Result<Enrollment> {
        let description = description
            .map(str::to_string)
            .unwrap_or_else(|| format!("Speaker {}", speaker_id));
        self.cache_speaker(speaker_id, reference_audio, &description)?;

        let metadata = BTreeMap::from([
            ("extraction_method".to_string(), EXTRACTION_METHOD.to_string()),
            ("model_version".to_string(), self.model_version.clone()),
            ("description".to_string(), description),
        ]);

        Ok(Enrollment {
            payload: VoicePayload::CachedIdentity(speaker_id.to_string()),
            metadata,
        })
    }

    fn synthesize(
        &self,
        text: &str,
        speaker: &SpeakerFeature,
        request: &SynthesisRequest,
    ) -> Result<SynthesisOutput> {
        let reference = speaker.reference_audio_path.as_path();
        let mode = request.mode();

        let path = match request {
            SynthesisRequest::ZeroShot { prompt_text, speed } => {
                self.zero_shot(text, reference, prompt_text.as_deref(), *speed)?
            }
            SynthesisRequest::CrossLingual { language, speed } => {
                self.cross_lingual(text, reference, language, *speed)?
            }
            SynthesisRequest::Instruction { instruction, speed } => self.instruct(
                text,
                instruction,
                speaker.cached_identity(),
                Some(reference),
                *speed,
                mode,
            )?,
            // Speed is part of the compiled sentence, so the primitive runs at 1.0.
            SynthesisRequest::FineControl(control) => self.instruct(
                text,
                &control.compile(),
                speaker.cached_identity(),
                Some(reference),
                1.0,
                mode,
            )?,
        };

        Ok(SynthesisOutput { path, mode })
    }

    fn release(&self, speaker: &SpeakerFeature) -> bool {
        match speaker.cached_identity() {
            Some(id) => self.remove_cached_speaker(id),
            None => false,
        }
    }
}
