//! Feature-vector engine adapter
//!
//! A voice is an embedding computed once from reference audio and stored by
//! the [`FeatureStore`]. Synthesis has a single primitive, so every request
//! runs in [`SynthesisMode::Clone`]. This engine is the system default and
//! the fallback target, and it always reports itself selectable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::audio::{output_file_name, AudioOutput};
use crate::config::ServiceConfig;
use crate::core::error::{Result, TtsError};
use crate::speaker::{SpeakerFeature, VoicePayload};
use super::feature_store::FeatureStore;
use super::model_handle::{ModelHandle, ModelLoader, ModelSpec, ModelState};
use super::request::{SynthesisMode, SynthesisRequest};
use super::traits::{EngineKind, Enrollment, FeatureVectorModel, SynthesisOutput, VoiceEngine};
use super::runtime_error;

const EXTRACTION_METHOD: &str = "feature_vector_extractor";

pub struct FeatureVectorEngine {
    model: ModelHandle<dyn FeatureVectorModel>,
    store: FeatureStore,
    output_dir: PathBuf,
    model_version: String,
}

impl FeatureVectorEngine {
    pub fn new(config: &ServiceConfig, loader: ModelLoader<dyn FeatureVectorModel>) -> Self {
        Self {
            model: ModelHandle::new(
                ModelSpec::from_config(EngineKind::FeatureVector, &config.feature_vector),
                loader,
            ),
            store: FeatureStore::new(&config.feature_dir),
            output_dir: config.output_dir.clone(),
            model_version: config.feature_vector.model_version.clone(),
        }
    }

    pub fn model(&self) -> &ModelHandle<dyn FeatureVectorModel> {
        &self.model
    }

    pub fn feature_store(&self) -> &FeatureStore {
        &self.store
    }

    /// Embedding for a speaker record.
    ///
    /// Records owned by the other engine carry no embedding file; for those
    /// the embedding is derived from the reference audio and not persisted.
    fn embedding_for(
        &self,
        speaker: &SpeakerFeature,
        model: &Arc<dyn FeatureVectorModel>,
    ) -> Result<Arc<Vec<f32>>> {
        if let Some(path) = speaker.feature_file() {
            return self.store.load(&speaker.speaker_id, path);
        }

        let reference = &speaker.reference_audio_path;
        if !reference.exists() {
            return Err(TtsError::missing_audio(reference));
        }
        debug!(
            "Deriving transient embedding for '{}' from {:?}",
            speaker.speaker_id, reference
        );
        model
            .extract_embedding(reference)
            .map(Arc::new)
            .map_err(|e| runtime_error(EngineKind::FeatureVector, e))
    }
}

impl VoiceEngine for FeatureVectorEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::FeatureVector
    }

    fn is_available(&self) -> bool {
        true
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
        _description: Option<&str>,
    ) -> Result<Enrollment> {
        if !reference_audio.exists() {
            return Err(TtsError::missing_audio(reference_audio));
        }

        let model = self.model.acquire()?;
        let embedding = model
            .extract_embedding(reference_audio)
            .map_err(|e| runtime_error(EngineKind::FeatureVector, e))?;
        if embedding.is_empty() {
            return Err(TtsError::EmptyResult {
                engine: EngineKind::FeatureVector.to_string(),
                mode: "extract".to_string(),
            });
        }

        let dim = embedding.len();
        let path = self.store.save(speaker_id, embedding)?;
        info!("Extracted {}-dim embedding for '{}'", dim, speaker_id);

        let metadata = BTreeMap::from([
            ("extraction_method".to_string(), EXTRACTION_METHOD.to_string()),
            ("model_version".to_string(), self.model_version.clone()),
            ("embedding_dim".to_string(), dim.to_string()),
        ]);

        Ok(Enrollment {
            payload: VoicePayload::FeatureFile(path),
            metadata,
        })
    }

    fn synthesize(
        &self,
        text: &str,
        speaker: &SpeakerFeature,
        request: &SynthesisRequest,
    ) -> Result<SynthesisOutput> {
        let model = self.model.acquire()?;
        let embedding = self.embedding_for(speaker, &model)?;

        let samples = model
            .synthesize(text, &embedding, request.speed())
            .map_err(|e| runtime_error(EngineKind::FeatureVector, e))?;
        if samples.is_empty() {
            return Err(TtsError::EmptyResult {
                engine: EngineKind::FeatureVector.to_string(),
                mode: SynthesisMode::Clone.to_string(),
            });
        }

        let path = self.output_dir.join(output_file_name(
            EngineKind::FeatureVector.as_str(),
            SynthesisMode::Clone.as_str(),
            None,
        ));
        AudioOutput::save(&samples, model.sample_rate(), &path)?;

        Ok(SynthesisOutput {
            path,
            mode: SynthesisMode::Clone,
        })
    }

    fn release(&self, speaker: &SpeakerFeature) -> bool {
        self.store
            .remove(&speaker.speaker_id, speaker.feature_file().map(PathBuf::as_path))
    }
}
