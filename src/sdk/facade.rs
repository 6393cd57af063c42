//! Service facade - the single entry point for callers
//!
//! `VoiceService` is constructed once by the owning process (usually via
//! [`VoiceServiceBuilder`](super::VoiceServiceBuilder)) and shared by
//! reference or `Arc`. Every public operation returns a boolean, an
//! `Option` or a plain value: internal errors are logged here and never
//! cross this boundary.
//!
//! # Example
//!
//! ```rust,ignore
//! use unified_voice::sdk::VoiceServiceBuilder;
//! use unified_voice::engine::{EngineKind, SynthesisOptions};
//!
//! let service = VoiceServiceBuilder::new()
//!     .data_dir("/var/lib/voice")
//!     .feature_vector_loader(load_converter)
//!     .cached_identity_loader(load_cached_model)
//!     .build()?;
//!
//! service.extract_and_save_speaker_feature("bob", "bob.wav", Some(EngineKind::CachedIdentity));
//! let wav = service.generate_speech(
//!     "hello there",
//!     "bob",
//!     None,
//!     &SynthesisOptions::new().with_emotion("happy"),
//! );
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::engine::{
    EngineKind, EngineSet, RoutedSynthesis, SynthesisOptions, SynthesisRequest, SynthesisRouter,
};
use crate::speaker::{SpeakerRegistry, SpeakerSummary};
use super::recommend::recommend;
use super::types::{EngineRecommendation, EngineStatus, ServiceStats, ServiceStatus};

/// Voice-cloning service facade
pub struct VoiceService {
    config: ServiceConfig,
    engines: EngineSet,
    registry: Arc<SpeakerRegistry>,
    router: SynthesisRouter,
    stats: RwLock<ServiceStats>,
}

impl VoiceService {
    /// Assemble a service from already-built parts
    pub fn new(config: ServiceConfig, engines: EngineSet, registry: Arc<SpeakerRegistry>) -> Self {
        let router = SynthesisRouter::new(engines.clone(), Arc::clone(&registry));
        info!(
            "Voice service ready: {} speaker(s), registry {:?}",
            registry.len(),
            registry.path()
        );
        Self {
            config,
            engines,
            registry,
            router,
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Get service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Underlying registry (read-only use)
    pub fn registry(&self) -> &SpeakerRegistry {
        &self.registry
    }

    pub fn engines(&self) -> &EngineSet {
        &self.engines
    }

    /// Get service statistics
    pub fn stats(&self) -> ServiceStats {
        self.stats
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn record<F: FnOnce(&mut ServiceStats)>(&self, update: F) {
        let mut stats = self
            .stats
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut stats);
    }

    /// Synthesize `text` for a registered speaker and return the WAV path
    pub fn generate_speech(
        &self,
        text: &str,
        speaker_id: &str,
        engine: Option<EngineKind>,
        options: &SynthesisOptions,
    ) -> Option<PathBuf> {
        self.generate_speech_detailed(text, speaker_id, engine, options)
            .map(|routed| routed.path)
    }

    /// Like [`generate_speech`](Self::generate_speech) but reports which
    /// engine and mode served the call
    pub fn generate_speech_detailed(
        &self,
        text: &str,
        speaker_id: &str,
        engine: Option<EngineKind>,
        options: &SynthesisOptions,
    ) -> Option<RoutedSynthesis> {
        let request_id = Uuid::new_v4();
        let span = info_span!("generate_speech", %request_id, speaker = %speaker_id);
        let _enter = span.enter();

        let request = SynthesisRequest::from_options(options);
        let start = Instant::now();
        let result = self.router.route(text, speaker_id, engine, &request);
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(routed) => {
                self.record(|s| {
                    s.total_synthesis += 1;
                    s.successful_synthesis += 1;
                    s.total_processing_secs += elapsed;
                    if routed.fell_back {
                        s.fallbacks += 1;
                    }
                });
                info!(
                    "Generated {:?} with {} ({}) in {:.2}s",
                    routed.path, routed.engine, routed.mode, elapsed
                );
                Some(routed)
            }
            Err(e) => {
                self.record(|s| {
                    s.total_synthesis += 1;
                    s.failed_synthesis += 1;
                    s.total_processing_secs += elapsed;
                });
                warn!("Speech generation failed ({}): {}", e.category(), e);
                None
            }
        }
    }

    /// Enroll a speaker from reference audio. Defaults to the
    /// feature-vector engine.
    pub fn extract_and_save_speaker_feature(
        &self,
        speaker_id: &str,
        reference_audio: impl AsRef<Path>,
        engine: Option<EngineKind>,
    ) -> bool {
        self.register_speaker(speaker_id, reference_audio, engine, None)
    }

    /// Enroll a speaker with a free-form description stored in its metadata
    pub fn register_speaker(
        &self,
        speaker_id: &str,
        reference_audio: impl AsRef<Path>,
        engine: Option<EngineKind>,
        description: Option<&str>,
    ) -> bool {
        let reference_audio = reference_audio.as_ref();
        match self.registry.extract_and_register(
            &self.engines,
            speaker_id,
            reference_audio,
            engine.unwrap_or_default(),
            description,
        ) {
            Ok(_) => {
                self.record(|s| s.registrations += 1);
                true
            }
            Err(e) => {
                warn!("Feature extraction for '{}' failed: {}", speaker_id, e);
                false
            }
        }
    }

    /// Registered speaker ids, sorted
    pub fn list_available_speakers(&self) -> Vec<String> {
        self.registry.ids()
    }

    /// Full speaker listing, sorted by id
    pub fn get_speaker_details(&self) -> Vec<SpeakerSummary> {
        self.registry.list()
    }

    /// One speaker's record
    pub fn get_speaker(&self, speaker_id: &str) -> Option<SpeakerSummary> {
        self.registry.get(speaker_id).map(|r| r.summary())
    }

    /// Remove a speaker. False when the id is unknown.
    pub fn delete_speaker(&self, speaker_id: &str) -> bool {
        match self.registry.delete(&self.engines, speaker_id) {
            Ok(true) => {
                self.record(|s| s.deletions += 1);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("Delete of '{}' failed: {}", speaker_id, e);
                false
            }
        }
    }

    /// Engines that can currently be selected, default first
    pub fn get_available_engines(&self) -> Vec<EngineKind> {
        self.engines.available()
    }

    /// Advisory engine choice; never affects routing
    pub fn get_engine_recommendations(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> EngineRecommendation {
        recommend(
            text,
            options,
            self.engines.is_available(EngineKind::CachedIdentity),
            self.config.long_text_threshold,
        )
    }

    /// Operational snapshot. Reads only; never mutates the registry.
    pub fn get_service_status(&self) -> ServiceStatus {
        let counts = self.registry.count_by_engine();
        let engines: Vec<EngineStatus> = EngineKind::ALL
            .into_iter()
            .map(|kind| {
                let engine = self.engines.get(kind);
                EngineStatus {
                    engine: kind,
                    available: engine.is_available(),
                    model_state: engine.model_state(),
                    speakers: counts.get(&kind).copied().unwrap_or(0),
                }
            })
            .collect();

        ServiceStatus {
            feature_vector_available: engines[0].available,
            cached_identity_available: engines[1].available,
            total_speakers: self.registry.len(),
            available_engines: engines
                .iter()
                .filter(|e| e.available)
                .map(|e| e.engine)
                .collect(),
            speakers_by_engine: counts,
            engines,
            stats: self.stats(),
        }
    }

    /// Emotion-tagged synthesis
    pub fn generate_speech_with_emotion(
        &self,
        text: &str,
        speaker_id: &str,
        emotion: &str,
        engine: Option<EngineKind>,
    ) -> Option<PathBuf> {
        let options = SynthesisOptions::new().with_emotion(emotion);
        self.generate_speech(text, speaker_id, engine, &options)
    }

    /// Instruction-steered synthesis
    pub fn generate_speech_with_instruction(
        &self,
        text: &str,
        speaker_id: &str,
        instruction: &str,
        engine: Option<EngineKind>,
    ) -> Option<PathBuf> {
        let options = SynthesisOptions::new().with_instruction(instruction);
        self.generate_speech(text, speaker_id, engine, &options)
    }

    /// Cross-lingual synthesis on the cached-identity engine
    pub fn generate_multilingual_speech(
        &self,
        text: &str,
        speaker_id: &str,
        target_language: &str,
    ) -> Option<PathBuf> {
        let options = SynthesisOptions::new().with_target_language(target_language);
        self.generate_speech(
            text,
            speaker_id,
            Some(EngineKind::CachedIdentity),
            &options,
        )
    }

    /// One `generate_speech` per text, results in input order
    pub fn batch_generate_speech<S: AsRef<str>>(
        &self,
        texts: &[S],
        speaker_id: &str,
        engine: Option<EngineKind>,
        options: &SynthesisOptions,
    ) -> Vec<Option<PathBuf>> {
        texts
            .iter()
            .map(|text| self.generate_speech(text.as_ref(), speaker_id, engine, options))
            .collect()
    }
}
