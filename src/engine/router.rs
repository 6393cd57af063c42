//! Engine and mode selection with runtime fallback
//!
//! Routing for one call:
//! 1. resolve the speaker record, unknown ids stop here
//! 2. an explicit engine wins over the record's binding
//! 3. an unavailable cached-identity engine is downgraded to feature-vector
//! 4. the engine runs the already-resolved [`SynthesisRequest`]
//! 5. a failure on any engine other than feature-vector is retried once on
//!    feature-vector with the same record

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::error::{Result, TtsError};
use crate::speaker::SpeakerRegistry;
use super::request::{SynthesisMode, SynthesisRequest};
use super::traits::{EngineKind, VoiceEngine};

/// The two engine adapters, addressable by kind
#[derive(Clone)]
pub struct EngineSet {
    pub feature_vector: Arc<dyn VoiceEngine>,
    pub cached_identity: Arc<dyn VoiceEngine>,
}

impl EngineSet {
    pub fn new(feature_vector: Arc<dyn VoiceEngine>, cached_identity: Arc<dyn VoiceEngine>) -> Self {
        Self {
            feature_vector,
            cached_identity,
        }
    }

    pub fn get(&self, kind: EngineKind) -> &Arc<dyn VoiceEngine> {
        match kind {
            EngineKind::FeatureVector => &self.feature_vector,
            EngineKind::CachedIdentity => &self.cached_identity,
        }
    }

    pub fn is_available(&self, kind: EngineKind) -> bool {
        self.get(kind).is_available()
    }

    /// Engine that will actually serve a request for `kind`
    pub fn resolve(&self, kind: EngineKind) -> EngineKind {
        match kind {
            EngineKind::CachedIdentity if !self.cached_identity.is_available() => {
                warn!("cached_identity engine unavailable, using feature_vector");
                EngineKind::FeatureVector
            }
            other => other,
        }
    }

    /// Selectable engines, default first
    pub fn available(&self) -> Vec<EngineKind> {
        EngineKind::ALL
            .into_iter()
            .filter(|kind| self.is_available(*kind))
            .collect()
    }
}

/// Outcome of a routed synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedSynthesis {
    pub path: PathBuf,
    /// Engine that produced the audio
    pub engine: EngineKind,
    pub mode: SynthesisMode,
    /// Whether the first engine failed and feature-vector served the call
    pub fell_back: bool,
}

pub struct SynthesisRouter {
    engines: EngineSet,
    registry: Arc<SpeakerRegistry>,
}

impl SynthesisRouter {
    pub fn new(engines: EngineSet, registry: Arc<SpeakerRegistry>) -> Self {
        Self { engines, registry }
    }

    pub fn engines(&self) -> &EngineSet {
        &self.engines
    }

    /// Select engine and mode for the call, run it, fall back on failure
    pub fn route(
        &self,
        text: &str,
        speaker_id: &str,
        requested_engine: Option<EngineKind>,
        request: &SynthesisRequest,
    ) -> Result<RoutedSynthesis> {
        if text.trim().is_empty() {
            return Err(TtsError::Validation {
                message: "text is empty".to_string(),
                field: Some("text".to_string()),
            });
        }

        let speaker = self
            .registry
            .get(speaker_id)
            .ok_or_else(|| TtsError::unknown_speaker(speaker_id))?;

        let target = self
            .engines
            .resolve(requested_engine.unwrap_or(speaker.engine));
        debug!(
            "Routing '{}' (bound to {}) to {} in {} mode",
            speaker_id,
            speaker.engine,
            target,
            match target {
                EngineKind::FeatureVector => SynthesisMode::Clone,
                EngineKind::CachedIdentity => request.mode(),
            }
        );

        let primary = self.engines.get(target).synthesize(text, &speaker, request);
        match primary {
            Ok(output) => Ok(RoutedSynthesis {
                path: output.path,
                engine: target,
                mode: output.mode,
                fell_back: false,
            }),
            Err(err) if target != EngineKind::FeatureVector && err.is_fallback_eligible() => {
                warn!(
                    "{} synthesis failed ({}): {}. Trying feature_vector...",
                    target,
                    err.category(),
                    err
                );
                let output = self
                    .engines
                    .feature_vector
                    .synthesize(text, &speaker, request)
                    .map_err(|fallback_err| {
                        error!(
                            "Fallback synthesis failed for '{}': {}",
                            speaker_id, fallback_err
                        );
                        fallback_err
                    })?;
                info!("feature_vector fallback served '{}'", speaker_id);
                Ok(RoutedSynthesis {
                    path: output.path,
                    engine: EngineKind::FeatureVector,
                    mode: output.mode,
                    fell_back: true,
                })
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Enrollment, ModelState, SynthesisOutput};
    use crate::speaker::{SpeakerFeature, VoicePayload};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Engine whose synthesis outcome is chosen by the test
    struct ScriptedEngine {
        kind: EngineKind,
        available: bool,
        failure: Mutex<Option<TtsError>>,
        calls: AtomicUsize,
    }

    impl ScriptedEngine {
        fn new(kind: EngineKind, available: bool) -> Arc<Self> {
            Arc::new(Self {
                kind,
                available,
                failure: Mutex::new(None),
                calls: AtomicUsize::new(0),
            })
        }

        fn fail_with(&self, err: TtsError) {
            *self.failure.lock().unwrap() = Some(err);
        }
    }

    impl VoiceEngine for ScriptedEngine {
        fn kind(&self) -> EngineKind {
            self.kind
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn model_state(&self) -> ModelState {
            ModelState::Ready
        }

        fn extract_feature(
            &self,
            speaker_id: &str,
            _reference_audio: &Path,
            _description: Option<&str>,
        ) -> Result<Enrollment> {
            let payload = match self.kind {
                EngineKind::FeatureVector => {
                    VoicePayload::FeatureFile(PathBuf::from(format!("{}_se.json", speaker_id)))
                }
                EngineKind::CachedIdentity => VoicePayload::CachedIdentity(speaker_id.to_string()),
            };
            Ok(Enrollment {
                payload,
                metadata: BTreeMap::new(),
            })
        }

        fn synthesize(
            &self,
            _text: &str,
            _speaker: &SpeakerFeature,
            request: &SynthesisRequest,
        ) -> Result<SynthesisOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.failure.lock().unwrap().clone() {
                return Err(err);
            }
            let mode = match self.kind {
                EngineKind::FeatureVector => SynthesisMode::Clone,
                EngineKind::CachedIdentity => request.mode(),
            };
            Ok(SynthesisOutput {
                path: PathBuf::from(format!("{}.wav", self.kind)),
                mode,
            })
        }

        fn release(&self, _speaker: &SpeakerFeature) -> bool {
            true
        }
    }

    struct Setup {
        _dir: tempfile::TempDir,
        fv: Arc<ScriptedEngine>,
        ci: Arc<ScriptedEngine>,
        router: SynthesisRouter,
    }

    fn setup(cached_available: bool, bound_to: EngineKind) -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("voice.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let fv = ScriptedEngine::new(EngineKind::FeatureVector, true);
        let ci = ScriptedEngine::new(EngineKind::CachedIdentity, cached_available);
        let engines = EngineSet::new(fv.clone(), ci.clone());

        let registry = Arc::new(SpeakerRegistry::load(dir.path().join("registry.json")));
        registry
            .extract_and_register(&engines, "amy", &audio, bound_to, None)
            .unwrap();

        Setup {
            _dir: dir,
            fv,
            ci,
            router: SynthesisRouter::new(engines, registry),
        }
    }

    fn transient() -> TtsError {
        TtsError::Transient {
            engine: "cached_identity".to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_routes_to_bound_engine() {
        let s = setup(true, EngineKind::CachedIdentity);
        let request = SynthesisRequest::CrossLingual {
            language: "en".to_string(),
            speed: 1.0,
        };
        let routed = s.router.route("hi", "amy", None, &request).unwrap();
        assert_eq!(routed.engine, EngineKind::CachedIdentity);
        assert_eq!(routed.mode, SynthesisMode::CrossLingual);
        assert!(!routed.fell_back);
        assert_eq!(s.fv.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_explicit_engine_overrides_binding() {
        let s = setup(true, EngineKind::CachedIdentity);
        let routed = s
            .router
            .route("hi", "amy", Some(EngineKind::FeatureVector), &SynthesisRequest::default())
            .unwrap();
        assert_eq!(routed.engine, EngineKind::FeatureVector);
        assert_eq!(routed.mode, SynthesisMode::Clone);
        assert_eq!(s.ci.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transient_and_empty_results_fall_back() {
        let s = setup(true, EngineKind::CachedIdentity);
        s.ci.fail_with(transient());
        let routed = s
            .router
            .route("hi", "amy", None, &SynthesisRequest::default())
            .unwrap();
        assert_eq!(routed.engine, EngineKind::FeatureVector);
        assert!(routed.fell_back);

        s.ci.fail_with(TtsError::EmptyResult {
            engine: "cached_identity".to_string(),
            mode: "zero_shot".to_string(),
        });
        let routed = s
            .router
            .route("hi", "amy", None, &SynthesisRequest::default())
            .unwrap();
        assert!(routed.fell_back);
        assert_eq!(s.fv.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_validation_error_is_not_retried() {
        let s = setup(true, EngineKind::CachedIdentity);
        s.ci.fail_with(TtsError::Validation {
            message: "bad speed".to_string(),
            field: Some("speed".to_string()),
        });
        let err = s
            .router
            .route("hi", "amy", None, &SynthesisRequest::default())
            .unwrap_err();
        assert!(matches!(err, TtsError::Validation { .. }));
        assert_eq!(s.fv.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_feature_vector_failure_is_final() {
        let s = setup(true, EngineKind::FeatureVector);
        s.fv.fail_with(transient());
        assert!(s
            .router
            .route("hi", "amy", None, &SynthesisRequest::default())
            .is_err());
        assert_eq!(s.fv.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unavailable_cached_engine_is_downgraded() {
        let s = setup(false, EngineKind::FeatureVector);
        let routed = s
            .router
            .route("hi", "amy", Some(EngineKind::CachedIdentity), &SynthesisRequest::default())
            .unwrap();
        assert_eq!(routed.engine, EngineKind::FeatureVector);
        assert!(!routed.fell_back);
        assert_eq!(s.ci.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rejects_empty_text_and_unknown_speaker() {
        let s = setup(true, EngineKind::FeatureVector);
        let request = SynthesisRequest::default();
        assert!(matches!(
            s.router.route("  ", "amy", None, &request),
            Err(TtsError::Validation { .. })
        ));
        assert!(matches!(
            s.router.route("hi", "zed", None, &request),
            Err(TtsError::NotFound { .. })
        ));
        assert_eq!(s.fv.calls.load(Ordering::SeqCst), 0);
    }
}
