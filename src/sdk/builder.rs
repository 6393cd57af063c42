//! Service builder
//!
//! Provides fluent API for service initialization. Inference backends are
//! injected as model loaders; an engine without a loader reports itself
//! unavailable when first used.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ServiceConfig, ServiceConfigBuilder};
use crate::core::error::{Result, TtsError};
use crate::engine::{
    CachedIdentityEngine, CachedIdentityModel, EngineKind, EngineSet, FeatureVectorEngine,
    FeatureVectorModel, ModelLoader, VoiceEngine,
};
use crate::speaker::SpeakerRegistry;
use super::facade::VoiceService;

/// Loader used when no backend was supplied for an engine
fn unlinked<M: ?Sized + 'static>(engine: EngineKind) -> ModelLoader<M> {
    Arc::new(move |_: &Path| -> Result<Arc<M>> {
        Err(TtsError::Unavailable {
            engine: engine.to_string(),
            reason: "no inference backend linked".to_string(),
        })
    })
}

/// Builder for [`VoiceService`]
pub struct VoiceServiceBuilder {
    config: ServiceConfig,
    feature_vector_loader: Option<ModelLoader<dyn FeatureVectorModel>>,
    cached_identity_loader: Option<ModelLoader<dyn CachedIdentityModel>>,
    feature_vector_engine: Option<Arc<dyn VoiceEngine>>,
    cached_identity_engine: Option<Arc<dyn VoiceEngine>>,
}

impl VoiceServiceBuilder {
    /// Create new builder with default config
    pub fn new() -> Self {
        Self::from_config(ServiceConfig::default())
    }

    /// Create builder from config
    pub fn from_config(config: ServiceConfig) -> Self {
        Self {
            config,
            feature_vector_loader: None,
            cached_identity_loader: None,
            feature_vector_engine: None,
            cached_identity_engine: None,
        }
    }

    /// Replace the configuration
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Root every path under `dir`
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config = ServiceConfigBuilder::from_config(self.config)
            .data_dir(dir)
            .build();
        self
    }

    /// Backend for the feature-vector engine
    pub fn feature_vector_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Path) -> Result<Arc<dyn FeatureVectorModel>> + Send + Sync + 'static,
    {
        self.feature_vector_loader = Some(Arc::new(loader));
        self
    }

    /// Backend for the cached-identity engine
    pub fn cached_identity_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Path) -> Result<Arc<dyn CachedIdentityModel>> + Send + Sync + 'static,
    {
        self.cached_identity_loader = Some(Arc::new(loader));
        self
    }

    /// Use a custom feature-vector adapter instead of the built-in one
    pub fn feature_vector_engine(mut self, engine: Arc<dyn VoiceEngine>) -> Self {
        self.feature_vector_engine = Some(engine);
        self
    }

    /// Use a custom cached-identity adapter instead of the built-in one
    pub fn cached_identity_engine(mut self, engine: Arc<dyn VoiceEngine>) -> Self {
        self.cached_identity_engine = Some(engine);
        self
    }

    /// Build the service
    pub fn build(self) -> Result<VoiceService> {
        let config = self.config;
        config.ensure_dirs()?;

        let feature_vector = match self.feature_vector_engine {
            Some(engine) => engine,
            None => {
                let loader = self
                    .feature_vector_loader
                    .unwrap_or_else(|| unlinked(EngineKind::FeatureVector));
                Arc::new(FeatureVectorEngine::new(&config, loader)) as Arc<dyn VoiceEngine>
            }
        };

        let cached_identity = match self.cached_identity_engine {
            Some(engine) => engine,
            None => {
                let loader = self
                    .cached_identity_loader
                    .unwrap_or_else(|| unlinked(EngineKind::CachedIdentity));
                Arc::new(CachedIdentityEngine::new(&config, loader)) as Arc<dyn VoiceEngine>
            }
        };

        let registry = Arc::new(SpeakerRegistry::load(&config.registry_path));
        Ok(VoiceService::new(
            config,
            EngineSet::new(feature_vector, cached_identity),
            registry,
        ))
    }
}

impl Default for VoiceServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
