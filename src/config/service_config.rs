//! Configuration types for the voice service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::{Result, TtsError};
use crate::DEFAULT_PROMPT;

/// Directory name used under the platform data directory
const APP_DIR: &str = "unified-voice";

/// Model installation settings for one engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineModelConfig {
    /// Directory holding the engine's weights
    pub model_dir: PathBuf,
    /// Files (relative to `model_dir`) that must exist before loading
    pub required_files: Vec<String>,
    /// Version string written into speaker metadata
    pub model_version: String,
}

impl EngineModelConfig {
    /// Feature-vector engine defaults rooted at `data_dir`
    pub fn feature_vector(data_dir: &Path) -> Self {
        Self {
            model_dir: data_dir.join("models").join("feature_vector"),
            required_files: vec![
                "converter/config.json".to_string(),
                "converter/checkpoint.pth".to_string(),
            ],
            model_version: "feature-vector-v2".to_string(),
        }
    }

    /// Cached-identity engine defaults rooted at `data_dir`
    pub fn cached_identity(data_dir: &Path) -> Self {
        Self {
            model_dir: data_dir.join("models").join("cached_identity"),
            required_files: vec![
                "cosyvoice3.yaml".to_string(),
                "llm.pt".to_string(),
                "flow.pt".to_string(),
                "hift.pt".to_string(),
            ],
            model_version: "cached-identity-0.5b".to_string(),
        }
    }

    /// Required files missing from `model_dir`, in declaration order
    pub fn missing_files(&self) -> Vec<String> {
        self.required_files
            .iter()
            .filter(|f| !self.model_dir.join(f).exists())
            .cloned()
            .collect()
    }
}

/// Root configuration for the voice service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base directory for everything the service writes
    pub data_dir: PathBuf,
    /// Persisted speaker registry document
    pub registry_path: PathBuf,
    /// Where synthesized WAV files land
    pub output_dir: PathBuf,
    /// Where feature-vector embeddings are stored
    pub feature_dir: PathBuf,
    /// Feature-vector engine installation
    pub feature_vector: EngineModelConfig,
    /// Cached-identity engine installation
    pub cached_identity: EngineModelConfig,
    /// Texts longer than this (in characters) favor the cached-identity engine
    pub long_text_threshold: usize,
    /// Prompt text used when enrolling or cloning without one
    pub default_prompt: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(APP_DIR));
        Self::with_data_dir(data_dir)
    }
}

impl ServiceConfig {
    /// Layout with every path derived from `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            registry_path: data_dir.join("speaker_features.json"),
            output_dir: data_dir.join("outputs"),
            feature_dir: data_dir.join("features"),
            feature_vector: EngineModelConfig::feature_vector(&data_dir),
            cached_identity: EngineModelConfig::cached_identity(&data_dir),
            long_text_threshold: 200,
            default_prompt: DEFAULT_PROMPT.to_string(),
            data_dir,
        }
    }

    /// Create configuration builder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TtsError::Config {
            message: format!("Failed to read config file: {}", e),
            path: Some(path.to_path_buf()),
        })?;

        serde_yaml::from_str(&content).map_err(|e| TtsError::Config {
            message: format!("Failed to parse config YAML: {}", e),
            path: Some(path.to_path_buf()),
        })
    }

    /// Write configuration as YAML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content).map_err(|e| TtsError::Io {
            message: format!("Failed to write config file: {}", e),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create the output and feature directories
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.output_dir, &self.feature_dir] {
            std::fs::create_dir_all(dir).map_err(|e| TtsError::Io {
                message: format!("Failed to create directory: {}", e),
                path: Some(dir.clone()),
            })?;
        }
        Ok(())
    }
}

/// Builder for [`ServiceConfig`]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Create new builder with defaults
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Re-root every derived path under `dir`
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let threshold = self.config.long_text_threshold;
        let prompt = std::mem::take(&mut self.config.default_prompt);
        self.config = ServiceConfig::with_data_dir(dir);
        self.config.long_text_threshold = threshold;
        self.config.default_prompt = prompt;
        self
    }

    /// Set registry document path
    pub fn registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.registry_path = path.into();
        self
    }

    /// Set output directory
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_dir = path.into();
        self
    }

    /// Set feature directory
    pub fn feature_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.feature_dir = path.into();
        self
    }

    /// Set feature-vector model directory
    pub fn feature_vector_model_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.feature_vector.model_dir = path.into();
        self
    }

    /// Set cached-identity model directory
    pub fn cached_identity_model_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cached_identity.model_dir = path.into();
        self
    }

    /// Set long-text threshold
    pub fn long_text_threshold(mut self, chars: usize) -> Self {
        self.config.long_text_threshold = chars;
        self
    }

    /// Set default prompt
    pub fn default_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.default_prompt = prompt.into();
        self
    }

    /// Build configuration
    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
