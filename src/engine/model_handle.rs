//! Lazy, retryable acquisition of heavy model state
//!
//! A [`ModelHandle`] starts unloaded and loads on the first `acquire()`.
//! The fast path is a lock-free read of a `OnceCell`; the slow path takes
//! a mutex and re-checks before loading, so N concurrent callers trigger at
//! most one load. A failed load leaves the cell empty and the next call
//! tries again.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineModelConfig;
use crate::core::error::{Result, TtsError};
use super::traits::EngineKind;

/// Loader invoked with the model directory once installation checks pass
pub type ModelLoader<M> = Arc<dyn Fn(&Path) -> Result<Arc<M>> + Send + Sync>;

/// Lifecycle state of a model handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Unloaded => write!(f, "unloaded"),
            ModelState::Loading => write!(f, "loading"),
            ModelState::Ready => write!(f, "ready"),
        }
    }
}

/// Where a model lives and what must be present before loading it
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub engine: EngineKind,
    pub model_dir: PathBuf,
    pub required_files: Vec<String>,
}

impl ModelSpec {
    pub fn from_config(engine: EngineKind, config: &EngineModelConfig) -> Self {
        Self {
            engine,
            model_dir: config.model_dir.clone(),
            required_files: config.required_files.clone(),
        }
    }
}

/// Resets the loading flag even if the loader panics
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Lazily loaded model owned by exactly one engine adapter
pub struct ModelHandle<M: ?Sized> {
    spec: ModelSpec,
    loader: ModelLoader<M>,
    model: OnceCell<Arc<M>>,
    load_lock: Mutex<()>,
    loading: AtomicBool,
    load_attempts: AtomicU64,
}

impl<M: ?Sized + Send + Sync> ModelHandle<M> {
    /// Create an unloaded handle
    pub fn new(spec: ModelSpec, loader: ModelLoader<M>) -> Self {
        Self {
            spec,
            loader,
            model: OnceCell::new(),
            load_lock: Mutex::new(()),
            loading: AtomicBool::new(false),
            load_attempts: AtomicU64::new(0),
        }
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Current lifecycle state
    pub fn state(&self) -> ModelState {
        if self.model.get().is_some() {
            ModelState::Ready
        } else if self.loading.load(Ordering::SeqCst) {
            ModelState::Loading
        } else {
            ModelState::Unloaded
        }
    }

    /// Number of times the loader has been invoked
    pub fn load_attempts(&self) -> u64 {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// Loaded model, if any, without triggering a load
    pub fn get(&self) -> Option<Arc<M>> {
        self.model.get().cloned()
    }

    /// Installation check: model directory and every required file exist
    pub fn check_installed(&self) -> Result<()> {
        if !self.spec.model_dir.is_dir() {
            return Err(TtsError::Unavailable {
                engine: self.spec.engine.to_string(),
                reason: format!("model directory {:?} does not exist", self.spec.model_dir),
            });
        }

        let missing: Vec<&str> = self
            .spec
            .required_files
            .iter()
            .filter(|f| !self.spec.model_dir.join(f).exists())
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TtsError::Unavailable {
                engine: self.spec.engine.to_string(),
                reason: format!("missing model files: {}", missing.join(", ")),
            })
        }
    }

    /// A loaded model is always available; otherwise the installation decides
    pub fn is_available(&self) -> bool {
        self.model.get().is_some() || self.check_installed().is_ok()
    }

    /// Return the ready model, loading it on first use
    pub fn acquire(&self) -> Result<Arc<M>> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        // The mutex guards no data, so a poisoned lock is still usable.
        let _guard = self
            .load_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(model) = self.model.get() {
            debug!("{} model loaded by a concurrent caller", self.spec.engine);
            return Ok(Arc::clone(model));
        }

        self.check_installed()?;

        let _flag = LoadingFlag::raise(&self.loading);
        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Loading {} model from {:?} (attempt {})",
            self.spec.engine, self.spec.model_dir, attempt
        );
        let start = Instant::now();

        match (self.loader)(self.spec.model_dir.as_path()) {
            Ok(model) => {
                let model = Arc::clone(self.model.get_or_init(|| model));
                info!(
                    "{} model ready in {:.2}s",
                    self.spec.engine,
                    start.elapsed().as_secs_f64()
                );
                Ok(model)
            }
            Err(err) => {
                warn!("{} model load failed: {}", self.spec.engine, err);
                Err(match err {
                    TtsError::Unavailable { .. } | TtsError::LoadFailure { .. } => err,
                    other => TtsError::LoadFailure {
                        engine: self.spec.engine.to_string(),
                        message: other.to_string(),
                    },
                })
            }
        }
    }
}
