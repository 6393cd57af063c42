//! Persisted speaker embeddings for the feature-vector engine
//!
//! Embeddings live in memory behind a `DashMap` and on disk as
//! `<feature_dir>/<speaker_id>_se.json`, so a restarted process can reload a
//! voice without touching the reference audio again.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{Result, TtsError};

/// On-disk embedding document
#[derive(Debug, Serialize, Deserialize)]
struct EmbeddingFile {
    speaker_id: String,
    dim: usize,
    embedding: Vec<f32>,
}

/// Embedding store keyed by speaker id
pub struct FeatureStore {
    dir: PathBuf,
    entries: DashMap<String, Arc<Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FeatureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File an embedding for `speaker_id` is written to.
    ///
    /// ASCII letters, digits and `-` are kept; every other byte becomes
    /// `_xx` (lowercase hex). Distinct ids therefore never share a file,
    /// and no id can leave the feature directory.
    pub fn path_for(&self, speaker_id: &str) -> PathBuf {
        let mut name = String::with_capacity(speaker_id.len() + 8);
        for byte in speaker_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("_{:02x}", byte));
            }
        }
        self.dir.join(format!("{}_se.json", name))
    }

    /// Write the embedding to disk and keep it in memory
    pub fn save(&self, speaker_id: &str, embedding: Vec<f32>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| TtsError::Io {
            message: format!("Failed to create feature directory: {}", e),
            path: Some(self.dir.clone()),
        })?;

        let path = self.path_for(speaker_id);
        let doc = EmbeddingFile {
            speaker_id: speaker_id.to_string(),
            dim: embedding.len(),
            embedding,
        };
        let content = serde_json::to_string(&doc)?;
        std::fs::write(&path, content).map_err(|e| TtsError::Io {
            message: format!("Failed to write embedding: {}", e),
            path: Some(path.clone()),
        })?;

        self.entries
            .insert(speaker_id.to_string(), Arc::new(doc.embedding));
        debug!("Stored {}-dim embedding for '{}' at {:?}", doc.dim, speaker_id, path);
        Ok(path)
    }

    /// Embedding for `speaker_id`, reading `path` when not yet in memory
    pub fn load(&self, speaker_id: &str, path: &Path) -> Result<Arc<Vec<f32>>> {
        if let Some(entry) = self.entries.get(speaker_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(entry.value()));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let content = std::fs::read_to_string(path).map_err(|_| TtsError::NotFound {
            what: "Feature file".to_string(),
            target: path.display().to_string(),
        })?;
        let doc: EmbeddingFile = serde_json::from_str(&content)?;
        if doc.embedding.len() != doc.dim {
            return Err(TtsError::Persistence {
                message: format!(
                    "embedding length {} does not match declared dim {}",
                    doc.embedding.len(),
                    doc.dim
                ),
                path: Some(path.to_path_buf()),
            });
        }

        let embedding = Arc::new(doc.embedding);
        self.entries
            .insert(speaker_id.to_string(), Arc::clone(&embedding));
        Ok(embedding)
    }

    /// Drop the in-memory entry and the file. Returns whether anything existed.
    pub fn remove(&self, speaker_id: &str, path: Option<&Path>) -> bool {
        let in_memory = self.entries.remove(speaker_id).is_some();
        let on_disk = match path {
            Some(path) if path.exists() => match std::fs::remove_file(path) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to remove embedding file {:?}: {}", path, e);
                    false
                }
            },
            _ => false,
        };
        in_memory || on_disk
    }

    pub fn contains(&self, speaker_id: &str) -> bool {
        self.entries.contains_key(speaker_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) of in-memory lookups
    pub fn hit_stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
