//! Durable speaker registry
//!
//! One JSON document maps speaker id to [`SpeakerFeature`]. It is read once
//! at construction and rewritten wholesale after every mutation. Reads go
//! straight to the `DashMap` and never take the mutation lock, so listings
//! may observe a registry mid-mutation. Mutations are serialized by a single
//! lock held from extraction through the document rewrite, so the later of
//! two racing mutations for one id always determines the final record.
//! Engine models are loaded before that lock is taken.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::core::error::{Result, TtsError};
use crate::engine::{EngineKind, EngineSet};
use super::feature::{SpeakerFeature, SpeakerSummary};

pub struct SpeakerRegistry {
    path: PathBuf,
    records: DashMap<String, SpeakerFeature>,
    write_lock: Mutex<()>,
}

impl SpeakerRegistry {
    /// Load the registry at `path`. An absent or unreadable document yields
    /// an empty registry.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = DashMap::new();

        if path.exists() {
            match Self::read_document(&path) {
                Ok(document) => {
                    for (id, mut record) in document {
                        record.speaker_id = id.clone();
                        records.insert(id, record);
                    }
                    info!("Loaded {} speaker(s) from {:?}", records.len(), path);
                }
                Err(e) => warn!("Speaker registry unreadable, starting empty: {}", e),
            }
        } else {
            debug!("No speaker registry at {:?}, starting empty", path);
        }

        Self {
            path,
            records,
            write_lock: Mutex::new(()),
        }
    }

    fn read_document(path: &Path) -> Result<BTreeMap<String, SpeakerFeature>> {
        let content = std::fs::read_to_string(path).map_err(|e| TtsError::Persistence {
            message: format!("Failed to read speaker registry: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        serde_json::from_str(&content).map_err(|e| TtsError::Persistence {
            message: format!("Failed to parse speaker registry: {}", e),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self, location: &str) -> Result<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| TtsError::Internal {
            message: "Failed to acquire registry write lock".to_string(),
            location: Some(location.to_string()),
        })
    }

    /// Rewrite the whole document
    pub fn save(&self) -> Result<()> {
        let document: BTreeMap<String, SpeakerFeature> = self
            .records
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let content = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| TtsError::Persistence {
                    message: format!("Failed to create registry directory: {}", e),
                    path: Some(parent.to_path_buf()),
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| TtsError::Persistence {
                message: format!("Failed to write speaker registry: {}", e),
                path: Some(self.path.clone()),
            })
    }

    /// Save, logging instead of failing. Memory stays authoritative.
    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!("{}; keeping in-memory registry until the next save", e);
        }
    }

    pub fn get(&self, speaker_id: &str) -> Option<SpeakerFeature> {
        self.records.get(speaker_id).map(|r| r.value().clone())
    }

    pub fn contains(&self, speaker_id: &str) -> bool {
        self.records.contains_key(speaker_id)
    }

    /// All records, sorted by id
    pub fn records(&self) -> Vec<SpeakerFeature> {
        let mut records: Vec<SpeakerFeature> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.speaker_id.cmp(&b.speaker_id));
        records
    }

    /// Read-only projection of all records, sorted by id
    pub fn list(&self) -> Vec<SpeakerSummary> {
        self.records().iter().map(SpeakerFeature::summary).collect()
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Speakers per engine, with an entry for every engine
    pub fn count_by_engine(&self) -> BTreeMap<EngineKind, usize> {
        let mut counts: BTreeMap<EngineKind, usize> =
            EngineKind::ALL.into_iter().map(|k| (k, 0)).collect();
        for record in self.records.iter() {
            *counts.entry(record.engine).or_insert(0) += 1;
        }
        counts
    }

    /// Enroll a voice on the preferred engine (downgraded when unavailable)
    /// and persist the resulting record, replacing any previous one.
    pub fn extract_and_register(
        &self,
        engines: &EngineSet,
        speaker_id: &str,
        reference_audio: &Path,
        preferred: EngineKind,
        description: Option<&str>,
    ) -> Result<SpeakerFeature> {
        if speaker_id.trim().is_empty() {
            return Err(TtsError::Validation {
                message: "speaker id is empty".to_string(),
                field: Some("speaker_id".to_string()),
            });
        }
        if !reference_audio.exists() {
            return Err(TtsError::missing_audio(reference_audio));
        }

        let engine = engines.resolve(preferred);
        let adapter = engines.get(engine);
        adapter.prepare()?;

        let _guard = self.lock("SpeakerRegistry::extract_and_register")?;

        let enrollment = adapter.extract_feature(speaker_id, reference_audio, description)?;

        // A previous record owned by the other engine leaves stale engine state behind.
        if let Some(previous) = self.get(speaker_id) {
            if previous.engine != engine {
                engines.get(previous.engine).release(&previous);
            }
        }

        let record = SpeakerFeature::new(
            speaker_id,
            engine,
            enrollment.payload,
            reference_audio,
            enrollment.metadata,
        );
        self.records.insert(speaker_id.to_string(), record.clone());
        self.persist();

        info!("Registered speaker '{}' on {}", speaker_id, engine);
        Ok(record)
    }

    /// Remove a speaker and release its engine-side state.
    /// Returns false when the id was not registered.
    pub fn delete(&self, engines: &EngineSet, speaker_id: &str) -> Result<bool> {
        let _guard = self.lock("SpeakerRegistry::delete")?;

        let Some((_, record)) = self.records.remove(speaker_id) else {
            debug!("Delete of unknown speaker '{}'", speaker_id);
            return Ok(false);
        };

        engines.get(record.engine).release(&record);
        self.persist();

        info!("Deleted speaker '{}'", speaker_id);
        Ok(true)
    }
}
