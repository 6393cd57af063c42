//! Report types returned by the service facade

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::{EngineKind, ModelState};

/// Per-engine view in the service status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub engine: EngineKind,
    pub available: bool,
    pub model_state: ModelState,
    /// Speakers bound to this engine
    pub speakers: usize,
}

/// Snapshot returned by `get_service_status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub feature_vector_available: bool,
    pub cached_identity_available: bool,
    pub total_speakers: usize,
    pub speakers_by_engine: BTreeMap<EngineKind, usize>,
    pub available_engines: Vec<EngineKind>,
    pub engines: Vec<EngineStatus>,
    pub stats: ServiceStats,
}

/// Running counters kept by the facade
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceStats {
    /// Total synthesis calls
    pub total_synthesis: u64,
    /// Calls that returned a path
    pub successful_synthesis: u64,
    /// Calls that returned nothing
    pub failed_synthesis: u64,
    /// Successful calls served by the fallback engine
    pub fallbacks: u64,
    /// Successful enrollments
    pub registrations: u64,
    /// Successful deletions
    pub deletions: u64,
    /// Wall time spent in synthesis (seconds)
    pub total_processing_secs: f64,
}

impl ServiceStats {
    /// Get success rate
    pub fn success_rate(&self) -> f64 {
        if self.total_synthesis == 0 {
            0.0
        } else {
            self.successful_synthesis as f64 / self.total_synthesis as f64
        }
    }

    /// Get average synthesis time
    pub fn avg_synthesis_time_ms(&self) -> f64 {
        if self.total_synthesis == 0 {
            0.0
        } else {
            self.total_processing_secs * 1000.0 / self.total_synthesis as f64
        }
    }
}

/// Secondary suggestion attached to a recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub engine: EngineKind,
    pub reason: String,
}

/// Advisory engine choice for a piece of text and options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineRecommendation {
    pub recommended_engine: EngineKind,
    pub confidence: f32,
    pub reason: String,
    pub alternatives: Vec<Alternative>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let stats = ServiceStats {
            total_synthesis: 4,
            successful_synthesis: 3,
            failed_synthesis: 1,
            ..Default::default()
        };
        assert_eq!(stats.success_rate(), 0.75);
        assert_eq!(ServiceStats::default().success_rate(), 0.0);
    }

    #[test]
    fn test_status_serializes_engine_keys() {
        let status = ServiceStatus {
            feature_vector_available: true,
            cached_identity_available: false,
            total_speakers: 1,
            speakers_by_engine: BTreeMap::from([
                (EngineKind::FeatureVector, 1),
                (EngineKind::CachedIdentity, 0),
            ]),
            available_engines: vec![EngineKind::FeatureVector],
            engines: vec![],
            stats: ServiceStats::default(),
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["speakers_by_engine"]["feature_vector"], 1);
        assert_eq!(value["available_engines"][0], "feature_vector");
    }
}
