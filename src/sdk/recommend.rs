//! Advisory engine recommendation
//!
//! Fixed heuristic, first match wins:
//! - emotion or instruction requested → cached-identity, 0.9
//! - target language requested → cached-identity, 0.85
//! - text longer than the configured threshold → cached-identity, 0.7
//! - otherwise → feature-vector, 0.5
//!
//! Cached-identity is only recommended while it is available.

use crate::engine::{EngineKind, SynthesisOptions};
use super::types::{Alternative, EngineRecommendation};

pub fn recommend(
    text: &str,
    options: &SynthesisOptions,
    cached_available: bool,
    long_text_threshold: usize,
) -> EngineRecommendation {
    let wants_control = options.emotion.is_some() || options.instruction.is_some();
    let wants_language = options.target_language.is_some();
    let is_long = text.chars().count() > long_text_threshold;

    let pick = if !cached_available {
        None
    } else if wants_control {
        Some((0.9, "emotion or instruction control is handled by cached_identity"))
    } else if wants_language {
        Some((0.85, "cross-lingual synthesis needs cached_identity"))
    } else if is_long {
        Some((0.7, "cached_identity handles long text more efficiently"))
    } else {
        None
    };

    match pick {
        Some((confidence, reason)) => EngineRecommendation {
            recommended_engine: EngineKind::CachedIdentity,
            confidence,
            reason: reason.to_string(),
            alternatives: vec![Alternative {
                engine: EngineKind::FeatureVector,
                reason: "use feature_vector for stability".to_string(),
            }],
        },
        None => {
            let alternatives = if cached_available {
                vec![Alternative {
                    engine: EngineKind::CachedIdentity,
                    reason: "try cached_identity for advanced control".to_string(),
                }]
            } else {
                Vec::new()
            };
            EngineRecommendation {
                recommended_engine: EngineKind::FeatureVector,
                confidence: 0.5,
                reason: "feature_vector is the default engine".to_string(),
                alternatives,
            }
        }
    }
}
