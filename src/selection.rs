//! Task requirements and model selection
//!
//! Selection resolves an explicit role assignment first; otherwise it derives
//! a requirement profile for the (role, task) pair, hard-filters the registry
//! against it, and scores the survivors. Scoring and filtering are pure
//! functions over descriptors so they are testable without a registry.

use crate::descriptor::{ModelDescriptor, SpeedClass};
use crate::error::{PoolError, PoolResult};
use crate::loader::ModelLoader;
use crate::registry::ModelRegistry;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

/// Latency profile requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedRequest {
    /// Hard requirement for a fast model
    Realtime,
    /// Prefer fast, accept anything
    Fast,
    /// Prefer large and slow
    Quality,
}

/// Requirement profile computed per request
#[derive(Debug, Clone)]
pub struct TaskRequirement {
    pub complexity: Complexity,
    pub speed: SpeedRequest,
    pub domain: &'static str,
    pub context_needed: u32,
}

/// Fixed requirement profiles per caller role
///
/// Unrecognized roles fall back to the generic "ollama" profile.
pub fn requirement_for(role: &str, _task_type: &str) -> TaskRequirement {
    match role {
        "coordinate" => TaskRequirement {
            complexity: Complexity::Simple,
            speed: SpeedRequest::Realtime,
            domain: "coordination",
            context_needed: 2_048,
        },
        "browser" => TaskRequirement {
            complexity: Complexity::Medium,
            speed: SpeedRequest::Fast,
            domain: "research",
            context_needed: 8_192,
        },
        "coder" => TaskRequirement {
            complexity: Complexity::Complex,
            speed: SpeedRequest::Quality,
            domain: "code_generation",
            context_needed: 16_384,
        },
        "planner" => TaskRequirement {
            complexity: Complexity::Complex,
            speed: SpeedRequest::Quality,
            domain: "strategic_planning",
            context_needed: 8_192,
        },
        "emergency" => TaskRequirement {
            complexity: Complexity::Simple,
            speed: SpeedRequest::Realtime,
            domain: "emergency",
            context_needed: 2_048,
        },
        _ => TaskRequirement {
            complexity: Complexity::Medium,
            speed: SpeedRequest::Fast,
            domain: "general",
            context_needed: 4_096,
        },
    }
}

/// Hard constraints: context window must fit, and a realtime request only
/// accepts fast models
pub fn meets_requirements(model: &ModelDescriptor, req: &TaskRequirement) -> bool {
    if model.context_length < req.context_needed {
        return false;
    }
    if req.speed == SpeedRequest::Realtime && model.speed != SpeedClass::Fast {
        return false;
    }
    true
}

/// Score a candidate against a requirement; higher is better
pub fn score_model(model: &ModelDescriptor, req: &TaskRequirement) -> f64 {
    let mut score = match req.speed {
        SpeedRequest::Realtime => match model.speed {
            SpeedClass::Fast => 100.0,
            _ => 0.0,
        },
        SpeedRequest::Fast => match model.speed {
            SpeedClass::Fast => 80.0,
            SpeedClass::Medium => 60.0,
            SpeedClass::Slow => 40.0,
        },
        SpeedRequest::Quality => match model.speed {
            SpeedClass::Slow => 100.0,
            SpeedClass::Medium => 80.0,
            SpeedClass::Fast => 60.0,
        },
    };

    score += (model.performance.quality * 100.0).min(50.0);

    if model.specialties.iter().any(|s| s == req.domain) {
        score += 30.0;
    }

    // Headroom bonus for generous context windows
    if model.context_length >= req.context_needed.saturating_mul(2) {
        score += 20.0;
    }

    score
}

/// Best candidate among descriptors, in the order given
///
/// Ties keep the earlier candidate, so the result is deterministic for a
/// fixed registry order.
pub fn best_candidate<'a>(
    descriptors: &'a [ModelDescriptor],
    req: &TaskRequirement,
) -> Option<&'a ModelDescriptor> {
    descriptors
        .iter()
        .filter(|m| meets_requirements(m, req))
        .fold(None, |best: Option<(&ModelDescriptor, f64)>, candidate| {
            let score = score_model(candidate, req);
            match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((candidate, score)),
            }
        })
        .map(|(model, _)| model)
}

/// Resolves the best model for a caller and ensures it is loaded
pub struct SelectionEngine {
    registry: Arc<ModelRegistry>,
    loader: Arc<ModelLoader>,
}

impl SelectionEngine {
    pub fn new(registry: Arc<ModelRegistry>, loader: Arc<ModelLoader>) -> Self {
        Self { registry, loader }
    }

    /// Select and load the best model for a (role, task) pair
    ///
    /// Resolution order: explicit assignment, scored candidates, first
    /// registered model. Fails only when the registry is empty.
    pub async fn select_model(&self, role: &str, task_type: &str) -> PoolResult<String> {
        if let Some(assigned) = self.registry.assignment_for(role, task_type).await {
            if self.registry.contains(&assigned).await {
                self.loader.ensure_loaded(&assigned).await?;
                tracing::debug!(role = %role, model_id = %assigned, "Using assigned model");
                return Ok(assigned);
            }
        }

        let requirement = requirement_for(role, task_type);
        let descriptors = self.registry.list().await;

        let winner = match best_candidate(&descriptors, &requirement) {
            Some(model) => model.id.clone(),
            None => {
                // No candidate survived filtering; fall back to the first
                // registered model rather than failing the caller
                let first = self
                    .registry
                    .first()
                    .await
                    .ok_or(PoolError::NoModelsAvailable)?;
                tracing::warn!(
                    role = %role,
                    model_id = %first.id,
                    "No model meets requirements, falling back to first registered"
                );
                first.id
            }
        };

        self.loader.ensure_loaded(&winner).await?;
        tracing::info!(role = %role, task_type = %task_type, model_id = %winner, "Model selected");
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{build_descriptor, build_descriptor_with};

    const ENDPOINT: &str = "http://localhost:1234/v1";

    #[test]
    fn test_requirement_table() {
        let req = requirement_for("coder", "general");
        assert_eq!(req.speed, SpeedRequest::Quality);
        assert_eq!(req.context_needed, 16_384);
        assert_eq!(req.domain, "code_generation");

        // Unknown roles fall back to the generic profile
        let req = requirement_for("totally-new-role", "general");
        assert_eq!(req.speed, SpeedRequest::Fast);
        assert_eq!(req.domain, "general");
        assert_eq!(req.context_needed, 4_096);
    }

    #[test]
    fn test_context_filter() {
        let req = requirement_for("coder", "general"); // needs 16k
        let small = build_descriptor_with("small", ENDPOINT, 4_096, SpeedClass::Fast, &[], &[]);
        let big = build_descriptor_with("big", ENDPOINT, 32_768, SpeedClass::Slow, &[], &[]);

        assert!(!meets_requirements(&small, &req));
        assert!(meets_requirements(&big, &req));
    }

    #[test]
    fn test_realtime_requires_fast() {
        let req = requirement_for("emergency", "general");
        let medium = build_descriptor_with("m", ENDPOINT, 8_192, SpeedClass::Medium, &[], &[]);
        let fast = build_descriptor_with("f", ENDPOINT, 8_192, SpeedClass::Fast, &[], &[]);

        assert!(!meets_requirements(&medium, &req));
        assert!(meets_requirements(&fast, &req));
    }

    #[test]
    fn test_realtime_filter_beats_quality() {
        // A fast/ctx=4096/q=0.6 vs B slow/ctx=32768/q=0.95: a realtime
        // request needing 2048 context only admits A, whatever B scores
        let mut a = build_descriptor_with("a", ENDPOINT, 4_096, SpeedClass::Fast, &[], &[]);
        a.performance.quality = 0.6;
        let mut b = build_descriptor_with("b", ENDPOINT, 32_768, SpeedClass::Slow, &[], &[]);
        b.performance.quality = 0.95;

        let req = TaskRequirement {
            complexity: Complexity::Simple,
            speed: SpeedRequest::Realtime,
            domain: "coordination",
            context_needed: 2_048,
        };

        let candidates = [a, b];
        let winner = best_candidate(&candidates, &req).unwrap();
        assert_eq!(winner.id, "a");
    }

    #[test]
    fn test_scoring_terms() {
        let req = TaskRequirement {
            complexity: Complexity::Complex,
            speed: SpeedRequest::Quality,
            domain: "code_generation",
            context_needed: 8_192,
        };

        let mut model = build_descriptor_with(
            "m",
            ENDPOINT,
            16_384,
            SpeedClass::Slow,
            &[],
            &["code_generation"],
        );
        model.performance.quality = 0.9;

        // speed 100 + quality capped at 50 + specialty 30 + headroom 20
        assert_eq!(score_model(&model, &req), 200.0);

        model.specialties = vec!["general".to_string()];
        assert_eq!(score_model(&model, &req), 170.0);

        model.context_length = 8_192; // no headroom
        assert_eq!(score_model(&model, &req), 150.0);
    }

    #[test]
    fn test_quality_term_is_capped() {
        let req = requirement_for("unknown", "general");
        let mut low = build_descriptor_with("low", ENDPOINT, 8_192, SpeedClass::Fast, &[], &[]);
        low.performance.quality = 0.4;
        let mut high = build_descriptor_with("high", ENDPOINT, 8_192, SpeedClass::Fast, &[], &[]);
        high.performance.quality = 1.0;

        // 0.4 -> 40 uncapped, 1.0 -> capped at 50
        assert_eq!(
            score_model(&high, &req) - score_model(&low, &req),
            10.0
        );
    }

    #[test]
    fn test_tie_break_keeps_registry_order() {
        let a = build_descriptor_with("first", ENDPOINT, 8_192, SpeedClass::Fast, &[], &[]);
        let b = build_descriptor_with("second", ENDPOINT, 8_192, SpeedClass::Fast, &[], &[]);
        let req = requirement_for("unknown", "general");

        assert_eq!(score_model(&a, &req), score_model(&b, &req));
        let candidates = [a, b];
        let winner = best_candidate(&candidates, &req).unwrap();
        assert_eq!(winner.id, "first");
    }

    #[test]
    fn test_no_candidates() {
        let req = requirement_for("coder", "general");
        let tiny = build_descriptor("tiny-model-4k", ENDPOINT);
        assert!(best_candidate(&[tiny], &req).is_none());
        assert!(best_candidate(&[], &req).is_none());
    }
}
