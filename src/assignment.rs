//! Default role-to-model assignments
//!
//! Recomputed wholesale every time the registry is (re)populated: descriptors
//! are partitioned into fast/medium/quality groups in registry order and the
//! first member of each group becomes the default for the roles that want
//! that profile. Roles whose group is empty get no entry, which pushes their
//! selections onto the scoring path instead.

use crate::descriptor::{ModelDescriptor, SpeedClass};
use std::collections::HashMap;

/// Roles served by the first fast model
const REALTIME_ROLES: &[&str] = &["coordinate", "emergency"];
/// Roles served by the first medium model
const BALANCED_ROLES: &[&str] = &["ollama", "browser"];
/// Roles served by the first quality model
const QUALITY_ROLES: &[&str] = &["coder", "planner"];

/// Quality estimate above which a non-slow model still counts as a
/// quality-tier candidate
const QUALITY_CUTOFF: f64 = 0.8;

/// Build the role assignment table from descriptors in registry order
pub fn build_assignments(descriptors: &[ModelDescriptor]) -> HashMap<String, String> {
    let first_fast = descriptors.iter().find(|d| d.speed == SpeedClass::Fast);
    let first_medium = descriptors.iter().find(|d| d.speed == SpeedClass::Medium);
    let first_quality = descriptors
        .iter()
        .find(|d| d.speed == SpeedClass::Slow || d.performance.quality > QUALITY_CUTOFF);

    let mut assignments = HashMap::new();

    for (model, roles) in [
        (first_fast, REALTIME_ROLES),
        (first_medium, BALANCED_ROLES),
        (first_quality, QUALITY_ROLES),
    ] {
        if let Some(model) = model {
            for role in roles {
                assignments.insert(role.to_string(), model.id.clone());
            }
        }
    }

    if !assignments.is_empty() {
        tracing::debug!(count = assignments.len(), "Built role assignments");
    }

    assignments
}
