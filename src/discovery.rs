//! Model discovery and the built-in default descriptor set
//!
//! Discovery asks the provider for its model listing and, when it answers
//! with at least one model, replaces the registry's descriptor set wholesale
//! and rebuilds the role assignments. A failed or empty listing is non-fatal:
//! the current set (normally the defaults seeded at startup) stays in place.

use crate::assignment::build_assignments;
use crate::descriptor::{ModelDescriptor, SpeedClass, build_descriptor, build_descriptor_with};
use crate::provider::ProviderClient;
use crate::registry::ModelRegistry;

/// Curated default model set used until discovery succeeds
pub fn default_descriptors(endpoint: &str) -> Vec<ModelDescriptor> {
    vec![
        // Fast models for quick responses
        build_descriptor_with(
            "llama-3.2-3b-instruct",
            endpoint,
            8_192,
            SpeedClass::Fast,
            &["chat", "instruct", "reasoning"],
            &["quick_responses", "coordination", "emergency"],
        ),
        build_descriptor_with(
            "phi-3.5-mini-instruct",
            endpoint,
            4_096,
            SpeedClass::Fast,
            &["chat", "instruct"],
            &["speed", "emergency", "coordination"],
        ),
        // Medium models for balanced performance
        build_descriptor_with(
            "llama-3.2-8b-instruct",
            endpoint,
            16_384,
            SpeedClass::Medium,
            &["chat", "instruct", "reasoning", "coding"],
            &["business_analysis", "code_generation", "strategic_planning"],
        ),
        build_descriptor_with(
            "mistral-7b-instruct",
            endpoint,
            8_192,
            SpeedClass::Medium,
            &["chat", "instruct", "coding"],
            &["code_generation", "problem_solving", "technical_writing"],
        ),
        // High-quality models for complex tasks
        build_descriptor_with(
            "llama-3.1-70b-instruct",
            endpoint,
            32_768,
            SpeedClass::Slow,
            &["chat", "instruct", "reasoning", "complex_analysis"],
            &["strategic_planning", "complex_reasoning", "research"],
        ),
        build_descriptor_with(
            "qwen2.5-32b-instruct",
            endpoint,
            32_768,
            SpeedClass::Medium,
            &["chat", "instruct", "reasoning", "multilingual"],
            &["research", "analysis", "business_planning"],
        ),
    ]
}

/// Refresh the registry from the provider's model listing
///
/// Returns true when the registry was refreshed. On provider failure or an
/// empty listing the registry is left untouched and the error is only logged.
pub async fn refresh_from_provider(registry: &ModelRegistry, provider: &ProviderClient) -> bool {
    tracing::info!(endpoint = %provider.base_url(), "Discovering provider models");

    let ids = match provider.list_models().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "Could not reach provider, keeping current model set");
            return false;
        }
    };

    if ids.is_empty() {
        tracing::warn!("Provider returned no models, keeping current model set");
        return false;
    }

    let descriptors: Vec<_> = ids
        .iter()
        .map(|id| build_descriptor(id, provider.base_url()))
        .collect();
    let count = descriptors.len();

    registry.replace_all(descriptors).await;
    registry
        .set_assignments(build_assignments(&registry.list().await))
        .await;

    tracing::info!(count = count, "Discovered provider models");
    true
}
