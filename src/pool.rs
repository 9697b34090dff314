//! Pool facade wiring registry, loader, selection, discovery, and the monitor
//!
//! This is the surface consumed by the orchestration layer: construct a
//! `ModelPool`, optionally run discovery and preload, then serve
//! `select_model` calls until `shutdown`.

use crate::assignment::build_assignments;
use crate::config::PoolConfig;
use crate::descriptor::ModelDescriptor;
use crate::discovery::{default_descriptors, refresh_from_provider};
use crate::error::PoolResult;
use crate::loader::ModelLoader;
use crate::monitor::{MemoryMonitor, MonitorHandle};
use crate::provider::ProviderClient;
use crate::registry::ModelRegistry;
use crate::selection::SelectionEngine;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Summary counters for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub total_models: usize,
    pub loaded_models: usize,
    pub assignments: usize,
}

/// Capacity-aware model pool
pub struct ModelPool {
    registry: Arc<ModelRegistry>,
    loader: Arc<ModelLoader>,
    selection: SelectionEngine,
    provider: ProviderClient,
    monitor: Mutex<MonitorHandle>,
    config: PoolConfig,
}

impl ModelPool {
    /// Create a pool seeded with the default model set, with the memory
    /// monitor already running
    pub async fn new(config: PoolConfig) -> Self {
        let registry = Arc::new(ModelRegistry::new());
        for descriptor in default_descriptors(&config.provider_endpoint) {
            registry.insert(descriptor).await;
        }
        registry
            .set_assignments(build_assignments(&registry.list().await))
            .await;

        let provider = ProviderClient::new(
            &config.provider_endpoint,
            Duration::from_secs(config.request_timeout_secs),
        );
        let loader = Arc::new(ModelLoader::new(
            registry.clone(),
            provider.clone(),
            config.policy.clone(),
        ));
        let selection = SelectionEngine::new(registry.clone(), loader.clone());
        let monitor = MemoryMonitor::spawn(registry.clone(), loader.clone(), &config.policy);

        tracing::info!(
            models = registry.count().await,
            assignments = registry.assignment_count().await,
            "Model pool initialized with default model set"
        );

        Self {
            registry,
            loader,
            selection,
            provider,
            monitor: Mutex::new(monitor),
            config,
        }
    }

    /// Refresh the registry from the provider; keeps defaults on failure
    pub async fn discover_models(&self) {
        refresh_from_provider(&self.registry, &self.provider).await;
    }

    /// Select and load the best model for a caller role and task type
    pub async fn select_model(&self, role: &str, task_type: &str) -> PoolResult<String> {
        self.selection.select_model(role, task_type).await
    }

    /// Load a specific model, evicting if at capacity
    pub async fn load_model(&self, model_id: &str) -> PoolResult<()> {
        self.loader.load(model_id).await.map(|_| ())
    }

    /// Unload a specific model; idempotent
    pub async fn unload_model(&self, model_id: &str) {
        self.loader.unload(model_id).await;
    }

    pub async fn descriptor(&self, model_id: &str) -> Option<ModelDescriptor> {
        self.registry.get(model_id).await
    }

    /// Identities of currently loaded models
    pub async fn loaded_models(&self) -> Vec<String> {
        self.registry.loaded_ids().await
    }

    pub async fn status(&self) -> PoolStatus {
        PoolStatus {
            total_models: self.registry.count().await,
            loaded_models: self.registry.loaded_count().await,
            assignments: self.registry.assignment_count().await,
        }
    }

    /// Eagerly load every policy-listed model present in the registry
    pub async fn preload(&self) {
        for model_id in self.config.policy.preload_models.clone() {
            if self.registry.contains(&model_id).await {
                if let Err(e) = self.loader.load(&model_id).await {
                    tracing::warn!(model_id = %model_id, error = %e, "Preload failed");
                }
            } else {
                tracing::debug!(model_id = %model_id, "Preload model not in registry, skipping");
            }
        }
    }

    /// Stop the memory monitor; idempotent
    pub async fn shutdown(&self) {
        self.monitor.lock().await.stop();
        tracing::info!("Model pool shut down");
    }
}
