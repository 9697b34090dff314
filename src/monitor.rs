//! Background memory pressure monitor
//!
//! A recurring task that sums the footprint of loaded models and evicts the
//! least recently used one when the policy threshold is exceeded. The task
//! owns its stop signal: `MonitorHandle::stop` cancels it exactly once, and
//! dropping the handle cancels it too.

use crate::config::LoadingPolicy;
use crate::loader::ModelLoader;
use crate::registry::ModelRegistry;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

/// Periodic memory pressure checker
pub struct MemoryMonitor {
    registry: Arc<ModelRegistry>,
    loader: Arc<ModelLoader>,
    check_interval: Duration,
    threshold_mb: u64,
}

/// Owned handle to a running monitor task
pub struct MonitorHandle {
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop the monitor; subsequent calls are a no-op
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_tx.is_none()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MemoryMonitor {
    /// Spawn the monitoring task and return its handle
    pub fn spawn(
        registry: Arc<ModelRegistry>,
        loader: Arc<ModelLoader>,
        policy: &LoadingPolicy,
    ) -> MonitorHandle {
        let monitor = Self {
            registry,
            loader,
            check_interval: Duration::from_secs(policy.monitor_interval_secs),
            threshold_mb: policy.unload_threshold_mb,
        };

        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval(monitor.check_interval);
            // The first tick fires immediately; skip it so checks start one
            // full interval after spawn
            ticker.tick().await;

            tracing::info!(
                interval_secs = monitor.check_interval.as_secs(),
                threshold_mb = monitor.threshold_mb,
                "Memory monitoring started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        monitor.check_memory_pressure().await;
                    }
                    _ = stop_rx.changed() => {
                        tracing::info!("Memory monitoring stopped");
                        break;
                    }
                }
            }
        });

        MonitorHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    async fn check_memory_pressure(&self) {
        let footprint_mb = self.registry.loaded_footprint_mb().await;

        if footprint_mb > self.threshold_mb {
            tracing::warn!(
                footprint_mb = footprint_mb,
                threshold_mb = self.threshold_mb,
                "Memory usage above threshold, evicting"
            );
            self.loader.evict_least_recently_used().await;
        } else {
            tracing::trace!(footprint_mb = footprint_mb, "Memory usage within threshold");
        }
    }
}
