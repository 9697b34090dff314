//! Process-wide model registry
//!
//! Single authoritative store for descriptors, the loaded set, and the
//! role assignment table. Every mutation from the loader, the memory
//! monitor, discovery, and the assignment builder goes through a method
//! here, so all writes serialize on one lock and the `descriptor.loaded`
//! flag can never disagree with loaded-set membership.

use crate::descriptor::ModelDescriptor;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    descriptors: HashMap<String, ModelDescriptor>,
    /// Insertion order of descriptor identities, no duplicates
    order: Vec<String>,
    loaded: HashSet<String>,
    /// Keyed by "role" or "role:task_type"
    assignments: HashMap<String, String>,
}

/// Registry of known models and their load state
pub struct ModelRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Insert or update a descriptor, preserving insertion order
    pub async fn insert(&self, descriptor: ModelDescriptor) {
        let mut inner = self.inner.write().await;
        if !inner.descriptors.contains_key(&descriptor.id) {
            inner.order.push(descriptor.id.clone());
        }
        inner.descriptors.insert(descriptor.id.clone(), descriptor);
    }

    /// Replace the entire descriptor set (destructive refresh)
    ///
    /// Loaded state survives for identities present in the new set; loaded
    /// models absent from it are dropped from the loaded set, keeping the
    /// loaded-flag/loaded-set invariant intact.
    pub async fn replace_all(&self, descriptors: Vec<ModelDescriptor>) {
        let mut inner = self.inner.write().await;

        let previously_loaded = std::mem::take(&mut inner.loaded);
        inner.descriptors.clear();
        inner.order.clear();

        for mut descriptor in descriptors {
            let id = descriptor.id.clone();
            if inner.descriptors.contains_key(&id) {
                continue;
            }
            if previously_loaded.contains(&id) {
                descriptor.loaded = true;
                inner.loaded.insert(id.clone());
            }
            inner.order.push(id.clone());
            inner.descriptors.insert(id, descriptor);
        }
    }

    pub async fn get(&self, id: &str) -> Option<ModelDescriptor> {
        let inner = self.inner.read().await;
        inner.descriptors.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        let inner = self.inner.read().await;
        inner.descriptors.contains_key(id)
    }

    /// List all descriptors in insertion order
    pub async fn list(&self) -> Vec<ModelDescriptor> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.descriptors.get(id).cloned())
            .collect()
    }

    /// First descriptor in insertion order, used as the selection fallback
    pub async fn first(&self) -> Option<ModelDescriptor> {
        let inner = self.inner.read().await;
        inner
            .order
            .first()
            .and_then(|id| inner.descriptors.get(id).cloned())
    }

    pub async fn count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.descriptors.len()
    }

    /// Mark a model loaded, recording load latency and refreshing last-used
    ///
    /// Returns false if the identity is unknown.
    pub async fn mark_loaded(&self, id: &str, load_time_ms: u64) -> bool {
        let mut inner = self.inner.write().await;
        let Some(descriptor) = inner.descriptors.get_mut(id) else {
            return false;
        };
        descriptor.loaded = true;
        descriptor.load_time_ms = load_time_ms;
        descriptor.last_used = Utc::now();
        inner.loaded.insert(id.to_string());
        true
    }

    /// Mark a model unloaded; no-op for unknown or already-unloaded identities
    pub async fn mark_unloaded(&self, id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(descriptor) = inner.descriptors.get_mut(id) {
            descriptor.loaded = false;
        }
        inner.loaded.remove(id);
    }

    /// Refresh a model's last-used timestamp
    pub async fn touch(&self, id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(descriptor) = inner.descriptors.get_mut(id) {
            descriptor.last_used = Utc::now();
        }
    }

    pub async fn is_loaded(&self, id: &str) -> bool {
        let inner = self.inner.read().await;
        inner.loaded.contains(id)
    }

    /// Loaded identities in insertion order
    pub async fn loaded_ids(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter(|id| inner.loaded.contains(*id))
            .cloned()
            .collect()
    }

    pub async fn loaded_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.loaded.len()
    }

    /// Aggregate footprint of all loaded models in MB
    pub async fn loaded_footprint_mb(&self) -> u64 {
        let inner = self.inner.read().await;
        inner
            .loaded
            .iter()
            .filter_map(|id| inner.descriptors.get(id))
            .map(|d| d.performance.memory_mb)
            .sum()
    }

    /// Loaded model with the oldest last-used timestamp
    ///
    /// Ties on the timestamp break on the identity string, so the result is
    /// deterministic rather than an accident of container iteration order.
    pub async fn least_recently_used_loaded(&self) -> Option<String> {
        let inner = self.inner.read().await;
        inner
            .loaded
            .iter()
            .filter_map(|id| inner.descriptors.get(id))
            .min_by(|a, b| a.last_used.cmp(&b.last_used).then(a.id.cmp(&b.id)))
            .map(|d| d.id.clone())
    }

    /// Replace the role assignment table wholesale
    pub async fn set_assignments(&self, assignments: HashMap<String, String>) {
        let mut inner = self.inner.write().await;
        inner.assignments = assignments;
    }

    /// Look up an assignment for (role, task), then role alone
    pub async fn assignment_for(&self, role: &str, task_type: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner
            .assignments
            .get(&format!("{}:{}", role, task_type))
            .or_else(|| inner.assignments.get(role))
            .cloned()
    }

    pub async fn assignment_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.assignments.len()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
