//! Model Pool - capacity-aware model manager
//!
//! Discovers the models an OpenAI-compatible inference server can serve,
//! tracks which are resident, picks the best model for a caller's task
//! profile, and evicts least-recently-used models under memory pressure.

pub mod assignment;
pub mod config;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod monitor;
pub mod pool;
pub mod provider;
pub mod registry;
pub mod selection;

pub use config::{LoadingPolicy, PoolConfig};
pub use descriptor::{ModelDescriptor, PerformanceEstimate, SpeedClass, build_descriptor};
pub use error::{PoolError, PoolResult};
pub use loader::{LoadOutcome, ModelLoader};
pub use monitor::{MemoryMonitor, MonitorHandle};
pub use pool::{ModelPool, PoolStatus};
pub use provider::ProviderClient;
pub use registry::ModelRegistry;
pub use selection::{SelectionEngine, SpeedRequest, TaskRequirement};
