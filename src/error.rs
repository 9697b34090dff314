//! Error types for pool operations

use thiserror::Error;

pub type PoolResult<T> = Result<T, PoolError>;

/// Errors surfaced to callers of the pool
///
/// Provider-boundary failures are absorbed wherever a safe fallback exists
/// (discovery keeps defaults, load probes take the optimistic path), so only
/// genuinely unsatisfiable requests show up here.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Load or unload was requested for an identity the registry has never seen
    #[error("model unknown: {0}")]
    ModelUnknown(String),

    /// Selection was requested against an empty registry
    #[error("no models available")]
    NoModelsAvailable,
}
