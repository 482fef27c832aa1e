//! Log output for hosts that don't install their own subscriber.

use tracing_subscriber::EnvFilter;

use crate::DaogateError;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "daogate=info";

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default
/// `daogate=info`). Does nothing if a global subscriber is already set.
pub fn init() {
    if let Err(e) = try_init() {
        tracing::debug!(error = %e, "log subscriber not installed");
    }
}

/// Like [`init`], but reports an already-installed subscriber as an error.
pub fn try_init() -> Result<(), DaogateError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| DaogateError::Config(format!("logging: {e}")))
}
