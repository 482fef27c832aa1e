//! User-visible failure notices.

use std::fmt;

use daogate_auth::{AuthError, ExecError};

/// A write failure that may be shown to the user.
pub trait Notice: fmt::Display {
    /// Returns `true` if the user should not be told about this failure.
    /// A declined wallet prompt is the user's own choice, not an error.
    fn is_silent(&self) -> bool {
        false
    }
}

impl Notice for AuthError {
    fn is_silent(&self) -> bool {
        self.is_user_cancelled()
    }
}

impl<E: std::error::Error + 'static> Notice for ExecError<E> {
    fn is_silent(&self) -> bool {
        self.is_user_cancelled()
    }
}

/// Receives non-blocking failure notices (a toast, a status line).
pub trait Notifier: Send + Sync + 'static {
    fn failure(&self, entity: &str, message: &str);
}

/// Logs notices at `warn` level. Used when the host supplies no notifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn failure(&self, entity: &str, message: &str) {
        tracing::warn!(%entity, %message, "update failed");
    }
}
