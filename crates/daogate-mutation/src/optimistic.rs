//! The `{committed, tentative}` pair and its reducer.

// ---------------------------------------------------------------------------
// Toggle
// ---------------------------------------------------------------------------

/// A cached representation carrying one boolean property that users can
/// flip (e.g. "liked").
///
/// `toggled` must be pure: it derives the new representation from the old
/// one and must not depend on anything else. Derived fields (a like count)
/// are adjusted here, so every cached view stays self-consistent.
pub trait Toggle: Clone + Send + Sync + 'static {
    /// Current value of the property.
    fn is_on(&self) -> bool;

    /// Returns a copy with the property set to `on`.
    fn toggled(&self, on: bool) -> Self;
}

impl Toggle for bool {
    fn is_on(&self) -> bool {
        *self
    }

    fn toggled(&self, on: bool) -> Self {
        on
    }
}

// ---------------------------------------------------------------------------
// Optimistic
// ---------------------------------------------------------------------------

/// A reducer action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<V> {
    /// Show `V` while a write is pending.
    Apply(V),
    /// The write succeeded: the tentative value becomes committed.
    Commit,
    /// The write failed: discard the tentative value.
    Rollback,
    /// Fresh data from the server replaces the committed value. A pending
    /// tentative value keeps being shown.
    Refresh(V),
}

/// One cached value as last confirmed by the server, plus the value shown
/// while a write is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimistic<V> {
    committed: V,
    tentative: Option<V>,
}

impl<V: Clone> Optimistic<V> {
    pub fn new(committed: V) -> Self {
        Self {
            committed,
            tentative: None,
        }
    }

    /// The value to display.
    pub fn current(&self) -> &V {
        self.tentative.as_ref().unwrap_or(&self.committed)
    }

    pub fn committed(&self) -> &V {
        &self.committed
    }

    pub fn is_pending(&self) -> bool {
        self.tentative.is_some()
    }

    /// Returns the state after `action`. `self` is left untouched.
    pub fn reduce(&self, action: Action<V>) -> Self {
        match action {
            Action::Apply(value) => Self {
                committed: self.committed.clone(),
                tentative: Some(value),
            },
            Action::Commit => Self::new(self.current().clone()),
            Action::Rollback => Self::new(self.committed.clone()),
            Action::Refresh(value) => Self {
                committed: value,
                tentative: self.tentative.clone(),
            },
        }
    }
}
