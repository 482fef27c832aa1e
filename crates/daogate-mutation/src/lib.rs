//! Optimistic updates for daogate.
//!
//! A user action (liking a proposal) is shown immediately; the write runs
//! in the background and its result decides whether the change stays or
//! is taken back.
//!
//! # Key types
//!
//! - [`Optimistic`]: a cached value as `{committed, tentative}` with a
//!   pure reducer
//! - [`EntityCache`]: every cached view of every entity
//! - [`OptimisticEngine`]: apply, write, commit or roll back; one write
//!   per entity at a time
//! - [`Notifier`]: where failure notices go

mod cache;
mod engine;
mod notify;
mod optimistic;

pub use cache::{EntityCache, MutationSnapshot, ViewId, ViewSnapshot};
pub use engine::{OptimisticEngine, ToggleOutcome};
pub use notify::{Notice, Notifier, TracingNotifier};
pub use optimistic::{Action, Optimistic, Toggle};
