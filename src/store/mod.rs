//! Read-and-subscribe bridge from a [`ModeRegistry`] to reactive consumers.
//!
//! A reactive host (a component tree, a render loop) observes external state
//! through three things: a subscribe entry point that tells it *something*
//! changed, a snapshot getter it calls afterwards, and an identity test it uses
//! to decide whether the new snapshot warrants a re-render. [`ExternalStore`]
//! captures that contract independently of any framework.
//!
//! ```text
//! set_mode / exit_mode ──► registry notifies ──► store subscriber fires
//!                                                       │
//!     re-render ◄── snapshot differs? ◄── host calls snapshot()
//! ```
//!
//! # Modules
//!
//! - [`adapter`]: the two registry-backed stores, [`ModeNameStore`] and the
//!   memoizing [`ModeStore`]
//! - [`binding`]: [`StoreBinding`], a consumer that renders on effective
//!   changes only, and the [`use_mode`] boundary convenience
//!
//! [`ModeRegistry`]: crate::ModeRegistry

pub mod adapter;
pub mod binding;

pub use adapter::{ModeNameStore, ModeSnapshot, ModeStore};
pub use binding::{use_mode, StoreBinding, UseMode};

use crate::domain::Subscription;
use std::rc::Rc;

/// External state observable by a reactive consumer.
///
/// Implementations must return snapshots that compare equal under
/// [`same_snapshot`](Self::same_snapshot) for as long as the underlying state
/// has not changed; otherwise consumers re-render on every read.
pub trait ExternalStore {
    /// Value handed to the consumer.
    type Snapshot: Clone;

    /// Calls `on_change` after every change until the returned subscription is
    /// cancelled.
    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Subscription;

    /// Reads the current snapshot.
    fn snapshot(&self) -> Self::Snapshot;

    /// Snapshot used for the initial, non-interactive render.
    ///
    /// Defaults to [`snapshot`](Self::snapshot).
    fn server_snapshot(&self) -> Self::Snapshot {
        self.snapshot()
    }

    /// Identity test the consumer uses to skip redundant renders.
    fn same_snapshot(a: &Self::Snapshot, b: &Self::Snapshot) -> bool;
}
