//! Registry-backed [`ExternalStore`] implementations.
//!
//! - [`ModeNameStore`] exposes only the current mode name. Names compare by
//!   value, so no memoization is needed.
//! - [`ModeStore`] exposes the mode together with its payload as one
//!   [`ModeSnapshot`]. Snapshots compare by pointer, so the store keeps the
//!   last snapshot it handed out and returns that same allocation until the
//!   mode (or the payload registered under it) actually changes.
//!
//! Each registry lazily creates one store of each kind, shared by every
//! consumer holding it (see [`ModeRegistry::store`]). The memo therefore lives
//! beside the registry it describes and never mixes state between registries.

use super::ExternalStore;
use crate::domain::{ModeRegistry, Subscription};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The current mode and its payload, as handed to a consumer.
pub struct ModeSnapshot<T> {
    /// Active mode name.
    pub mode: Rc<str>,
    /// Payload registered with [`mode`](Self::mode).
    pub value: Rc<T>,
}

impl<T: fmt::Debug> fmt::Debug for ModeSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeSnapshot")
            .field("mode", &self.mode)
            .field("value", &self.value)
            .finish()
    }
}

/// Store whose snapshot is the current `(mode, payload)` pair.
///
/// # Example
///
/// ```rust
/// use modestack::store::ExternalStore;
/// use modestack::ModeRegistry;
/// use std::rc::Rc;
///
/// let registry = ModeRegistry::new("root");
/// registry.register_mode("search", "query");
/// let store = registry.store();
///
/// let first = store.snapshot();
/// assert!(Rc::ptr_eq(&first, &store.snapshot()));
///
/// registry.set_mode("search");
/// let second = store.snapshot();
/// assert!(!Rc::ptr_eq(&first, &second));
/// assert_eq!(*second.value, "query");
/// ```
///
/// The memo is checked against the snapshot last read, not against every
/// transition in between. Leaving a mode and returning to the same
/// registration between two reads yields the same allocation again, and
/// consumers see no change.
pub struct ModeStore<T> {
    registry: ModeRegistry<T>,
    last: RefCell<Option<Rc<ModeSnapshot<T>>>>,
}

impl<T> ModeStore<T> {
    /// Creates a store with its own memo.
    ///
    /// Prefer [`ModeRegistry::store`], which hands every consumer of a
    /// registry the same instance.
    #[must_use]
    pub const fn new(registry: ModeRegistry<T>) -> Self {
        Self {
            registry,
            last: RefCell::new(None),
        }
    }

    /// Registry this store reads from.
    #[must_use]
    pub const fn registry(&self) -> &ModeRegistry<T> {
        &self.registry
    }
}

impl<T> ExternalStore for ModeStore<T> {
    type Snapshot = Rc<ModeSnapshot<T>>;

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.registry.on_change(move |_| on_change())
    }

    fn snapshot(&self) -> Self::Snapshot {
        let (mode, value) = self.registry.current();
        let mut last = self.last.borrow_mut();

        if let Some(snapshot) = last.as_ref() {
            if *snapshot.mode == *mode && Rc::ptr_eq(&snapshot.value, &value) {
                return Rc::clone(snapshot);
            }
        }

        tracing::trace!(mode = %mode, "new mode snapshot");
        let snapshot = Rc::new(ModeSnapshot { mode, value });
        *last = Some(Rc::clone(&snapshot));
        snapshot
    }

    fn same_snapshot(a: &Self::Snapshot, b: &Self::Snapshot) -> bool {
        Rc::ptr_eq(a, b)
    }
}

impl<T> fmt::Debug for ModeStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeStore")
            .field("registry", &self.registry)
            .field("memoized", &self.last.borrow().as_ref().map(|s| Rc::clone(&s.mode)))
            .finish()
    }
}

/// Store whose snapshot is just the current mode name.
pub struct ModeNameStore<T> {
    registry: ModeRegistry<T>,
}

impl<T> ModeNameStore<T> {
    /// Creates a store reading from `registry`.
    #[must_use]
    pub const fn new(registry: ModeRegistry<T>) -> Self {
        Self { registry }
    }

    /// Registry this store reads from.
    #[must_use]
    pub const fn registry(&self) -> &ModeRegistry<T> {
        &self.registry
    }
}

impl<T> ExternalStore for ModeNameStore<T> {
    type Snapshot = Rc<str>;

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.registry.on_change(move |_| on_change())
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.registry.current_mode()
    }

    fn same_snapshot(a: &Self::Snapshot, b: &Self::Snapshot) -> bool {
        a == b
    }
}

impl<T> fmt::Debug for ModeNameStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeNameStore")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<T> ModeRegistry<T> {
    /// The memoizing `(mode, payload)` store for this registry.
    ///
    /// Repeated calls return the same instance for as long as any caller
    /// still holds it, giving consumers a stable subscribe target and a
    /// shared memo.
    #[must_use]
    pub fn store(&self) -> Rc<ModeStore<T>> {
        let mut slot = self.shared().store.borrow_mut();
        if let Some(store) = slot.upgrade() {
            return store;
        }
        let store = Rc::new(ModeStore::new(self.clone()));
        *slot = Rc::downgrade(&store);
        store
    }

    /// The mode-name store for this registry, shared like [`store`](Self::store).
    #[must_use]
    pub fn name_store(&self) -> Rc<ModeNameStore<T>> {
        let mut slot = self.shared().name_store.borrow_mut();
        if let Some(store) = slot.upgrade() {
            return store;
        }
        let store = Rc::new(ModeNameStore::new(self.clone()));
        *slot = Rc::downgrade(&store);
        store
    }
}
