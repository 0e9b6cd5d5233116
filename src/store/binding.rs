//! Consumer side of an [`ExternalStore`].
//!
//! [`StoreBinding`] plays the part a reactive host plays for a mounted
//! component: it renders once on creation, subscribes to the store, re-reads
//! the snapshot on each notification and renders again only when the snapshot
//! is not the same as the one last rendered. Dropping the binding unsubscribes
//! (the component unmounts).
//!
//! [`use_mode`] is the boundary convenience for application code that just
//! wants "the mode right now, and a way to change it" from an explicitly
//! passed registry.

use super::ExternalStore;
use crate::domain::{ModeRegistry, Subscription};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

struct BindingState<S: ExternalStore> {
    store: Rc<S>,
    current: RefCell<S::Snapshot>,
    renders: Cell<usize>,
    render: Box<dyn Fn(&S::Snapshot)>,
}

impl<S: ExternalStore> BindingState<S> {
    fn render_with(&self, snapshot: &S::Snapshot) {
        self.renders.set(self.renders.get() + 1);
        (self.render)(snapshot);
    }

    /// Re-reads the store and renders if the snapshot changed.
    fn refresh(&self) {
        let next = self.store.snapshot();
        if S::same_snapshot(&self.current.borrow(), &next) {
            return;
        }
        *self.current.borrow_mut() = next.clone();
        tracing::trace!(renders = self.renders.get() + 1, "store changed, re-rendering");
        self.render_with(&next);
    }
}

/// A mounted consumer of an [`ExternalStore`].
///
/// # Example
///
/// ```rust
/// use modestack::store::StoreBinding;
/// use modestack::ModeRegistry;
///
/// let registry = ModeRegistry::without_payload();
/// registry.register_mode("search", ());
///
/// let binding = StoreBinding::new(registry.name_store(), |mode| println!("render {mode}"));
/// assert_eq!(binding.render_count(), 1);
///
/// registry.set_mode("search");
/// assert_eq!(&*binding.snapshot(), "search");
/// assert_eq!(binding.render_count(), 2);
/// ```
pub struct StoreBinding<S: ExternalStore + 'static> {
    state: Rc<BindingState<S>>,
    subscription: Subscription,
}

impl<S: ExternalStore + 'static> StoreBinding<S> {
    /// Renders `store`'s current snapshot and subscribes for changes.
    ///
    /// A change that lands between the first render and the subscription is
    /// picked up immediately with a second render.
    pub fn new<F>(store: Rc<S>, render: F) -> Self
    where
        F: Fn(&S::Snapshot) + 'static,
    {
        let initial = store.snapshot();
        let state = Rc::new(BindingState {
            store,
            current: RefCell::new(initial.clone()),
            renders: Cell::new(0),
            render: Box::new(render),
        });
        state.render_with(&initial);

        let weak: Weak<BindingState<S>> = Rc::downgrade(&state);
        let subscription = state.store.subscribe(Rc::new(move || {
            if let Some(state) = weak.upgrade() {
                state.refresh();
            }
        }));
        state.refresh();

        Self {
            state,
            subscription,
        }
    }

    /// Snapshot used by the most recent render.
    #[must_use]
    pub fn snapshot(&self) -> S::Snapshot {
        self.state.current.borrow().clone()
    }

    /// Number of renders so far, including the initial one.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.state.renders.get()
    }

    /// Store this binding observes.
    #[must_use]
    pub fn store(&self) -> &Rc<S> {
        &self.state.store
    }
}

impl<S: ExternalStore + 'static> Drop for StoreBinding<S> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

impl<S: ExternalStore + 'static> fmt::Debug for StoreBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBinding")
            .field("renders", &self.state.renders.get())
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

/// Current mode of a registry together with a setter bound to it.
///
/// Returned by [`use_mode`].
pub struct UseMode<T> {
    mode: Rc<str>,
    registry: ModeRegistry<T>,
}

impl<T> UseMode<T> {
    /// Mode that was active when this value was read.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Enters `name` on the underlying registry.
    ///
    /// See [`ModeRegistry::set_mode`].
    pub fn set_mode(&self, name: &str) -> bool {
        self.registry.set_mode(name)
    }
}

impl<T> fmt::Debug for UseMode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseMode").field("mode", &self.mode).finish_non_exhaustive()
    }
}

/// Reads `registry`'s current mode through its shared name store.
///
/// # Example
///
/// ```rust
/// use modestack::{use_mode, ModeRegistry, DEFAULT_MODE};
///
/// let registry = ModeRegistry::without_payload();
/// registry.register_mode("help", ());
///
/// let view = use_mode(&registry);
/// assert_eq!(view.mode(), DEFAULT_MODE);
/// assert!(view.set_mode("help"));
/// assert_eq!(use_mode(&registry).mode(), "help");
/// ```
#[must_use]
pub fn use_mode<T>(registry: &ModeRegistry<T>) -> UseMode<T> {
    UseMode {
        mode: registry.name_store().snapshot(),
        registry: registry.clone(),
    }
}
