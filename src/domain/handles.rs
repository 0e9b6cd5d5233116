//! Capability handles returned by a [`ModeRegistry`].
//!
//! Two handles leave the registry:
//!
//! - [`Subscription`]: returned by `subscribe`, removes exactly that
//!   subscription when [`Subscription::unsubscribe`] is called.
//! - [`ModeRegistration`]: returned by `register_mode`, removes exactly that
//!   registration when [`ModeRegistration::unregister`] is called.
//!
//! Neither handle keeps the registry alive and neither acts on drop. Once the
//! registry is gone both operations become no-ops.

use super::event::{ModeEvent, CHANNELS};
use super::registry::{ModeRegistry, Shared};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A change callback as stored by the registry.
pub(crate) type Callback = Rc<dyn Fn(&str)>;

/// Per-channel subscriber lists, in subscription order.
#[derive(Default)]
pub(crate) struct Subscribers {
    channels: [Vec<(u64, Callback)>; CHANNELS],
    next_id: u64,
}

impl Subscribers {
    /// Adds `callback` to every listed channel under a fresh id.
    ///
    /// `channels` must already be free of duplicates.
    pub(crate) fn insert(&mut self, channels: &[ModeEvent], callback: &Callback) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        for channel in channels {
            self.channels[channel.index()].push((id, Rc::clone(callback)));
        }
        id
    }

    /// Drops the subscription with `id` from every channel, returning whether
    /// anything was removed.
    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let mut removed = false;
        for list in &mut self.channels {
            if let Some(idx) = list.iter().position(|(entry, _)| *entry == id) {
                list.remove(idx);
                removed = true;
            }
        }
        removed
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.channels
            .iter()
            .any(|list| list.iter().any(|(entry, _)| *entry == id))
    }

    /// Copies the callbacks of one channel so they can run without holding a borrow.
    pub(crate) fn snapshot(&self, event: ModeEvent) -> Vec<Callback> {
        self.channels[event.index()]
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect()
    }

    pub(crate) fn count(&self, event: ModeEvent) -> usize {
        self.channels[event.index()].len()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for event in ModeEvent::ALL {
            list.entry(&event.as_str(), &self.count(event));
        }
        list.finish()
    }
}

/// Handle to one subscription on a [`ModeRegistry`].
///
/// Subscribing the same callback twice yields two independent subscriptions,
/// each with its own handle.
///
/// # Example
///
/// ```rust
/// use modestack::{ModeEvent, ModeRegistry};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let registry = ModeRegistry::new(());
/// registry.register_mode("search", ());
///
/// let calls = Rc::new(Cell::new(0));
/// let seen = Rc::clone(&calls);
/// let subscription = registry.subscribe(&[ModeEvent::Change], move |_| seen.set(seen.get() + 1))?;
///
/// registry.set_mode("search");
/// subscription.unsubscribe();
/// registry.exit_mode();
/// assert_eq!(calls.get(), 1);
/// # Ok::<(), modestack::ModeError>(())
/// ```
#[derive(Debug)]
#[must_use = "the callback stays subscribed until `unsubscribe` is called on this handle"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<RefCell<Subscribers>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, subscribers: &Rc<RefCell<Subscribers>>) -> Self {
        Self {
            id,
            subscribers: Rc::downgrade(subscribers),
        }
    }

    /// Removes this subscription from every channel it was registered on.
    ///
    /// Calling it again, or after the registry was dropped, does nothing.
    pub fn unsubscribe(&self) {
        let Some(subscribers) = self.subscribers.upgrade() else {
            return;
        };
        let removed = subscribers.borrow_mut().remove(self.id);
        tracing::trace!(subscription = self.id, removed, "unsubscribe");
    }

    /// Returns `true` while the callback is still subscribed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscribers
            .upgrade()
            .is_some_and(|subscribers| subscribers.borrow().contains(self.id))
    }
}

/// Capability to remove one registered mode.
///
/// Returned by [`ModeRegistry::register_mode`]. The handle is tied to that
/// specific registration: if the name is unregistered elsewhere and later
/// registered again, this handle no longer removes it.
pub struct ModeRegistration<T> {
    name: Rc<str>,
    id: u64,
    registry: Weak<Shared<T>>,
}

impl<T> ModeRegistration<T> {
    pub(crate) fn new(name: Rc<str>, id: u64, registry: &Rc<Shared<T>>) -> Self {
        Self {
            name,
            id,
            registry: Rc::downgrade(registry),
        }
    }

    /// Name the mode was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` while this registration is still in effect.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registry.upgrade().is_some_and(|shared| {
            ModeRegistry::from_shared(shared).registration_id(&self.name) == Some(self.id)
        })
    }

    /// Removes the mode, exiting it first if it is the active one.
    ///
    /// Returns `false` if the registration was already removed or the
    /// registry no longer exists.
    pub fn unregister(self) -> bool {
        let Some(shared) = self.registry.upgrade() else {
            return false;
        };
        ModeRegistry::from_shared(shared).remove_mode(&self.name, Some(self.id))
    }
}

impl<T> fmt::Debug for ModeRegistration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeRegistration")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
