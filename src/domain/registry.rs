//! The mode registry: registered modes, the mode stack, and change fan-out.
//!
//! [`ModeRegistry`] owns three pieces of state:
//!
//! - **Registered modes**: mode name → payload. The default mode
//!   ([`DEFAULT_MODE`]) is seeded at construction and can never be removed.
//! - **Stack**: mode history, pushed by `set_mode` and popped by `exit_mode`.
//!   The bottom is always the default mode and the top is the current mode.
//! - **Subscribers**: callbacks on the [`ModeEvent::Change`] channel.
//!
//! # State Machine
//!
//! ```text
//!            set_mode(m)  [m registered, m != top]
//!   ┌─────────┐ ───────────────────────────► ┌──────────────┐
//!   │ command │                              │ command, m   │ ──► ...
//!   └─────────┘ ◄─────────────────────────── └──────────────┘
//!                 exit_mode()  [depth > 1]
//! ```
//!
//! Every successful transition notifies subscribers synchronously with the
//! new top-of-stack name before the call returns. Failed transitions change
//! nothing and notify nobody.
//!
//! # Sharing
//!
//! A registry is a cheap [`Clone`] handle over single-threaded shared state.
//! All operations take `&self`, and no internal borrow is held while
//! subscribers run, so a subscriber may call straight back into the registry.
//! Such a reentrant call notifies (recursively) before the outer call
//! returns. The registry is neither `Send` nor `Sync`.
//!
//! Subscribers that call back in should capture a [`WeakModeRegistry`]
//! (from [`ModeRegistry::downgrade`]) rather than a clone: the registry owns
//! its subscribers, so a strong handle inside a callback keeps the registry
//! and its payloads alive after every other handle is gone.
//!
//! ```rust
//! use modestack::{ModeEvent, ModeRegistry};
//!
//! let registry = ModeRegistry::without_payload();
//! registry.register_mode("loading", ());
//! registry.register_mode("results", ());
//!
//! let weak = registry.downgrade();
//! let _redirect = registry.subscribe(&[ModeEvent::Change], move |mode| {
//!     if let (Some(registry), "loading") = (weak.upgrade(), mode) {
//!         registry.set_mode("results");
//!     }
//! })?;
//!
//! registry.set_mode("loading");
//! assert_eq!(&*registry.current_mode(), "results");
//! # Ok::<(), modestack::ModeError>(())
//! ```
//!
//! # Example
//!
//! ```rust
//! use modestack::{ModeEvent, ModeRegistry, DEFAULT_MODE};
//!
//! let registry = ModeRegistry::new("commands");
//! let search = registry.register_mode("search", "search results").unwrap();
//!
//! let _subscription = registry.subscribe(&[ModeEvent::Change], |mode| {
//!     println!("now in {mode}");
//! })?;
//!
//! assert!(registry.set_mode("search"));
//! assert_eq!(&*registry.current_mode(), "search");
//! assert_eq!(*registry.current_value(), "search results");
//!
//! search.unregister();
//! assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
//! # Ok::<(), modestack::ModeError>(())
//! ```

use super::error::{ModeError, Result};
use super::event::ModeEvent;
use super::handles::{Callback, ModeRegistration, Subscribers, Subscription};
use crate::store::{ModeNameStore, ModeStore};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Name of the root mode every registry starts in.
pub const DEFAULT_MODE: &str = "command";

/// A registered mode's payload plus the id of the registration that created it.
struct Entry<T> {
    payload: Rc<T>,
    id: u64,
}

struct State<T> {
    modes: HashMap<Rc<str>, Entry<T>>,
    stack: Vec<Rc<str>>,
    root: Rc<str>,
    root_payload: Rc<T>,
    next_registration: u64,
}

impl<T> State<T> {
    fn top(&self) -> &Rc<str> {
        self.stack.last().unwrap_or(&self.root)
    }

    fn payload_of(&self, name: &str) -> Rc<T> {
        self.modes
            .get(name)
            .map_or_else(|| Rc::clone(&self.root_payload), |entry| Rc::clone(&entry.payload))
    }
}

/// State shared by every clone of a registry and reachable from its handles.
pub(crate) struct Shared<T> {
    state: RefCell<State<T>>,
    subscribers: Rc<RefCell<Subscribers>>,
    pub(crate) store: RefCell<Weak<ModeStore<T>>>,
    pub(crate) name_store: RefCell<Weak<ModeNameStore<T>>>,
}

/// A stack of named interaction modes with change notification.
///
/// Each mode carries a payload of type `T`, read back through
/// [`current_value`](Self::current_value). Use `ModeRegistry<()>` (see
/// [`without_payload`](ModeRegistry::without_payload)) when modes are plain names.
pub struct ModeRegistry<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for ModeRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

/// Non-owning handle to a [`ModeRegistry`].
///
/// Created by [`ModeRegistry::downgrade`]; meant to be captured by
/// subscribers that call back into the registry.
pub struct WeakModeRegistry<T> {
    shared: Weak<Shared<T>>,
}

impl<T> WeakModeRegistry<T> {
    /// Returns the registry if any strong handle to it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<ModeRegistry<T>> {
        self.shared.upgrade().map(ModeRegistry::from_shared)
    }
}

impl<T> Clone for WeakModeRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for WeakModeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakModeRegistry")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl ModeRegistry<()> {
    /// Creates a registry whose modes carry no payload.
    #[must_use]
    pub fn without_payload() -> Self {
        Self::new(())
    }
}

impl<T> ModeRegistry<T> {
    /// Creates a registry in the default mode with `default_payload` attached to it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modestack::{ModeRegistry, DEFAULT_MODE};
    ///
    /// let registry = ModeRegistry::new(42);
    /// assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
    /// assert_eq!(*registry.current_value(), 42);
    /// assert_eq!(registry.depth(), 1);
    /// ```
    #[must_use]
    pub fn new(default_payload: T) -> Self {
        let root: Rc<str> = Rc::from(DEFAULT_MODE);
        let root_payload = Rc::new(default_payload);

        let mut modes = HashMap::new();
        modes.insert(
            Rc::clone(&root),
            Entry {
                payload: Rc::clone(&root_payload),
                id: 0,
            },
        );

        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(State {
                    modes,
                    stack: vec![Rc::clone(&root)],
                    root,
                    root_payload,
                    next_registration: 1,
                }),
                subscribers: Rc::new(RefCell::new(Subscribers::default())),
                store: RefCell::new(Weak::new()),
                name_store: RefCell::new(Weak::new()),
            }),
        }
    }

    pub(crate) const fn from_shared(shared: Rc<Shared<T>>) -> Self {
        Self { shared }
    }

    pub(crate) const fn shared(&self) -> &Rc<Shared<T>> {
        &self.shared
    }

    /// Creates a handle that does not keep the registry alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakModeRegistry<T> {
        WeakModeRegistry {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Returns `true` if both handles refer to the same registry.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.shared, &b.shared)
    }

    /// Registers a new mode under `name` with its payload.
    ///
    /// Does not touch the stack or notify anyone.
    ///
    /// # Returns
    ///
    /// - `Some(ModeRegistration)` holding the capability to remove the mode again
    /// - `None` if `name` is already registered (including [`DEFAULT_MODE`])
    pub fn register_mode(&self, name: &str, payload: T) -> Option<ModeRegistration<T>> {
        let mut state = self.shared.state.borrow_mut();
        if state.modes.contains_key(name) {
            tracing::debug!(mode = %name, "mode already registered");
            return None;
        }

        let id = state.next_registration;
        state.next_registration += 1;

        let key: Rc<str> = Rc::from(name);
        state.modes.insert(
            Rc::clone(&key),
            Entry {
                payload: Rc::new(payload),
                id,
            },
        );
        drop(state);

        tracing::debug!(mode = %name, registration = id, "registered mode");
        Some(ModeRegistration::new(key, id, &self.shared))
    }

    /// Removes the mode registered under `name`.
    ///
    /// If `name` is the current mode it is exited first, which notifies
    /// subscribers with the resumed mode before the entry is removed. Any
    /// deeper occurrences of `name` in the history are dropped as well, so an
    /// `exit_mode` can never land on an unregistered mode.
    ///
    /// # Returns
    ///
    /// `true` if the mode was removed; `false` for [`DEFAULT_MODE`] or an
    /// unknown name.
    pub fn unregister(&self, name: &str) -> bool {
        self.remove_mode(name, None)
    }

    /// Removes `name`, optionally only when it still belongs to registration `expected`.
    pub(crate) fn remove_mode(&self, name: &str, expected: Option<u64>) -> bool {
        let _span = tracing::debug_span!("unregister", mode = %name).entered();

        if name == DEFAULT_MODE {
            tracing::debug!("default mode cannot be unregistered");
            return false;
        }

        let Some(id) = self.registration_id(name) else {
            tracing::debug!("mode not registered");
            return false;
        };
        if expected.is_some_and(|expected| expected != id) {
            tracing::debug!(registration = id, "registration handle is stale");
            return false;
        }

        if *self.current_mode() == *name {
            self.exit_mode();
        }

        // Subscribers notified by the exit above may have re-entered `name`.
        let top_changed = {
            let mut state = self.shared.state.borrow_mut();
            if state.modes.get(name).map(|entry| entry.id) != Some(id) {
                return false;
            }
            state.modes.remove(name);

            let previous_top = Rc::clone(state.top());
            state.stack.retain(|mode| &**mode != name);
            state.stack.dedup();
            let top = state.top();
            (**top != *previous_top).then(|| Rc::clone(top))
        };

        if let Some(top) = top_changed {
            self.notify(ModeEvent::Change, &top);
        }

        tracing::debug!(registration = id, depth = self.depth(), "unregistered mode");
        true
    }

    /// Enters `name`, pushing it onto the stack and notifying subscribers.
    ///
    /// # Returns
    ///
    /// - `true` if the mode was entered
    /// - `false` if `name` is not registered or is already the current mode;
    ///   nothing changes and no one is notified
    ///
    /// # Example
    ///
    /// ```rust
    /// use modestack::ModeRegistry;
    ///
    /// let registry = ModeRegistry::without_payload();
    /// assert!(!registry.set_mode("search"));
    ///
    /// registry.register_mode("search", ());
    /// assert!(registry.set_mode("search"));
    /// assert!(!registry.set_mode("search"));
    /// assert_eq!(registry.depth(), 2);
    /// ```
    pub fn set_mode(&self, name: &str) -> bool {
        let (entered, depth) = {
            let mut state = self.shared.state.borrow_mut();
            let key = match state.modes.get_key_value(name) {
                Some((key, _)) => Rc::clone(key),
                None => {
                    tracing::debug!(mode = %name, "cannot enter unregistered mode");
                    return false;
                }
            };
            if **state.top() == *name {
                tracing::trace!(mode = %name, "already in mode");
                return false;
            }
            state.stack.push(Rc::clone(&key));
            (key, state.stack.len())
        };

        tracing::debug!(mode = %entered, depth, "entered mode");
        self.notify(ModeEvent::Change, &entered);
        true
    }

    /// Leaves the current mode and resumes the one below it.
    ///
    /// Subscribers are notified with the *resumed* mode, not the one removed.
    ///
    /// # Returns
    ///
    /// - `Some(name)` of the mode that was exited
    /// - `None` if the registry is already at the default mode; the root can
    ///   never be exited
    pub fn exit_mode(&self) -> Option<Rc<str>> {
        let (removed, resumed, depth) = {
            let mut state = self.shared.state.borrow_mut();
            if state.stack.len() <= 1 {
                tracing::trace!("already at root mode");
                return None;
            }
            let removed = state.stack.pop()?;
            (removed, Rc::clone(state.top()), state.stack.len())
        };

        tracing::debug!(exited = %removed, mode = %resumed, depth, "exited mode");
        self.notify(ModeEvent::Change, &resumed);
        Some(removed)
    }

    /// Name of the active mode (the top of the stack).
    #[must_use]
    pub fn current_mode(&self) -> Rc<str> {
        Rc::clone(self.shared.state.borrow().top())
    }

    /// Payload registered with the active mode.
    #[must_use]
    pub fn current_value(&self) -> Rc<T> {
        let state = self.shared.state.borrow();
        state.payload_of(state.top())
    }

    /// Active mode and its payload, read under one borrow.
    pub(crate) fn current(&self) -> (Rc<str>, Rc<T>) {
        let state = self.shared.state.borrow();
        let top = Rc::clone(state.top());
        let payload = state.payload_of(&top);
        (top, payload)
    }

    /// Payload registered under `name`, if any.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<Rc<T>> {
        self.shared
            .state
            .borrow()
            .modes
            .get(name)
            .map(|entry| Rc::clone(&entry.payload))
    }

    /// Returns `true` if `name` is currently registered.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.shared.state.borrow().modes.contains_key(name)
    }

    pub(crate) fn registration_id(&self, name: &str) -> Option<u64> {
        self.shared.state.borrow().modes.get(name).map(|entry| entry.id)
    }

    /// All registered mode names, sorted.
    #[must_use]
    pub fn modes(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = self.shared.state.borrow().modes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of entries on the stack; `1` when only the default mode is active.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.shared.state.borrow().stack.len()
    }

    /// The stack from the default mode (first) to the current mode (last).
    #[must_use]
    pub fn history(&self) -> Vec<Rc<str>> {
        self.shared.state.borrow().stack.clone()
    }

    /// Subscribes `callback` to every channel in `events`.
    ///
    /// A channel listed more than once is subscribed once. Each call creates
    /// an independent subscription, even for the same callback.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError::NoEvents`] if `events` is empty.
    pub fn subscribe<F>(&self, events: &[ModeEvent], callback: F) -> Result<Subscription>
    where
        F: Fn(&str) + 'static,
    {
        if events.is_empty() {
            return Err(ModeError::NoEvents);
        }

        let mut channels: Vec<ModeEvent> = Vec::with_capacity(events.len());
        for &event in events {
            if !channels.contains(&event) {
                channels.push(event);
            }
        }

        Ok(self.insert_subscription(&channels, Rc::new(callback)))
    }

    /// Subscribes to the change channel; cannot fail.
    pub(crate) fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str) + 'static,
    {
        self.insert_subscription(&[ModeEvent::Change], Rc::new(callback))
    }

    fn insert_subscription(&self, channels: &[ModeEvent], callback: Callback) -> Subscription {
        let id = self.shared.subscribers.borrow_mut().insert(channels, &callback);
        tracing::trace!(subscription = id, ?channels, "subscribed");
        Subscription::new(id, &self.shared.subscribers)
    }

    /// Subscribes `callback` to channels given by their wire names.
    ///
    /// All names are validated before anything is subscribed.
    ///
    /// # Errors
    ///
    /// - [`ModeError::InvalidEvent`] if any name is not a known channel
    /// - [`ModeError::NoEvents`] if `events` is empty
    pub fn subscribe_named<F>(&self, events: &[&str], callback: F) -> Result<Subscription>
    where
        F: Fn(&str) + 'static,
    {
        let events = events
            .iter()
            .map(|name| name.parse::<ModeEvent>())
            .collect::<Result<Vec<_>>>()?;
        self.subscribe(&events, callback)
    }

    /// Number of live subscriptions on the change channel.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.borrow().count(ModeEvent::Change)
    }

    fn notify(&self, event: ModeEvent, mode: &str) {
        let callbacks = self.shared.subscribers.borrow().snapshot(event);
        let _span = tracing::trace_span!("notify", %event, mode, subscribers = callbacks.len()).entered();
        for callback in callbacks {
            callback(mode);
        }
    }
}

impl<T> fmt::Debug for ModeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("ModeRegistry")
            .field("stack", &state.stack)
            .field("modes", &state.modes.len())
            .field("subscribers", &*self.shared.subscribers.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const DEFAULT_DATA: &str = "default data";

    #[derive(Debug, PartialEq)]
    struct Data {
        data: &'static str,
    }

    fn registry() -> ModeRegistry<Data> {
        ModeRegistry::new(Data { data: DEFAULT_DATA })
    }

    /// Records every notification a registry sends.
    fn recorder<T>(registry: &ModeRegistry<T>) -> (Rc<RefCell<Vec<String>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = registry
            .subscribe(&[ModeEvent::Change], move |mode| sink.borrow_mut().push(mode.to_string()))
            .unwrap();
        (seen, subscription)
    }

    #[test]
    fn starts_in_default_mode() {
        let registry = registry();
        assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
        assert_eq!(registry.current_value().data, DEFAULT_DATA);
        assert_eq!(registry.depth(), 1);
        assert!(registry.is_registered(DEFAULT_MODE));
    }

    #[test]
    fn unregistered_mode_cannot_be_set() {
        let registry = registry();
        let (seen, _sub) = recorder(&registry);
        assert!(!registry.set_mode("unregistered"));
        assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn registered_mode_can_be_set() {
        let registry = registry();
        registry.register_mode("registered", Data { data: "registered data" });
        let (seen, _sub) = recorder(&registry);

        assert!(registry.set_mode("registered"));
        assert_eq!(&*registry.current_mode(), "registered");
        assert_eq!(registry.current_value().data, "registered data");
        assert_eq!(*seen.borrow(), vec!["registered"]);
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = registry();
        assert!(registry.register_mode("test", Data { data: "first" }).is_some());
        assert!(registry.register_mode("test", Data { data: "second" }).is_none());
        assert!(registry.register_mode(DEFAULT_MODE, Data { data: "root" }).is_none());
        assert_eq!(registry.value_of("test").unwrap().data, "first");
    }

    #[test]
    fn registering_does_not_notify() {
        let registry = registry();
        let (seen, _sub) = recorder(&registry);
        registry.register_mode("quiet", Data { data: "quiet" });
        assert!(seen.borrow().is_empty());
        assert_eq!(registry.depth(), 1);
    }

    #[test]
    fn setting_same_mode_twice_notifies_once() {
        let registry = registry();
        registry.register_mode("test", Data { data: "test value" });
        let (seen, _sub) = recorder(&registry);

        assert!(registry.set_mode("test"));
        assert!(!registry.set_mode("test"));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(registry.depth(), 2);
    }

    #[test]
    fn default_mode_cannot_be_reentered_from_root() {
        let registry = registry();
        assert!(!registry.set_mode(DEFAULT_MODE));
        assert_eq!(registry.depth(), 1);
    }

    #[test]
    fn exit_walks_back_through_history() {
        let registry = registry();
        registry.register_mode("first", Data { data: "first value" });
        registry.register_mode("second", Data { data: "second value" });

        registry.set_mode("first");
        registry.set_mode("second");
        assert_eq!(&*registry.current_mode(), "second");

        assert_eq!(registry.exit_mode().as_deref(), Some("second"));
        assert_eq!(&*registry.current_mode(), "first");
        assert_eq!(registry.exit_mode().as_deref(), Some("first"));
        assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
    }

    #[test]
    fn root_mode_cannot_be_exited() {
        let registry = registry();
        let (seen, _sub) = recorder(&registry);
        assert!(registry.exit_mode().is_none());
        assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn exit_notifies_with_resumed_mode() {
        let registry = registry();
        registry.register_mode("test", Data { data: "test value" });
        let (seen, _sub) = recorder(&registry);

        registry.set_mode("test");
        registry.exit_mode();
        assert_eq!(*seen.borrow(), vec!["test", DEFAULT_MODE]);
    }

    #[test]
    fn modes_can_be_revisited() {
        let registry = ModeRegistry::without_payload();
        registry.register_mode("a", ());
        registry.register_mode("b", ());
        assert!(registry.set_mode("a"));
        assert!(registry.set_mode("b"));
        assert!(registry.set_mode("a"));
        assert_eq!(
            registry.history().iter().map(|m| &**m).collect::<Vec<_>>(),
            vec![DEFAULT_MODE, "a", "b", "a"]
        );
    }

    #[test]
    fn unregistering_active_mode_exits_it() {
        let registry = registry();
        let unregister = registry.register_mode("test", Data { data: "test data" }).unwrap();
        registry.set_mode("test");
        let (seen, _sub) = recorder(&registry);

        assert!(unregister.unregister());
        assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
        assert_eq!(*seen.borrow(), vec![DEFAULT_MODE]);

        assert!(!registry.set_mode("test"));
        assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
    }

    #[test]
    fn unregistering_inactive_mode_is_silent() {
        let registry = registry();
        registry.register_mode("idle", Data { data: "idle" });
        let (seen, _sub) = recorder(&registry);

        assert!(registry.unregister("idle"));
        assert!(!registry.is_registered("idle"));
        assert!(seen.borrow().is_empty());
        assert!(!registry.unregister("idle"));
    }

    #[test]
    fn unregistering_buried_mode_purges_history() {
        let registry = ModeRegistry::without_payload();
        registry.register_mode("a", ());
        registry.register_mode("b", ());
        registry.set_mode("b");
        registry.set_mode("a");
        registry.set_mode("b");
        let (seen, _sub) = recorder(&registry);

        assert!(registry.unregister("a"));
        assert_eq!(
            registry.history().iter().map(|m| &**m).collect::<Vec<_>>(),
            vec![DEFAULT_MODE, "b"]
        );
        assert!(seen.borrow().is_empty());
        assert_eq!(registry.exit_mode().as_deref(), Some("b"));
        assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
    }

    #[test]
    fn default_mode_cannot_be_unregistered() {
        let registry = registry();
        assert!(!registry.unregister(DEFAULT_MODE));
        assert!(registry.is_registered(DEFAULT_MODE));
    }

    #[test]
    fn unsubscribed_callbacks_hear_nothing() {
        let registry = registry();
        registry.register_mode("test", Data { data: "test value" });
        let (seen, subscription) = recorder(&registry);

        registry.set_mode("test");
        assert_eq!(seen.borrow().len(), 1);

        subscription.unsubscribe();
        registry.exit_mode();
        registry.set_mode("test");
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_run_in_subscription_order() {
        let registry = ModeRegistry::without_payload();
        registry.register_mode("a", ());
        let order = Rc::new(RefCell::new(Vec::new()));
        let _subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let order = Rc::clone(&order);
                registry
                    .subscribe(&[ModeEvent::Change], move |_| order.borrow_mut().push(i))
                    .unwrap()
            })
            .collect();

        registry.set_mode("a");
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn invalid_event_names_are_programming_errors() {
        let registry = registry();
        let err = registry.subscribe_named(&["change", "resize"], |_| {}).unwrap_err();
        assert!(matches!(err, ModeError::InvalidEvent(ref name) if name == "resize"));
        assert_eq!(registry.subscriber_count(), 0);

        assert!(matches!(registry.subscribe(&[], |_| {}), Err(ModeError::NoEvents)));
        assert!(registry.subscribe_named(&["change"], |_| {}).is_ok());
        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn reentrant_transitions_notify_synchronously() {
        let registry = ModeRegistry::without_payload();
        registry.register_mode("loading", ());
        registry.register_mode("results", ());

        let (seen, _sub) = recorder(&registry);
        let inner = registry.downgrade();
        let _redirect = registry
            .subscribe(&[ModeEvent::Change], move |mode| {
                if let (Some(inner), "loading") = (inner.upgrade(), mode) {
                    assert!(inner.set_mode("results"));
                }
            })
            .unwrap();

        assert!(registry.set_mode("loading"));
        assert_eq!(&*registry.current_mode(), "results");
        assert_eq!(*seen.borrow(), vec!["loading", "results"]);
    }

    #[test]
    fn read_after_write_is_immediate() {
        let registry = ModeRegistry::without_payload();
        registry.register_mode("a", ());
        let observed = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&observed);
        let reader = registry.downgrade();
        let _sub = registry
            .subscribe(&[ModeEvent::Change], move |_| {
                *sink.borrow_mut() = reader.upgrade().map(|r| r.current_mode());
            })
            .unwrap();

        registry.set_mode("a");
        assert_eq!(observed.borrow().as_deref(), Some("a"));
    }

    #[test]
    fn unsubscribing_during_dispatch_takes_effect_next_time() {
        let registry = ModeRegistry::without_payload();
        registry.register_mode("a", ());
        let calls = Rc::new(Cell::new(0));

        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot_in = Rc::clone(&slot);
        let _first = registry
            .subscribe(&[ModeEvent::Change], move |_| {
                if let Some(sub) = slot_in.borrow().as_ref() {
                    sub.unsubscribe();
                }
            })
            .unwrap();
        let counted = Rc::clone(&calls);
        *slot.borrow_mut() = Some(
            registry
                .subscribe(&[ModeEvent::Change], move |_| counted.set(counted.get() + 1))
                .unwrap(),
        );

        registry.set_mode("a");
        assert_eq!(calls.get(), 1);
        registry.exit_mode();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn reentering_mode_during_unregister_exit_is_undone() {
        let registry = ModeRegistry::without_payload();
        registry.register_mode("a", ());
        registry.set_mode("a");
        let (seen, _sub) = recorder(&registry);

        let inner = registry.downgrade();
        let _bounce = registry
            .subscribe(&[ModeEvent::Change], move |mode| {
                if let (Some(inner), DEFAULT_MODE) = (inner.upgrade(), mode) {
                    inner.set_mode("a");
                }
            })
            .unwrap();

        assert!(registry.unregister("a"));
        assert_eq!(*seen.borrow(), vec![DEFAULT_MODE, "a", DEFAULT_MODE]);
        assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
        assert_eq!(
            registry.history().iter().map(|m| &**m).collect::<Vec<_>>(),
            vec![DEFAULT_MODE]
        );
        assert!(!registry.is_registered("a"));
    }

    /// Flags when it is dropped.
    struct DropFlag(Rc<Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    #[test]
    fn registry_is_freed_when_handles_are_released() {
        let dropped = Rc::new(Cell::new(false));
        let registry = ModeRegistry::new(DropFlag(Rc::clone(&dropped)));
        registry.register_mode("a", DropFlag(Rc::new(Cell::new(false))));

        let weak = registry.downgrade();
        let subscription = registry
            .subscribe(&[ModeEvent::Change], move |_| {
                if let Some(registry) = weak.upgrade() {
                    let _ = registry.depth();
                }
            })
            .unwrap();

        let handle = registry.downgrade();
        assert!(handle.upgrade().is_some());
        drop(registry);

        assert!(dropped.get());
        assert!(handle.upgrade().is_none());
        assert!(!subscription.is_active());
    }

    #[test]
    fn clones_share_state() {
        let registry = registry();
        let other = registry.clone();
        other.register_mode("shared", Data { data: "shared" });
        assert!(registry.set_mode("shared"));
        assert_eq!(&*other.current_mode(), "shared");
        assert!(ModeRegistry::ptr_eq(&registry, &other));
        assert!(!ModeRegistry::ptr_eq(&registry, &self::registry()));
    }

    #[test]
    fn modes_are_listed_sorted() {
        let registry = ModeRegistry::without_payload();
        registry.register_mode("zeta", ());
        registry.register_mode("alpha", ());
        let names: Vec<String> = registry.modes().iter().map(|m| m.to_string()).collect();
        assert_eq!(names, vec!["alpha", DEFAULT_MODE, "zeta"]);
    }
}
