//! Modestack: a finite-depth interaction mode stack with change notification.
//!
//! Applications with modal interaction (a command palette that can be
//! switched into search, help, or a custom overlay, and back) need to know
//! which mode is active, remember where to return to, and let views react
//! when the mode changes. This crate provides:
//! - A registry of named modes, each with an arbitrary payload
//! - A mode stack with push (`set_mode`) and pop (`exit_mode`) transitions,
//!   rooted at the permanent default mode `"command"`
//! - Synchronous change notification to subscribers
//! - An external-store adapter that lets reactive consumers observe the
//!   current mode without redundant re-renders
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Application code                                   │  ← Owns the registry
//! │  register_mode / set_mode / exit_mode               │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain Layer (domain/)                             │  ← State machine
//! │  - ModeRegistry: modes, stack, subscribers          │
//! │  - Subscription / ModeRegistration handles          │
//! │  - ModeEvent channels, ModeError                    │
//! └─────────────────────────────────────────────────────┘
//!                        │ change notifications
//! ┌─────────────────────────────────────────────────────┐
//! │  Store Layer (store/)                               │  ← Consumer bridge
//! │  - ExternalStore contract                           │
//! │  - ModeNameStore / memoizing ModeStore              │
//! │  - StoreBinding, use_mode                           │
//! └─────────────────────────────────────────────────────┘
//!
//!   config (Config<T>)        observability (init_tracing)
//! ```
//!
//! # Modules
//!
//! - [`domain`]: Registry, handles, event channels, and errors
//! - [`store`]: External-store adapter and consumer binding
//! - [`config`]: Declarative registry seeding from TOML, JSON, or a key/value map
//! - [`observability`]: `tracing` subscriber setup
//!
//! # Example
//!
//! ```rust
//! use modestack::{ModeEvent, ModeRegistry, DEFAULT_MODE};
//!
//! let registry = ModeRegistry::new("Type a command");
//! let help = registry.register_mode("help", "Press ? again to close").unwrap();
//!
//! let _subscription = registry.subscribe(&[ModeEvent::Change], |mode| {
//!     tracing::info!(mode, "mode changed");
//! })?;
//!
//! assert!(registry.set_mode("help"));
//! assert_eq!(*registry.current_value(), "Press ? again to close");
//!
//! assert_eq!(registry.exit_mode().as_deref(), Some("help"));
//! assert_eq!(&*registry.current_mode(), DEFAULT_MODE);
//!
//! help.unregister();
//! assert!(!registry.set_mode("help"));
//! # Ok::<(), modestack::ModeError>(())
//! ```
//!
//! # Key Design Decisions
//!
//! ## Operational failures are return values
//!
//! Setting an unknown mode, re-entering the current mode, exiting at the
//! root, registering a duplicate, or unregistering the default mode all report
//! through `bool`/`Option`. Only caller defects (an unknown event channel) and
//! configuration problems produce a [`ModeError`].
//!
//! ## Synchronous, reentrant notification
//!
//! Subscribers run inline before the mutating call returns, and may call back
//! into the registry. There is no batching or deferral, so `current_mode` is
//! up to date inside every callback. Callbacks reach the registry through a
//! [`WeakModeRegistry`]; a strong handle captured by a callback keeps the
//! registry alive until that subscription is removed.
//!
//! ## Explicit instances
//!
//! There is no global registry. Create one at the composition root and pass
//! it (or a clone of the handle) to whoever needs it; [`use_mode`] is the
//! boundary convenience for reading and setting the mode from such a handle.
//!
//! # Threading
//!
//! Registries are single-threaded (`!Send`, `!Sync`). A multi-threaded host
//! must confine each registry to one thread.

pub mod config;
pub mod domain;
pub mod observability;
pub mod store;

pub use config::Config;
pub use domain::{
    ModeError, ModeEvent, ModeRegistration, ModeRegistry, Result, Subscription, WeakModeRegistry,
    DEFAULT_MODE,
};
pub use store::{use_mode, ExternalStore, ModeNameStore, ModeSnapshot, ModeStore, StoreBinding, UseMode};
