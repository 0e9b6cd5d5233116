//! Domain layer: the mode registry and the types around it.
//!
//! Everything here is independent of how the current mode is displayed or
//! consumed; the [`store`](crate::store) layer builds on top of it.
//!
//! # Organization
//!
//! - [`registry`]: [`ModeRegistry`], the mode stack and its transitions
//! - [`event`]: [`ModeEvent`], the notification channels
//! - [`handles`]: [`Subscription`] and [`ModeRegistration`] capabilities
//! - [`error`]: error types and result alias

pub mod error;
pub mod event;
pub mod handles;
pub mod registry;

pub use error::{ModeError, Result};
pub use event::ModeEvent;
pub use handles::{ModeRegistration, Subscription};
pub use registry::{ModeRegistry, WeakModeRegistry, DEFAULT_MODE};
