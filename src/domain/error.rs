//! Error types for the mode stack.
//!
//! This module defines the centralized error type [`ModeError`] and a type alias
//! [`Result`] for the fallible, non-operational parts of the crate. All errors are
//! implemented using the `thiserror` crate for automatic `Error` trait implementation.
//!
//! Ordinary transition failures (setting an unknown mode, exiting at the root,
//! registering a duplicate name) are *not* errors: those operations report
//! through `bool`/`Option` returns. `ModeError` is reserved for caller defects
//! and for configuration loading.

use thiserror::Error;

/// The main error type for mode stack operations.
///
/// # Examples
///
/// ```
/// use modestack::{ModeError, ModeRegistry};
///
/// let registry = ModeRegistry::new(());
/// let err = registry.subscribe_named(&["resize"], |_| {}).unwrap_err();
/// assert!(matches!(err, ModeError::InvalidEvent(name) if name == "resize"));
/// ```
#[derive(Debug, Error)]
pub enum ModeError {
    /// A subscription named an event channel that does not exist.
    ///
    /// This is a programming error on the caller's side: the only channel is
    /// `"change"`. The subscription is not installed.
    #[error("invalid event requested in subscription: {0}")]
    InvalidEvent(String),

    /// A subscription listed no event channels at all.
    #[error("subscription requires at least one event")]
    NoEvents,

    /// Configuration is invalid or could not be parsed.
    ///
    /// The string describes the specific configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for mode stack operations.
///
/// This is a type alias for `std::result::Result<T, ModeError>`.
pub type Result<T> = std::result::Result<T, ModeError>;
