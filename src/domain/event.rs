//! Event channels a registry can notify on.
//!
//! There is exactly one channel today, [`ModeEvent::Change`]. The type is a
//! closed enum so new channels are added as variants; anything that arrives as a
//! string goes through [`FromStr`] and an unknown name is rejected with
//! [`ModeError::InvalidEvent`](super::ModeError::InvalidEvent).
//!
//! # Example
//!
//! ```rust
//! use modestack::ModeEvent;
//!
//! let event: ModeEvent = "change".parse()?;
//! assert_eq!(event, ModeEvent::Change);
//! assert!("scroll".parse::<ModeEvent>().is_err());
//! # Ok::<(), modestack::ModeError>(())
//! ```

use super::error::ModeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of distinct event channels.
pub(crate) const CHANNELS: usize = 1;

/// A notification channel on a [`ModeRegistry`](super::ModeRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeEvent {
    /// The active mode changed.
    ///
    /// Subscribers receive the name of the mode that is now on top of the
    /// stack: the entered mode after `set_mode`, the resumed mode after
    /// `exit_mode`.
    Change,
}

impl ModeEvent {
    /// Every channel, in declaration order.
    pub const ALL: [Self; CHANNELS] = [Self::Change];

    /// Returns the channel's wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Change => "change",
        }
    }

    /// Position of the channel's subscriber list inside a registry.
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Change => 0,
        }
    }
}

impl fmt::Display for ModeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeEvent {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| ModeError::InvalidEvent(s.to_string()))
    }
}
