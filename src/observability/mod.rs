//! Tracing setup for applications embedding the mode stack.
//!
//! The registry reports through `tracing` macros only: transitions and
//! registration changes at `debug`, dispatch and subscription bookkeeping at
//! `trace`. Nothing is printed unless a subscriber is installed, either by the
//! host application or with [`init_tracing`].
//!
//! # Configuration
//!
//! The filter is resolved in this order:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` from the [`Config`](crate::Config)
//! 3. Default: `"info"`
//!
//! # Usage
//!
//! ```rust
//! use modestack::observability::init_tracing;
//! use modestack::Config;
//!
//! let config = Config::<()> {
//!     trace_level: Some("modestack=debug".to_string()),
//!     ..Default::default()
//! };
//! init_tracing(&config);
//!
//! tracing::debug!("mode tracing is active");
//! ```

mod init;

pub use init::{filter_for, init_tracing};
