// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with typed `tracing` fields.
//!
//! # Organization
//!
//! * `engine` - engine lifecycle events
//! * `process` - process (tree node) lifecycle and delivery events
//!
//! # Usage Pattern
//!
//! ```rust
//! use dproc::observability::messages::{engine::EngineStarted, StructuredLog};
//!
//! let msg = EngineStarted {
//!     roots: 1,
//!     processes: 5,
//!     inbox_capacity: 1024,
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod engine;
pub mod process;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
