// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for engine lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Bringing a process tree up
//! * The whole tree reaching the terminal state
//! * Global cancellation, including the run deadline

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Every worker has been spawned and Start delivered to the roots.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use dproc::observability::messages::engine::EngineStarted;
///
/// let msg = EngineStarted {
///     roots: 1,
///     processes: 12,
///     inbox_capacity: 1024,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct EngineStarted {
    pub roots: usize,
    pub processes: usize,
    pub inbox_capacity: usize,
}

impl Display for EngineStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine started: {} root(s), {} processes, inbox_capacity={}",
            self.roots, self.processes, self.inbox_capacity
        )
    }
}

impl StructuredLog for EngineStarted {
    fn log(&self) {
        tracing::info!(
            roots = self.roots,
            processes = self.processes,
            inbox_capacity = self.inbox_capacity,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "engine",
            span_name = name,
            roots = self.roots,
            processes = self.processes,
        )
    }
}

/// Every process in the tree reached Killed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EngineCompleted {
    pub processes: usize,
    pub duration: Duration,
}

impl Display for EngineCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine completed: {} processes killed in {:?}",
            self.processes, self.duration
        )
    }
}

impl StructuredLog for EngineCompleted {
    fn log(&self) {
        tracing::info!(
            processes = self.processes,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "engine_completed",
            span_name = name,
            processes = self.processes,
            duration = ?self.duration,
        )
    }
}

/// The shared cancellation token was triggered by the engine itself.
///
/// # Log Level
/// `warn!` - The tree is being torn down before finishing its work
///
/// # Example
/// ```
/// use dproc::observability::messages::engine::EngineCancelled;
///
/// let msg = EngineCancelled { reason: "run timeout of 30s elapsed" };
/// tracing::warn!("{}", msg);
/// ```
pub struct EngineCancelled<'a> {
    pub reason: &'a str,
}

impl Display for EngineCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Engine cancelling process tree: {}", self.reason)
    }
}

impl StructuredLog for EngineCancelled<'_> {
    fn log(&self) {
        tracing::warn!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("engine_cancelled", span_name = name, reason = self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_message_lists_tree_size() {
        let msg = EngineStarted {
            roots: 2,
            processes: 9,
            inbox_capacity: 64,
        };
        assert_eq!(
            msg.to_string(),
            "Engine started: 2 root(s), 9 processes, inbox_capacity=64"
        );
    }

    #[test]
    fn cancelled_message_includes_reason() {
        let msg = EngineCancelled { reason: "shutdown" };
        assert!(msg.to_string().ends_with("shutdown"));
    }
}
