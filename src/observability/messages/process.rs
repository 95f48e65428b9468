// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for process (tree node) lifecycle and delivery events.
//!
//! This module contains message types for logging events related to:
//! * A node entering Running, Stopping and Killed
//! * Handler failures and panics caught at the node boundary
//! * Messages the engine or a handler chose not to act on

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A node received Start and cascaded it to its children.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use dproc::observability::messages::process::ProcessStarted;
///
/// let msg = ProcessStarted {
///     process: "Prime Extension",
///     children: 9,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ProcessStarted<'a> {
    pub process: &'a str,
    pub children: usize,
}

impl Display for ProcessStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] - Starting ({} children)", self.process, self.children)
    }
}

impl StructuredLog for ProcessStarted<'_> {
    fn log(&self) {
        tracing::info!(process = self.process, children = self.children, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("process", span_name = name, process = self.process)
    }
}

/// A node began Stop-handling.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ProcessStopping<'a> {
    pub process: &'a str,
    /// What ended the node's domain work (`completed`, `cancelled`, `parent stop`, ...)
    pub trigger: &'a str,
}

impl Display for ProcessStopping<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] - Stopping: {}", self.process, self.trigger)
    }
}

impl StructuredLog for ProcessStopping<'_> {
    fn log(&self) {
        tracing::info!(process = self.process, trigger = self.trigger, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "process_stopping",
            span_name = name,
            process = self.process,
            trigger = self.trigger,
        )
    }
}

/// A node reached the terminal state.
///
/// # Log Level
/// `debug!` - Detailed lifecycle information
pub struct ProcessKilled<'a> {
    pub process: &'a str,
    pub handled: u64,
    pub dropped: u64,
}

impl Display for ProcessKilled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] - Exited: handled={} dropped={}",
            self.process, self.handled, self.dropped
        )
    }
}

impl StructuredLog for ProcessKilled<'_> {
    fn log(&self) {
        tracing::debug!(
            process = self.process,
            handled = self.handled,
            dropped = self.dropped,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("process_killed", span_name = name, process = self.process)
    }
}

/// A handler returned an error.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use dproc::observability::messages::process::HandlerFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// let msg = HandlerFailed {
///     process: "Prime Output",
///     kind: "Stop",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct HandlerFailed<'a> {
    pub process: &'a str,
    pub kind: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for HandlerFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] - Handler failed on '{}': {}",
            self.process, self.kind, self.error
        )
    }
}

impl StructuredLog for HandlerFailed<'_> {
    fn log(&self) {
        tracing::error!(
            process = self.process,
            kind = self.kind,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "handler_failed",
            span_name = name,
            process = self.process,
            error = %self.error,
        )
    }
}

/// A handler panicked; the node was retired without Stop-handling.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProcessPanicked<'a> {
    pub process: &'a str,
    pub panic: &'a str,
}

impl Display for ProcessPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] - Worker panicked, cascading Stop to children: {}",
            self.process, self.panic
        )
    }
}

impl StructuredLog for ProcessPanicked<'_> {
    fn log(&self) {
        tracing::error!(process = self.process, panic = self.panic, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("process_panicked", span_name = name, process = self.process)
    }
}

/// A message was discarded without reaching the handler.
///
/// # Log Level
/// `debug!` - Expected during shutdown
pub struct MessageDropped<'a> {
    pub process: &'a str,
    pub kind: &'a str,
    pub reason: &'a str,
}

impl Display for MessageDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] - Dropped '{}': {}",
            self.process, self.kind, self.reason
        )
    }
}

impl StructuredLog for MessageDropped<'_> {
    fn log(&self) {
        tracing::debug!(
            process = self.process,
            kind = self.kind,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("message_dropped", span_name = name, process = self.process)
    }
}

/// A handler received a message type it does not recognize.
///
/// Handlers log this and carry on; it is never fatal.
///
/// # Log Level
/// `warn!` - Unexpected but recoverable
///
/// # Example
/// ```
/// use dproc::observability::messages::process::UnknownMessageType;
///
/// let msg = UnknownMessageType {
///     process: "Rev Mapper",
///     kind: "MapKey",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct UnknownMessageType<'a> {
    pub process: &'a str,
    pub kind: &'a str,
}

impl Display for UnknownMessageType<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] - Unknown message type: {}", self.process, self.kind)
    }
}

impl StructuredLog for UnknownMessageType<'_> {
    fn log(&self) {
        tracing::warn!(process = self.process, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("unknown_message_type", span_name = name, process = self.process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_prefixed_with_process_name() {
        let started = ProcessStarted {
            process: "Prime Output",
            children: 0,
        };
        assert!(started.to_string().starts_with("[Prime Output] - "));

        let unknown = UnknownMessageType {
            process: "Rev Mapper",
            kind: "Prime",
        };
        assert_eq!(unknown.to_string(), "[Rev Mapper] - Unknown message type: Prime");
    }

    #[test]
    fn handler_failure_includes_error_text() {
        let error = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let msg = HandlerFailed {
            process: "out",
            kind: "Stop",
            error: &error,
        };
        assert_eq!(msg.to_string(), "[out] - Handler failed on 'Stop': disk full");
    }
}
