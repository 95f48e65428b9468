// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and
//! operational logging emitted by the engine. Message types follow a
//! struct-based pattern with a `Display` implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep field names consistent between the text and the structured fields
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - engine bring-up, completion and cancellation
//! * `messages::process` - per-node lifecycle and delivery events
//!
//! # Usage
//!
//! ```rust
//! use dproc::observability::messages::{process::ProcessStarted, StructuredLog};
//!
//! ProcessStarted {
//!     process: "Prime Output",
//!     children: 0,
//! }
//! .log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

use crate::config::EngineOptions;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` when a
/// global subscriber was already installed, which is harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(true)
        .try_init()
        .is_ok()
}

/// [`init_tracing`] with the filter configured in `options`.
pub fn init_tracing_from(options: &EngineOptions) -> bool {
    init_tracing(&options.log_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        init_tracing("warn");
        assert!(!init_tracing("debug"));
    }

    #[test]
    fn init_from_options_uses_the_shared_subscriber() {
        let options = EngineOptions {
            log_filter: "dproc=debug".to_string(),
            ..EngineOptions::default()
        };
        init_tracing_from(&options);
        assert!(!init_tracing_from(&options));
    }
}
