// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_INBOX_CAPACITY, DEFAULT_LOG_FILTER, MAX_INBOX_CAPACITY, MIN_INBOX_CAPACITY,
};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Runtime options for an [`Engine`](crate::engine::Engine).
///
/// Every field is optional in the source file and falls back to the defaults
/// in [`consts`](crate::config::consts).
///
/// # Fields
/// * `inbox_capacity` - Messages a node's inbox holds before `dispatch` waits
/// * `run_timeout_seconds` - Global deadline after which the engine cancels the whole tree (optional)
/// * `log_filter` - Default `tracing` filter used by `observability::init_tracing`
///
/// # Example
/// ```yaml
/// inbox_capacity: 256
/// run_timeout_seconds: 600
/// log_filter: "dproc=debug"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    pub inbox_capacity: usize,
    pub run_timeout_seconds: Option<u64>,
    pub log_filter: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            run_timeout_seconds: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineOptions {
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout_seconds = Some(timeout.as_secs().max(1));
        self
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_seconds.map(Duration::from_secs)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_INBOX_CAPACITY..=MAX_INBOX_CAPACITY).contains(&self.inbox_capacity) {
            return Err(ConfigError::InvalidValue {
                field: "inbox_capacity",
                reason: format!(
                    "{} is outside [{}, {}]",
                    self.inbox_capacity, MIN_INBOX_CAPACITY, MAX_INBOX_CAPACITY
                ),
            });
        }
        if self.run_timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "run_timeout_seconds",
                reason: "must be at least 1 second; omit it to run without a deadline".into(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_filter",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Load and validate engine options from a YAML or TOML file.
///
/// The format is picked from the file extension (`.yaml`, `.yml`, `.toml`).
pub fn load_options<P: AsRef<Path>>(path: P) -> Result<EngineOptions, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let options: EngineOptions = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        _ => return Err(ConfigError::UnsupportedFormat { extension }),
    };

    options.validate()?;
    Ok(options)
}
