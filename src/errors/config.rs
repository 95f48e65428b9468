// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while loading and validating engine options.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The options file could not be read.
    #[error("Failed to read options file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML options: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML options: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension does not name a supported format.
    #[error("Unsupported options format '{extension}' (expected yaml, yml or toml)")]
    UnsupportedFormat { extension: String },

    /// A value is outside its allowed range.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
