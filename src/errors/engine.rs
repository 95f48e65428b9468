// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::ConfigError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A node in the tree already belongs to a started engine.
    #[error("Process '{process}' has already been started")]
    AlreadyStarted { process: String },

    /// The same node handle appears more than once in the tree.
    #[error("Process '{process}' appears more than once in the tree")]
    DuplicateProcess { process: String },

    #[error("Invalid engine options: {0}")]
    InvalidOptions(#[from] ConfigError),
}
