// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors returned by [`Handler`](crate::traits::Handler) implementations.
//!
//! The engine never inspects these beyond logging them. An error while
//! handling Start or a domain message forces the node into Stopping; an error
//! while handling Stop is logged and the node is retired anyway.

use thiserror::Error;

use crate::errors::DispatchError;
use crate::message::MessageType;

#[derive(Error, Debug)]
pub enum HandlerError {
    /// A message carried a payload that does not match its tag.
    #[error("Payload mismatch for message type '{kind}': expected {expected}")]
    PayloadMismatch {
        kind: MessageType,
        expected: &'static str,
    },

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn payload_mismatch(kind: &MessageType, expected: &'static str) -> Self {
        Self::PayloadMismatch {
            kind: kind.clone(),
            expected,
        }
    }
}
