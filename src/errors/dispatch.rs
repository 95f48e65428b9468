// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Reasons a [`ProcessList::dispatch`](crate::engine::ProcessList::dispatch)
/// call stopped before reaching every member.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The shared cancellation token fired while delivering.
    #[error("Dispatch of '{kind}' cancelled after reaching {delivered} member(s)")]
    Cancelled { kind: String, delivered: usize },

    /// The owning node has begun Stop-handling and may no longer emit domain
    /// messages.
    #[error("Process '{process}' is stopping; domain message '{kind}' rejected")]
    OwnerStopping { process: String, kind: String },

    /// A member was dispatched to before the engine started its worker.
    #[error("Process '{process}' has not been started")]
    NotStarted { process: String },
}
