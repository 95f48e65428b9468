// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::config::EngineOptions;
use crate::engine::process_list::ProcessList;
use crate::engine::worker::{supervise, Worker};
use crate::errors::{DispatchError, EngineError};
use crate::message::{Message, Payload};
use crate::observability::messages::engine::{EngineCancelled, EngineCompleted, EngineStarted};
use crate::observability::messages::StructuredLog;

/// Coordinator for a process tree.
///
/// The engine owns the root [`ProcessList`] and the cancellation token shared
/// by every node. [`start`](Engine::start) brings the whole tree up and returns
/// an [`EngineHandle`] whose [`join`](EngineHandle::join) resolves once every
/// node has reached `Killed`.
///
/// ## Lifecycle
///
/// 1. One task is spawned per node, each consuming its own bounded inbox.
/// 2. Start is delivered to every root. A node receiving Start cascades it to
///    its children before running its handler, so every node sees Start
///    before any domain message.
/// 3. A node finishes when its handler calls `set_state(State::Killed)`, when
///    its parent cascades Stop, or when the token is cancelled, whichever
///    happens first. It runs Stop-handling once, then cascades Stop to its
///    children.
/// 4. Each node's task is tracked; the handle resolves when all of them have
///    exited.
///
/// Cancelling the token (directly or through [`EngineHandle::cancel`]) takes
/// every node straight to Stop-handling through the same cascade, so cleanup
/// is never skipped.
pub struct Engine<P> {
    token: CancellationToken,
    roots: ProcessList<P>,
    options: EngineOptions,
}

impl<P: Payload> Engine<P> {
    pub fn new(token: CancellationToken, roots: ProcessList<P>) -> Self {
        Self::with_options(token, roots, EngineOptions::default())
    }

    pub fn with_options(
        token: CancellationToken,
        roots: ProcessList<P>,
        options: EngineOptions,
    ) -> Self {
        Self {
            token,
            roots,
            options,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn roots(&self) -> &ProcessList<P> {
        &self.roots
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Start every node and deliver Start to the roots.
    ///
    /// Returns as soon as the tree is running. The options are validated and
    /// the tree is checked before any worker is spawned: a node that already
    /// belongs to a started engine, or a node handle that appears twice in the
    /// tree, is rejected and nothing is started.
    pub async fn start(&self) -> Result<EngineHandle, EngineError> {
        self.options.validate()?;

        let nodes = self.roots.descendants();
        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !seen.insert(node.node_id()) {
                return Err(EngineError::DuplicateProcess {
                    process: node.name().to_string(),
                });
            }
            if node.is_attached() {
                return Err(EngineError::AlreadyStarted {
                    process: node.name().to_string(),
                });
            }
        }

        let started_at = Instant::now();
        let workers = nodes
            .iter()
            .map(|node| {
                let attached = node.attach(self.options.inbox_capacity, self.token.clone())?;
                Ok(Worker::new(node.clone(), attached, self.token.clone()))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        let tracker = TaskTracker::new();
        for worker in workers {
            tracker.spawn(supervise(worker));
        }
        tracker.close();

        if let Some(timeout) = self.options.run_timeout() {
            spawn_deadline(timeout, self.token.clone(), tracker.clone());
        }

        let started = EngineStarted {
            roots: self.roots.len(),
            processes: nodes.len(),
            inbox_capacity: self.options.inbox_capacity,
        };
        let span = started.span("start");
        started.log();

        match self.roots.dispatch(Message::start()).instrument(span).await {
            Ok(_) => {}
            Err(DispatchError::Cancelled { .. }) => {
                tracing::debug!("Token cancelled before Start reached every root");
            }
            Err(e) => tracing::warn!(error = %e, "Failed to deliver Start to the roots"),
        }

        Ok(EngineHandle {
            tracker,
            token: self.token.clone(),
            started_at,
            processes: nodes.len(),
            completed: Arc::new(OnceLock::new()),
        })
    }

    /// Start the tree and wait for every node to finish.
    pub async fn run(&self) -> Result<Duration, EngineError> {
        let handle = self.start().await?;
        Ok(handle.join().await)
    }
}

/// Cancel the tree if it is still running once `timeout` has elapsed.
fn spawn_deadline(timeout: Duration, token: CancellationToken, tracker: TaskTracker) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                let reason = format!("run timeout of {:?} elapsed", timeout);
                EngineCancelled { reason: &reason }.log();
                token.cancel();
            }
            _ = token.cancelled() => {}
            _ = tracker.wait() => {}
        }
    });
}

/// Handle to a running process tree.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tracker: TaskTracker,
    token: CancellationToken,
    started_at: Instant,
    processes: usize,
    /// Shared by every clone so completion is recorded once.
    completed: Arc<OnceLock<Duration>>,
}

impl EngineHandle {
    /// Wait until every node in the tree has reached `Killed`.
    ///
    /// Returns the time the tree took to finish; every clone of the handle
    /// observes the same value.
    pub async fn join(&self) -> Duration {
        self.tracker.wait().await;
        *self.completed.get_or_init(|| {
            let duration = self.started_at.elapsed();
            EngineCompleted {
                processes: self.processes,
                duration,
            }
            .log();
            duration
        })
    }

    /// Trigger the shared cancellation token.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            EngineCancelled {
                reason: "cancel requested",
            }
            .log();
        }
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.tracker.is_closed() && self.tracker.is_empty()
    }

    /// Nodes whose tasks have not exited yet.
    pub fn running(&self) -> usize {
        self.tracker.len()
    }

    pub fn process_count(&self) -> usize {
        self.processes
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
