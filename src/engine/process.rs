// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::process_list::ProcessList;
use crate::errors::{DispatchError, EngineError};
use crate::message::{Message, Payload};
use crate::traits::Handler;

/// Lifecycle state of a [`Process`].
///
/// Transitions are monotonic: `Created -> Running -> Stopping -> Killed`.
/// Killed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum State {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Killed = 3,
}

impl State {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => State::Created,
            1 => State::Running,
            2 => State::Stopping,
            _ => State::Killed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Created => "created",
            State::Running => "running",
            State::Stopping => "stopping",
            State::Killed => "killed",
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder for a [`State`] that only ever moves forward.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(State::Created as u8))
    }

    pub(crate) fn load(&self) -> State {
        State::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `to` unless already past it. Returns the previous state.
    pub(crate) fn advance(&self, to: State) -> State {
        State::from_u8(self.0.fetch_max(to as u8, Ordering::AcqRel))
    }
}

/// Runtime pieces handed to a node's worker when the engine starts it.
pub(crate) struct Attached<P> {
    pub(crate) inbox: mpsc::Receiver<Message<P>>,
    pub(crate) handler: Box<dyn Handler<P>>,
}

struct Inner<P> {
    name: Arc<str>,
    state: Arc<StateCell>,
    children: ProcessList<P>,
    /// Taken by the worker at start.
    handler: Mutex<Option<Box<dyn Handler<P>>>>,
    inbox: OnceLock<mpsc::Sender<Message<P>>>,
    token: OnceLock<CancellationToken>,
}

/// A node of the process tree.
///
/// A `Process` pairs a [`Handler`] with an ordered, construction-time-fixed
/// list of children and a lifecycle [`State`]. It is a cheap, clonable handle:
/// the tree is assembled once, handed to an [`Engine`](crate::engine::Engine),
/// and every clone refers to the same node.
///
/// Handlers receive `&Process` on every call and use it to fan out derived
/// messages through [`children`](Process::children) and to announce completion
/// with [`set_state`](Process::set_state).
pub struct Process<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for Process<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Payload> Process<P> {
    pub fn new(
        name: impl Into<String>,
        handler: impl Handler<P> + 'static,
        mut children: ProcessList<P>,
    ) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let state = Arc::new(StateCell::new());
        children.set_owner(Arc::clone(&name), Arc::clone(&state));

        Self {
            inner: Arc::new(Inner {
                name,
                state,
                children,
                handler: Mutex::new(Some(Box::new(handler))),
                inbox: OnceLock::new(),
                token: OnceLock::new(),
            }),
        }
    }

    /// A node without children, e.g. an output writer.
    pub fn leaf(name: impl Into<String>, handler: impl Handler<P> + 'static) -> Self {
        Self::new(name, handler, ProcessList::empty())
    }

    /// Stable identifier, used for diagnostics only.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn children(&self) -> &ProcessList<P> {
        &self.inner.children
    }

    pub fn is_leaf(&self) -> bool {
        self.inner.children.is_empty()
    }

    pub fn state(&self) -> State {
        self.inner.state.load()
    }

    /// Advance the node's state; moving backwards is ignored.
    ///
    /// `set_state(State::Killed)` is a handler's voluntary "done producing"
    /// signal. It moves the node to [`State::Stopping`]; the worker runs
    /// Stop-handling, cascades Stop to the children and only then records
    /// [`State::Killed`].
    pub fn set_state(&self, state: State) {
        let target = match state {
            State::Killed => State::Stopping,
            other => other,
        };
        self.inner.state.advance(target);
    }

    pub(crate) fn advance(&self, state: State) -> State {
        self.inner.state.advance(state)
    }

    /// Identity of the shared node; equal for every clone of this handle.
    pub(crate) fn node_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.inner.inbox.get().is_some()
    }

    /// Create the node's inbox and hand its receiving side and handler to the
    /// caller, which becomes the node's only consumer.
    pub(crate) fn attach(
        &self,
        capacity: usize,
        token: CancellationToken,
    ) -> Result<Attached<P>, EngineError> {
        let already_started = || EngineError::AlreadyStarted {
            process: self.name().to_string(),
        };

        let handler = self
            .inner
            .handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or_else(already_started)?;

        let (sender, inbox) = mpsc::channel(capacity.max(1));
        self.inner.inbox.set(sender).map_err(|_| already_started())?;
        self.inner.token.set(token).map_err(|_| already_started())?;

        Ok(Attached { inbox, handler })
    }

    /// Push one message into this node's inbox.
    ///
    /// Waits while the inbox is full but gives up as soon as the shared
    /// cancellation token fires. Returns `Ok(false)` when the node's worker
    /// has already retired and no longer accepts messages.
    pub(crate) async fn deliver(&self, msg: Message<P>) -> Result<bool, DispatchError> {
        let (Some(sender), Some(token)) = (self.inner.inbox.get(), self.inner.token.get()) else {
            return Err(DispatchError::NotStarted {
                process: self.name().to_string(),
            });
        };
        let kind = msg.kind.to_string();

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(DispatchError::Cancelled { kind, delivered: 0 }),
            sent = sender.send(msg) => Ok(sent.is_ok()),
        }
    }
}

impl<P> Debug for Process<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.inner.name)
            .field("state", &self.inner.state.load())
            .field("children", &self.inner.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::stub::RecordingHandler;
    use crate::handlers::stub::TestPayload;

    fn leaf(name: &str) -> Process<TestPayload> {
        let (handler, _log) = RecordingHandler::new();
        Process::leaf(name, handler)
    }

    #[test]
    fn new_process_is_created() {
        let process = leaf("leaf");
        assert_eq!(process.name(), "leaf");
        assert_eq!(process.state(), State::Created);
        assert!(process.is_leaf());
        assert!(!process.is_attached());
    }

    #[test]
    fn state_never_moves_backwards() {
        let process = leaf("leaf");
        process.set_state(State::Running);
        process.set_state(State::Created);
        assert_eq!(process.state(), State::Running);
    }

    #[test]
    fn voluntary_kill_stops_at_stopping() {
        let process = leaf("leaf");
        process.set_state(State::Running);
        process.set_state(State::Killed);
        assert_eq!(process.state(), State::Stopping);

        process.advance(State::Killed);
        process.set_state(State::Running);
        assert_eq!(process.state(), State::Killed);
    }

    #[test]
    fn children_are_kept_in_order() {
        let (handler, _log) = RecordingHandler::new();
        let parent = Process::new(
            "parent",
            handler,
            ProcessList::new(vec![leaf("a"), leaf("b"), leaf("c")]),
        );

        let names: Vec<&str> = parent.children().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(!parent.is_leaf());
    }

    #[tokio::test]
    async fn attach_twice_is_rejected() {
        let process = leaf("once");
        let token = CancellationToken::new();

        assert!(process.attach(4, token.clone()).is_ok());
        match process.attach(4, token) {
            Err(EngineError::AlreadyStarted { process }) => assert_eq!(process, "once"),
            _ => panic!("Expected AlreadyStarted error"),
        }
    }

    #[tokio::test]
    async fn deliver_before_start_is_rejected() {
        let process = leaf("idle");
        let result = process.deliver(Message::start()).await;
        assert!(matches!(result, Err(DispatchError::NotStarted { .. })));
    }

    #[tokio::test]
    async fn deliver_gives_up_on_full_inbox_when_cancelled() {
        let process = leaf("full");
        let token = CancellationToken::new();
        let _attached = process.attach(1, token.clone()).unwrap();

        assert_eq!(process.deliver(Message::start()).await, Ok(true));

        let blocked = {
            let process = process.clone();
            tokio::spawn(async move { process.deliver(Message::stop()).await })
        };
        token.cancel();

        let result = blocked.await.unwrap();
        assert!(matches!(result, Err(DispatchError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn deliver_to_retired_process_reports_false() {
        let process = leaf("gone");
        let attached = process.attach(1, CancellationToken::new()).unwrap();
        drop(attached);

        assert_eq!(process.deliver(Message::start()).await, Ok(false));
    }
}
