// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The reactive loop every node runs.
//!
//! A worker consumes its node's inbox until the first of three triggers:
//! its handler voluntarily moves the node to Stopping, the shared cancellation
//! token fires, or Stop arrives from the parent. It then runs Stop-handling
//! exactly once, cascades Stop to its children, and retires the node.
//!
//! [`supervise`] wraps the worker in a recovery boundary: a panicking handler
//! is logged, its node is retired, and Stop still reaches its children so one
//! failing node cannot stall the rest of the tree.

use std::any::Any;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::engine::process::{Attached, Process, State};
use crate::errors::{DispatchError, HandlerError};
use crate::message::{Message, Payload};
use crate::observability::messages::process::{
    HandlerFailed, MessageDropped, ProcessKilled, ProcessPanicked, ProcessStarted,
    ProcessStopping,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Handler;

/// What ended a node's domain work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopTrigger {
    /// The handler called `set_state(State::Killed)`.
    Completed,
    Cancelled,
    ParentStop,
    /// Every sender is gone; nothing more can arrive.
    InboxClosed,
    HandlerFailed,
}

impl StopTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            StopTrigger::Completed => "completed",
            StopTrigger::Cancelled => "cancelled",
            StopTrigger::ParentStop => "parent stop",
            StopTrigger::InboxClosed => "inbox closed",
            StopTrigger::HandlerFailed => "handler failed",
        }
    }
}

pub(crate) struct Worker<P> {
    process: Process<P>,
    handler: Box<dyn Handler<P>>,
    inbox: mpsc::Receiver<Message<P>>,
    token: CancellationToken,
    started: bool,
    handled: u64,
    dropped: u64,
}

impl<P: Payload> Worker<P> {
    pub(crate) fn new(process: Process<P>, attached: Attached<P>, token: CancellationToken) -> Self {
        Self {
            process,
            handler: attached.handler,
            inbox: attached.inbox,
            token,
            started: false,
            handled: 0,
            dropped: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        let trigger = self.receive().await;
        self.shutdown(trigger).await;
    }

    async fn receive(&mut self) -> StopTrigger {
        loop {
            if self.process.state() >= State::Stopping {
                return StopTrigger::Completed;
            }

            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return StopTrigger::Cancelled,
                next = self.inbox.recv() => next,
            };
            let Some(msg) = next else {
                return StopTrigger::InboxClosed;
            };

            if msg.is_stop() {
                return StopTrigger::ParentStop;
            }

            if msg.is_start() {
                if self.started {
                    self.drop_message(&msg, "duplicate Start");
                    continue;
                }
                self.started = true;
                self.process.advance(State::Running);
                ProcessStarted {
                    process: self.process.name(),
                    children: self.process.children().len(),
                }
                .log();

                // Children must see Start ahead of anything this handler emits.
                if let Err(e) = self.process.children().dispatch(Message::start()).await {
                    tracing::debug!(process = self.process.name(), error = %e, "Start cascade interrupted");
                }
                if let Err(trigger) = self.invoke(msg).await {
                    return trigger;
                }
                continue;
            }

            if !self.started {
                self.drop_message(&msg, "received before Start");
                continue;
            }

            let forward = msg.forward.then(|| msg.clone());
            if let Err(trigger) = self.invoke(msg).await {
                return trigger;
            }
            if let Some(forward) = forward {
                if let Err(e) = self.process.children().dispatch(forward).await {
                    tracing::debug!(process = self.process.name(), error = %e, "Forward interrupted");
                }
            }
        }
    }

    /// Run the handler on a Start or domain message.
    async fn invoke(&mut self, msg: Message<P>) -> Result<(), StopTrigger> {
        let kind = msg.kind.clone();
        self.handled += 1;

        match self.handler.handle(&self.token, &self.process, msg).await {
            Ok(()) => Ok(()),
            Err(_) if self.token.is_cancelled() => Err(StopTrigger::Cancelled),
            Err(e) => {
                HandlerFailed {
                    process: self.process.name(),
                    kind: kind.as_str(),
                    error: &e,
                }
                .log();
                Err(StopTrigger::HandlerFailed)
            }
        }
    }

    async fn shutdown(mut self, trigger: StopTrigger) {
        self.process.advance(State::Stopping);
        ProcessStopping {
            process: self.process.name(),
            trigger: trigger.as_str(),
        }
        .log();

        // Nothing queued from here on reaches the handler; closing also
        // releases a parent blocked on a full inbox.
        self.inbox.close();

        if self.started {
            self.handled += 1;
            if let Err(e) = self
                .handler
                .handle(&self.token, &self.process, Message::stop())
                .await
            {
                log_stop_failure(&self.process, &e);
            }
        } else {
            self.drop_message(&Message::stop(), "process never started");
        }

        while let Ok(msg) = self.inbox.try_recv() {
            self.drop_message(&msg, "process stopping");
        }

        if let Err(e) = self.process.children().dispatch(Message::stop()).await {
            tracing::debug!(process = self.process.name(), error = %e, "Stop cascade interrupted");
        }

        self.process.advance(State::Killed);
        ProcessKilled {
            process: self.process.name(),
            handled: self.handled,
            dropped: self.dropped,
        }
        .log();
    }

    fn drop_message(&mut self, msg: &Message<P>, reason: &str) {
        self.dropped += 1;
        MessageDropped {
            process: self.process.name(),
            kind: msg.kind.as_str(),
            reason,
        }
        .log();
    }
}

fn log_stop_failure<P: Payload>(process: &Process<P>, error: &HandlerError) {
    if matches!(error, HandlerError::Dispatch(DispatchError::Cancelled { .. })) {
        tracing::debug!(process = process.name(), error = %error, "Stop-handling cut short by cancellation");
        return;
    }
    HandlerFailed {
        process: process.name(),
        kind: "Stop",
        error,
    }
    .log();
}

/// Run `worker` to completion behind a panic boundary.
pub(crate) async fn supervise<P: Payload>(worker: Worker<P>) {
    let process = worker.process.clone();
    let span = ProcessStarted {
        process: process.name(),
        children: process.children().len(),
    }
    .span("worker");

    let Err(e) = tokio::spawn(worker.run().instrument(span)).await else {
        return;
    };

    let panic = if e.is_panic() {
        panic_message(e.into_panic())
    } else {
        e.to_string()
    };
    ProcessPanicked {
        process: process.name(),
        panic: &panic,
    }
    .log();

    process.advance(State::Stopping);
    if let Err(e) = process.children().dispatch(Message::stop()).await {
        tracing::debug!(process = process.name(), error = %e, "Stop cascade interrupted");
    }
    process.advance(State::Killed);
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::engine::{Engine, ProcessList};
    use crate::handlers::stub::{RecordingHandler, TestPayload};
    use crate::handlers::SourceHandler;
    use crate::message::MessageType;

    /// Re-sends Start to its children ahead of every domain message it relays.
    struct RestartingHandler;

    #[async_trait]
    impl Handler<TestPayload> for RestartingHandler {
        async fn handle(
            &mut self,
            _ctx: &CancellationToken,
            process: &Process<TestPayload>,
            msg: Message<TestPayload>,
        ) -> Result<(), HandlerError> {
            if !msg.is_control() {
                process.children().dispatch(Message::start()).await?;
                process.children().dispatch(msg).await?;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn stray_and_duplicate_starts_never_reach_the_handler() {
        let (handler, log) = RecordingHandler::new();
        let process = Process::leaf("leaf", handler);
        let token = CancellationToken::new();
        let attached = process.attach(8, token.clone()).unwrap();

        for msg in [
            Message::new(TestPayload::Item(1)),
            Message::start(),
            Message::start(),
            Message::new(TestPayload::Item(2)),
            Message::stop(),
        ] {
            assert_eq!(process.deliver(msg).await, Ok(true));
        }

        Worker::new(process.clone(), attached, token).run().await;

        assert_eq!(log.kinds(), vec!["Start", "Item", "Stop"]);
        assert_eq!(log.values(), vec![TestPayload::Item(2)]);
        assert_eq!(process.state(), State::Killed);
    }

    #[tokio::test]
    async fn start_dispatched_by_a_handler_is_dropped_downstream() {
        let (leaf_handler, leaf_log) = RecordingHandler::new();
        let engine = Engine::new(
            CancellationToken::new(),
            ProcessList::new(vec![Process::new(
                "root",
                SourceHandler::new(vec![TestPayload::Item(1), TestPayload::Item(2)]),
                ProcessList::new(vec![Process::new(
                    "restarting",
                    RestartingHandler,
                    ProcessList::new(vec![Process::leaf("leaf", leaf_handler)]),
                )]),
            )]),
        );

        tokio::time::timeout(std::time::Duration::from_secs(5), engine.run())
            .await
            .expect("engine did not finish in time")
            .unwrap();

        assert_eq!(leaf_log.count(&MessageType::START), 1);
        assert_eq!(leaf_log.kinds(), vec!["Start", "Item", "Item", "Stop"]);
    }

    #[test]
    fn panic_message_extracts_strings() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(42_u8)), "non-string panic payload");
    }

    #[test]
    fn triggers_have_readable_names() {
        assert_eq!(StopTrigger::ParentStop.as_str(), "parent stop");
        assert_eq!(StopTrigger::Cancelled.as_str(), "cancelled");
    }
}
