// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stub payloads and handlers for testing trees.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::engine::{Process, State};
use crate::errors::HandlerError;
use crate::message::{Message, MessageType, Payload};
use crate::traits::Handler;

/// Minimal payload with two distinguishable message types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestPayload {
    Item(u64),
    Label(String),
}

impl TestPayload {
    pub const ITEM: MessageType = MessageType::from_static("Item");
    pub const LABEL: MessageType = MessageType::from_static("Label");
}

impl Payload for TestPayload {
    fn message_type(&self) -> MessageType {
        match self {
            TestPayload::Item(_) => Self::ITEM,
            TestPayload::Label(_) => Self::LABEL,
        }
    }
}

/// One call observed by a [`RecordingHandler`].
#[derive(Debug, Clone)]
pub struct Recorded<P> {
    pub kind: MessageType,
    pub value: Option<P>,
    /// Node state when the handler was invoked.
    pub state: State,
}

/// Shared view of everything a [`RecordingHandler`] has seen.
pub struct Recording<P>(Arc<Mutex<Vec<Recorded<P>>>>);

impl<P> Clone for Recording<P> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<P: Clone> Recording<P> {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    fn push(&self, entry: Recorded<P>) {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }

    pub fn entries(&self) -> Vec<Recorded<P>> {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Message type tags in the order they were handled.
    pub fn kinds(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|entry| entry.kind.to_string())
            .collect()
    }

    /// Domain payloads in the order they were handled.
    pub fn values(&self) -> Vec<P> {
        self.entries()
            .into_iter()
            .filter_map(|entry| entry.value)
            .collect()
    }

    pub fn count(&self, kind: &MessageType) -> usize {
        self.entries()
            .iter()
            .filter(|entry| &entry.kind == kind)
            .count()
    }
}

/// Records every call; optionally relays domain messages to its children.
pub struct RecordingHandler<P> {
    recording: Recording<P>,
    relay: bool,
}

impl<P: Payload> RecordingHandler<P> {
    pub fn new() -> (Self, Recording<P>) {
        let recording = Recording::new();
        (
            Self {
                recording: recording.clone(),
                relay: false,
            },
            recording,
        )
    }

    pub fn relaying() -> (Self, Recording<P>) {
        let (mut handler, recording) = Self::new();
        handler.relay = true;
        (handler, recording)
    }
}

#[async_trait]
impl<P: Payload> Handler<P> for RecordingHandler<P> {
    async fn handle(
        &mut self,
        _ctx: &CancellationToken,
        process: &Process<P>,
        msg: Message<P>,
    ) -> Result<(), HandlerError> {
        self.recording.push(Recorded {
            kind: msg.kind.clone(),
            value: msg.value.clone(),
            state: process.state(),
        });
        if self.relay && !msg.is_control() && !msg.forward {
            process.children().dispatch(msg).await?;
        }
        Ok(())
    }
}

/// Records every call and fails on the first domain message.
pub struct FailingHandler<P> {
    recording: Recording<P>,
}

impl<P: Payload> FailingHandler<P> {
    pub fn new() -> (Self, Recording<P>) {
        let recording = Recording::new();
        (
            Self {
                recording: recording.clone(),
            },
            recording,
        )
    }
}

#[async_trait]
impl<P: Payload> Handler<P> for FailingHandler<P> {
    async fn handle(
        &mut self,
        _ctx: &CancellationToken,
        process: &Process<P>,
        msg: Message<P>,
    ) -> Result<(), HandlerError> {
        self.recording.push(Recorded {
            kind: msg.kind.clone(),
            value: msg.value.clone(),
            state: process.state(),
        });
        if msg.is_control() {
            return Ok(());
        }
        Err(HandlerError::payload_mismatch(&msg.kind, "nothing"))
    }
}

/// Panics on the first domain message.
#[derive(Debug, Default)]
pub struct PanickingHandler;

#[async_trait]
impl<P: Payload> Handler<P> for PanickingHandler {
    async fn handle(
        &mut self,
        _ctx: &CancellationToken,
        process: &Process<P>,
        msg: Message<P>,
    ) -> Result<(), HandlerError> {
        if !msg.is_control() {
            panic!("simulated handler panic in '{}'", process.name());
        }
        Ok(())
    }
}

/// Records every call, then holds each domain message until cancellation.
///
/// Stands in for a consumer too slow to keep up, so its parent's dispatches
/// back up against a full inbox.
pub struct StalledHandler<P> {
    recording: Recording<P>,
}

impl<P: Payload> StalledHandler<P> {
    pub fn new() -> (Self, Recording<P>) {
        let recording = Recording::new();
        (
            Self {
                recording: recording.clone(),
            },
            recording,
        )
    }
}

#[async_trait]
impl<P: Payload> Handler<P> for StalledHandler<P> {
    async fn handle(
        &mut self,
        ctx: &CancellationToken,
        process: &Process<P>,
        msg: Message<P>,
    ) -> Result<(), HandlerError> {
        let stall = !msg.is_control();
        self.recording.push(Recorded {
            kind: msg.kind,
            value: msg.value,
            state: process.state(),
        });
        if stall {
            ctx.cancelled().await;
        }
        Ok(())
    }
}
