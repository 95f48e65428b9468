// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::Process;
use crate::errors::HandlerError;
use crate::message::{Message, MessageType, Payload};
use crate::observability::messages::{process::UnknownMessageType, StructuredLog};
use crate::traits::Handler;

/// Transforming stage.
///
/// Each accepted domain payload is passed to the mapping function; a `Some`
/// result is dispatched to the children as a new message, `None` filters the
/// payload out. Messages whose type is not accepted are logged and dropped.
/// Forwarded messages already travel down the subtree unchanged and are not
/// mapped.
pub struct MapHandler<P, F> {
    accepts: Vec<MessageType>,
    map: F,
    _payload: std::marker::PhantomData<fn(P)>,
}

impl<P, F> MapHandler<P, F>
where
    P: Payload,
    F: FnMut(&P) -> Option<P> + Send,
{
    /// Map every domain message.
    pub fn new(map: F) -> Self {
        Self {
            accepts: Vec::new(),
            map,
            _payload: std::marker::PhantomData,
        }
    }

    /// Restrict the stage to the given message type; may be called repeatedly.
    pub fn accepting(mut self, kind: impl Into<MessageType>) -> Self {
        self.accepts.push(kind.into());
        self
    }

    fn accepts(&self, kind: &MessageType) -> bool {
        self.accepts.is_empty() || self.accepts.contains(kind)
    }
}

#[async_trait]
impl<P, F> Handler<P> for MapHandler<P, F>
where
    P: Payload,
    F: FnMut(&P) -> Option<P> + Send,
{
    async fn handle(
        &mut self,
        _ctx: &CancellationToken,
        process: &Process<P>,
        msg: Message<P>,
    ) -> Result<(), HandlerError> {
        if msg.is_control() || msg.forward {
            return Ok(());
        }
        if !self.accepts(&msg.kind) {
            UnknownMessageType {
                process: process.name(),
                kind: msg.kind.as_str(),
            }
            .log();
            return Ok(());
        }

        let value = msg
            .value
            .as_ref()
            .ok_or_else(|| HandlerError::payload_mismatch(&msg.kind, "a payload"))?;

        if let Some(mapped) = (self.map)(value) {
            process.children().dispatch(Message::new(mapped)).await?;
        }
        Ok(())
    }
}
