// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::Process;
use crate::errors::HandlerError;
use crate::message::{Message, Payload};
use crate::traits::Handler;

/// Pass-through stage: every domain message is dispatched unchanged to the
/// node's children. Forwarded messages are left to the engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelayHandler;

impl RelayHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<P: Payload> Handler<P> for RelayHandler {
    async fn handle(
        &mut self,
        _ctx: &CancellationToken,
        process: &Process<P>,
        msg: Message<P>,
    ) -> Result<(), HandlerError> {
        if msg.is_control() || msg.forward {
            return Ok(());
        }
        process.children().dispatch(msg).await?;
        Ok(())
    }
}
