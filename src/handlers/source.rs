// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::{Process, State};
use crate::errors::HandlerError;
use crate::message::{Message, Payload};
use crate::observability::messages::{process::UnknownMessageType, StructuredLog};
use crate::traits::Handler;

/// Producer for the top of a tree.
///
/// On Start it dispatches every item to its children in order, then marks its
/// node as finished so Stop cascades through the subtree behind the last item.
/// Progress is logged in 10% steps.
pub struct SourceHandler<P> {
    items: Vec<P>,
    forward: bool,
}

impl<P: Payload> SourceHandler<P> {
    pub fn new(items: impl IntoIterator<Item = P>) -> Self {
        Self {
            items: items.into_iter().collect(),
            forward: false,
        }
    }

    /// Mark every produced message for delivery to the whole subtree.
    pub fn forwarded(mut self) -> Self {
        self.forward = true;
        self
    }

    async fn produce(&mut self, process: &Process<P>) -> Result<(), HandlerError> {
        let total = self.items.len();
        let step = (total / 10).max(1);
        tracing::info!(process = process.name(), items = total, "[{}] - Producing {} items", process.name(), total);

        for (index, item) in self.items.drain(..).enumerate() {
            if index % step == 0 {
                tracing::debug!(
                    process = process.name(),
                    "[{}] - Producing - {:.0}%",
                    process.name(),
                    index as f64 / total as f64 * 100.0
                );
            }

            let mut msg = Message::new(item);
            msg.forward = self.forward;
            process.children().dispatch(msg).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<P: Payload> Handler<P> for SourceHandler<P> {
    async fn handle(
        &mut self,
        _ctx: &CancellationToken,
        process: &Process<P>,
        msg: Message<P>,
    ) -> Result<(), HandlerError> {
        if msg.is_start() {
            let produced = self.produce(process).await;
            process.set_state(State::Killed);
            return produced;
        }
        if !msg.is_stop() {
            UnknownMessageType {
                process: process.name(),
                kind: msg.kind.as_str(),
            }
            .log();
        }
        Ok(())
    }
}
