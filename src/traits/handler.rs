use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::Process;
use crate::errors::HandlerError;
use crate::message::Message;

/// Reactive capability wrapped by a [`Process`].
///
/// `handle` is called once per inbound message, strictly in the node's
/// delivery order: exactly one Start first, then any domain messages, then
/// exactly one Stop. A handler fans derived work out with
/// `process.children().dispatch(..)` and signals that it has nothing more to
/// produce with `process.set_state(State::Killed)`.
///
/// The handler is owned by its node's worker, so `&mut self` state needs no
/// locking.
#[async_trait]
pub trait Handler<P>: Send {
    async fn handle(
        &mut self,
        ctx: &CancellationToken,
        process: &Process<P>,
        msg: Message<P>,
    ) -> Result<(), HandlerError>;
}
