// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::engine::process::{Process, State, StateCell};
use crate::errors::DispatchError;
use crate::message::{Message, Payload};
use crate::observability::messages::{process::MessageDropped, StructuredLog};

/// The node a child list belongs to; `None` for the engine's roots.
struct Owner {
    name: Arc<str>,
    state: Arc<StateCell>,
}

/// Ordered sibling group whose only behavior is fan-out.
///
/// ## Delivery guarantees
///
/// [`dispatch`](ProcessList::dispatch) hands the message to every member, one
/// after the other, in list order, and finishes with one member before moving
/// to the next. Because a node has exactly one parent, every member observes
/// its parent's messages in the order they were dispatched.
///
/// ## Backpressure
///
/// Inboxes are bounded. When a member's inbox is full, `dispatch` waits for
/// space, which suspends the dispatching node. The wait always yields to the
/// engine's cancellation token, so a blocked dispatch never stalls shutdown.
pub struct ProcessList<P> {
    members: Vec<Process<P>>,
    owner: Option<Owner>,
}

impl<P> ProcessList<P> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Process<P>> {
        self.members.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Process<P>> {
        self.members.get(index)
    }

    pub(crate) fn set_owner(&mut self, name: Arc<str>, state: Arc<StateCell>) {
        self.owner = Some(Owner { name, state });
    }
}

impl<P: Payload> ProcessList<P> {
    pub fn new(members: Vec<Process<P>>) -> Self {
        Self {
            members,
            owner: None,
        }
    }

    /// The valid terminal-leaf case: dispatch is a no-op.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of nodes in the subtrees rooted at this list's members.
    pub fn count_nodes(&self) -> usize {
        self.members
            .iter()
            .map(|member| 1 + member.children().count_nodes())
            .sum()
    }

    /// Every node reachable from this list, parents before children.
    pub(crate) fn descendants(&self) -> Vec<Process<P>> {
        let mut nodes = Vec::with_capacity(self.count_nodes());
        let mut stack: Vec<&Process<P>> = self.members.iter().rev().collect();
        while let Some(node) = stack.pop() {
            nodes.push(node.clone());
            stack.extend(node.children().iter().rev());
        }
        nodes
    }

    /// Deliver `msg` to every live member, in order.
    ///
    /// Domain messages are refused once the owning node has begun
    /// Stop-handling. Members whose workers have already retired are skipped.
    /// Returns the number of members that accepted the message.
    pub async fn dispatch(&self, mut msg: Message<P>) -> Result<usize, DispatchError> {
        if !msg.is_control() {
            if let Some(owner) = &self.owner {
                if owner.state.load() >= State::Stopping {
                    return Err(DispatchError::OwnerStopping {
                        process: owner.name.to_string(),
                        kind: msg.kind.to_string(),
                    });
                }
            }
        }
        msg.restamp();

        let mut delivered = 0;
        for member in &self.members {
            match member.deliver(msg.clone()).await {
                Ok(true) => delivered += 1,
                Ok(false) => MessageDropped {
                    process: member.name(),
                    kind: msg.kind.as_str(),
                    reason: "process already retired",
                }
                .log(),
                Err(DispatchError::Cancelled { kind, .. }) => {
                    return Err(DispatchError::Cancelled { kind, delivered });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(delivered)
    }
}

impl<P: Payload> Default for ProcessList<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P: Payload> From<Vec<Process<P>>> for ProcessList<P> {
    fn from(members: Vec<Process<P>>) -> Self {
        Self::new(members)
    }
}

impl<P: Payload> FromIterator<Process<P>> for ProcessList<P> {
    fn from_iter<I: IntoIterator<Item = Process<P>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<P> std::fmt::Debug for ProcessList<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessList")
            .field("members", &self.members)
            .field("owner", &self.owner.as_ref().map(|owner| &*owner.name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::stub::{RecordingHandler, TestPayload};
    use tokio_util::sync::CancellationToken;

    fn leaf(name: &str) -> Process<TestPayload> {
        let (handler, _log) = RecordingHandler::new();
        Process::leaf(name, handler)
    }

    fn tree() -> ProcessList<TestPayload> {
        let (root_handler, _log) = RecordingHandler::new();
        let (mid_handler, _log) = RecordingHandler::new();
        ProcessList::new(vec![
            Process::new(
                "root",
                root_handler,
                ProcessList::new(vec![
                    Process::new("mid", mid_handler, ProcessList::new(vec![leaf("deep")])),
                    leaf("side"),
                ]),
            ),
            leaf("second_root"),
        ])
    }

    #[test]
    fn count_nodes_walks_every_level() {
        assert_eq!(tree().count_nodes(), 5);
        assert_eq!(ProcessList::<TestPayload>::empty().count_nodes(), 0);
    }

    #[test]
    fn descendants_are_listed_parents_first() {
        let names: Vec<String> = tree()
            .descendants()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["root", "mid", "deep", "side", "second_root"]);
    }

    #[tokio::test]
    async fn empty_list_dispatch_is_noop() {
        let list = ProcessList::<TestPayload>::empty();
        let delivered = list.dispatch(Message::new(TestPayload::Item(1))).await;
        assert_eq!(delivered, Ok(0));
    }

    #[tokio::test]
    async fn dispatch_reaches_every_member_in_order() {
        let list = ProcessList::new(vec![leaf("a"), leaf("b")]);
        let token = CancellationToken::new();
        let mut inboxes: Vec<_> = list
            .iter()
            .map(|p| p.attach(8, token.clone()).unwrap().inbox)
            .collect();

        for i in 1..=3 {
            let delivered = list.dispatch(Message::new(TestPayload::Item(i))).await;
            assert_eq!(delivered, Ok(2));
        }

        for inbox in inboxes.iter_mut() {
            let mut seen = Vec::new();
            while let Ok(msg) = inbox.try_recv() {
                seen.push(msg.value);
            }
            assert_eq!(
                seen,
                vec![
                    Some(TestPayload::Item(1)),
                    Some(TestPayload::Item(2)),
                    Some(TestPayload::Item(3)),
                ]
            );
        }
    }

    #[tokio::test]
    async fn stopping_owner_cannot_dispatch_domain_messages() {
        let (handler, _log) = RecordingHandler::new();
        let parent = Process::new("parent", handler, ProcessList::new(vec![leaf("child")]));
        let token = CancellationToken::new();
        let _child = parent.children().iter().next().unwrap().attach(8, token).unwrap();

        parent.set_state(State::Killed);

        let result = parent
            .children()
            .dispatch(Message::new(TestPayload::Item(1)))
            .await;
        assert_eq!(
            result,
            Err(DispatchError::OwnerStopping {
                process: "parent".to_string(),
                kind: "Item".to_string(),
            })
        );

        // Control messages still flow so Stop can cascade.
        assert_eq!(parent.children().dispatch(Message::stop()).await, Ok(1));
    }

    #[tokio::test]
    async fn retired_members_are_skipped() {
        let list = ProcessList::new(vec![leaf("gone"), leaf("alive")]);
        let token = CancellationToken::new();
        let gone = list.get(0).unwrap().attach(1, token.clone()).unwrap();
        let mut alive = list.get(1).unwrap().attach(1, token).unwrap();
        drop(gone);

        assert_eq!(list.dispatch(Message::start()).await, Ok(1));
        assert!(alive.inbox.try_recv().unwrap().is_start());
    }

    #[tokio::test]
    async fn cancelled_dispatch_reports_progress() {
        let list = ProcessList::new(vec![leaf("first"), leaf("second")]);
        let token = CancellationToken::new();
        let _first = list.get(0).unwrap().attach(4, token.clone()).unwrap();
        let _second = list.get(1).unwrap().attach(4, token.clone()).unwrap();
        token.cancel();

        match list.dispatch(Message::new(TestPayload::Item(9))).await {
            Err(DispatchError::Cancelled { kind, delivered }) => {
                assert_eq!(kind, "Item");
                assert_eq!(delivered, 0);
            }
            other => panic!("Expected Cancelled error, got {:?}", other),
        }
    }
}
