// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Messages flowing through a process tree.
//!
//! A [`Message`] pairs an open [`MessageType`] tag with an optional payload of
//! the application's payload type `P`. Two tags are reserved for the engine's
//! control protocol ([`MessageType::START`] and [`MessageType::STOP`]) and never
//! carry a payload; every other tag belongs to the handlers.
//!
//! Payloads are modelled as a sum type owned by the application. Handlers
//! pattern-match on the variants they understand instead of downcasting, and
//! the [`Payload`] trait maps each variant back to its tag.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

/// Open, string-like tag identifying the schema of a message payload.
///
/// The tag space is extensible: handlers declare their own tags with
/// [`MessageType::from_static`] without touching the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(Cow<'static, str>);

impl MessageType {
    /// Control tag delivered once to every node before any domain message.
    pub const START: MessageType = MessageType::from_static("Start");
    /// Control tag delivered once to every node after its last domain message.
    pub const STOP: MessageType = MessageType::from_static("Stop");

    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the reserved Start/Stop tags.
    pub fn is_control(&self) -> bool {
        *self == Self::START || *self == Self::STOP
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for MessageType {
    fn from(tag: &'static str) -> Self {
        Self::from_static(tag)
    }
}

impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

/// Application payload carried by domain messages.
///
/// Implemented by the application's payload enum. `Clone` is required because
/// fan-out hands every sibling its own copy.
pub trait Payload: Clone + Send + Sync + 'static {
    /// Tag describing this payload's schema.
    fn message_type(&self) -> MessageType;
}

/// Immutable unit of data flowing through the tree.
#[derive(Debug, Clone)]
pub struct Message<P> {
    pub kind: MessageType,
    /// Stamped at construction and re-stamped on every dispatch.
    pub timestamp: SystemTime,
    /// `None` for control messages.
    pub value: Option<P>,
    /// When set, the engine re-dispatches the message to the receiver's
    /// children after its handler has processed it, so it reaches the whole
    /// subtree below the first receiver.
    ///
    /// The engine owns delivery of a forwarded message: handlers observe it
    /// but must not dispatch it (or anything derived from it) to their
    /// children themselves, or every node below receives it twice.
    pub forward: bool,
}

impl<P> Message<P> {
    pub fn start() -> Self {
        Self::control(MessageType::START)
    }

    pub fn stop() -> Self {
        Self::control(MessageType::STOP)
    }

    fn control(kind: MessageType) -> Self {
        Self {
            kind,
            timestamp: SystemTime::now(),
            value: None,
            forward: false,
        }
    }

    /// Domain message with an explicit tag.
    ///
    /// Reserved tags are rejected here so a payload can never masquerade as
    /// a control message.
    pub fn with_type(kind: MessageType, value: P) -> Option<Self> {
        if kind.is_control() {
            return None;
        }
        Some(Self {
            kind,
            timestamp: SystemTime::now(),
            value: Some(value),
            forward: false,
        })
    }

    /// Marks the message for delivery to the whole subtree.
    pub fn forwarded(mut self) -> Self {
        self.forward = true;
        self
    }

    pub fn is_start(&self) -> bool {
        self.kind == MessageType::START
    }

    pub fn is_stop(&self) -> bool {
        self.kind == MessageType::STOP
    }

    pub fn is_control(&self) -> bool {
        self.kind.is_control()
    }

    pub(crate) fn restamp(&mut self) {
        self.timestamp = SystemTime::now();
    }
}

impl<P: Payload> Message<P> {
    /// Domain message whose tag is derived from the payload.
    pub fn new(value: P) -> Self {
        Self {
            kind: value.message_type(),
            timestamp: SystemTime::now(),
            value: Some(value),
            forward: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Sample {
        Number(u64),
    }

    impl Payload for Sample {
        fn message_type(&self) -> MessageType {
            match self {
                Sample::Number(_) => MessageType::from_static("Number"),
            }
        }
    }

    #[test]
    fn control_messages_carry_no_value() {
        let start = Message::<Sample>::start();
        let stop = Message::<Sample>::stop();

        assert!(start.is_start() && start.is_control());
        assert!(stop.is_stop() && stop.is_control());
        assert!(start.value.is_none());
        assert!(stop.value.is_none());
        assert!(!start.forward);
    }

    #[test]
    fn domain_message_takes_tag_from_payload() {
        let msg = Message::new(Sample::Number(7));

        assert_eq!(msg.kind.as_str(), "Number");
        assert_eq!(msg.value, Some(Sample::Number(7)));
        assert!(!msg.is_control());
    }

    #[test]
    fn reserved_tags_are_rejected_for_payloads() {
        assert!(Message::with_type(MessageType::STOP, Sample::Number(1)).is_none());
        assert!(Message::with_type(MessageType::from("Start"), Sample::Number(1)).is_none());

        let custom = Message::with_type(MessageType::new("Custom"), Sample::Number(1)).unwrap();
        assert_eq!(custom.kind.to_string(), "Custom");
    }

    #[test]
    fn owned_and_static_tags_compare_equal() {
        assert_eq!(MessageType::new("Prime"), MessageType::from_static("Prime"));
        assert_ne!(MessageType::new("Prime"), MessageType::START);
    }

    #[test]
    fn forwarded_sets_flag() {
        let msg = Message::new(Sample::Number(3)).forwarded();
        assert!(msg.forward);
    }
}
