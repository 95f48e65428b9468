// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reusable handlers.
//!
//! These cover the shapes most trees are built from: a producer at the root
//! ([`SourceHandler`]), pass-through and transforming stages
//! ([`RelayHandler`], [`MapHandler`]). Application-specific handlers implement
//! [`Handler`](crate::traits::Handler) directly.

pub mod map;
pub mod relay;
pub mod source;
pub mod stub;

pub use map::MapHandler;
pub use relay::RelayHandler;
pub use source::SourceHandler;
