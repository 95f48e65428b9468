// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // engine options + loader
pub mod engine;     // process tree, fan-out, lifecycle
pub mod errors;     // error handling
pub mod handlers;   // reusable handlers
pub mod message;    // message + type tags
pub mod observability;
pub mod traits;     // handler abstraction

pub use engine::{Engine, EngineHandle, Process, ProcessList, State};
pub use errors::{ConfigError, DispatchError, EngineError, HandlerError};
pub use message::{Message, MessageType, Payload};
pub use traits::Handler;
