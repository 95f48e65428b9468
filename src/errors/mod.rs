// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod dispatch;
mod engine;
mod handler;

pub use config::ConfigError;
pub use dispatch::DispatchError;
pub use engine::EngineError;
pub use handler::HandlerError;
