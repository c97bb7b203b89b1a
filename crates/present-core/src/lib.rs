//! Core building blocks for the presentation execution backend.
//!
//! This crate provides:
//! - `Message` / `Kind` - the JSON wire protocol
//! - `limit` / `batch` - the per-execution output pipeline
//! - `KillSwitch` - the trigger shared by a process and its limiter
//! - `Environment` - injectable process environment

pub mod environment;
pub mod kill;
pub mod message;
pub mod pipeline;

pub use environment::{Environment, FixedEnvironment, SystemEnvironment};
pub use kill::KillSwitch;
pub use message::{ExecOptions, Kind, Message, ProtocolError};
pub use pipeline::{PipelineConfig, batch, limit};
