//! Process orchestration for the presentation execution backend.
//!
//! Provides:
//! - `Orchestrator` - start executions and wire them to the output pipeline
//! - `Process` - handle to one execution, with blocking `kill`
//! - `BackendKind` - shell, compiled program, kubectl, terraform, file save
//! - Archive and shell helpers used by the backends

pub mod archive;
pub mod backend;
pub mod config;
pub mod error;
mod launch;
pub mod process;
pub mod shell;

pub use archive::Archive;
pub use backend::{BackendKind, ManifestVerb, StatefulVerb};
pub use config::ExecConfig;
pub use error::StartError;
pub use process::{Orchestrator, Process, StartRequest};
