//! Start errors.
//!
//! The `Display` text of a `StartError` becomes the body of the execution's
//! `end` event.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure to start an execution.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("executable not found: {0}")]
    NotFound(String),
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    /// A preparatory step (build, tidy, init) exited unsuccessfully.
    #[error("{0}")]
    Exit(String),
    #[error("unable to init terraform: {0}")]
    Init(Box<StartError>),
    #[error("unable to find binary path: {0}")]
    StateRoot(io::Error),
    #[error("executable programs must use \"package main\"")]
    NotExecutable,
    #[error("invalid archive file name: {0:?}")]
    InvalidFileName(String),
    #[error("empty shebang line")]
    EmptyShebang,
    #[error("cd: missing directory operand")]
    MissingCdTarget,
    #[error("cd: {}: {source}", path.display())]
    Chdir { path: PathBuf, source: io::Error },
    #[error("cd: {}: not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("saveFile requires a destination path")]
    MissingPath,
}
