//! Wire protocol for the execution socket.
//!
//! A `Message` is the only unit exchanged over the connection, one JSON
//! object per frame. Commands flow client to server, events flow back.

use serde::{Deserialize, Serialize};

/// Protocol error.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Message kind.
///
/// Decoding also accepts the backend-neutral names (`applyA`, `destroyB`, ...)
/// for the two infrastructure tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Kind {
    /// Run a shell snippet or compile and run a program.
    Run,
    /// Stop the execution with the message id.
    Kill,
    /// Write the body to `path`.
    SaveFile,
    #[serde(alias = "applyA")]
    KubectlApply,
    #[serde(alias = "createA")]
    KubectlCreate,
    #[serde(alias = "deleteA")]
    KubectlDelete,
    #[serde(alias = "applyB")]
    TerraformApply,
    #[serde(alias = "destroyB")]
    TerraformDestroy,
    /// Standard output chunk.
    Stdout,
    /// Standard error chunk.
    Stderr,
    /// Terminal event of an execution; body is empty or the failure.
    End,
}

impl Kind {
    /// Whether this kind is produced by the server.
    #[must_use]
    pub const fn is_event(self) -> bool {
        matches!(self, Self::Stdout | Self::Stderr | Self::End)
    }

    /// Whether this kind starts a new execution.
    #[must_use]
    pub const fn starts_execution(self) -> bool {
        !self.is_event() && !matches!(self, Self::Kill)
    }
}

/// Backend-specific flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOptions {
    /// Build with the race detector (compiled programs only).
    #[serde(default, alias = "Race")]
    pub race: bool,
}

/// Wire message.
///
/// Field names are lowercase on the wire; the capitalised spellings used by
/// older clients are accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Caller-assigned execution id, echoed on every event.
    #[serde(default, alias = "Id")]
    pub id: String,
    #[serde(alias = "Kind")]
    pub kind: Kind,
    #[serde(default, alias = "Body")]
    pub body: String,
    #[serde(default, alias = "Options", skip_serializing_if = "Option::is_none")]
    pub options: Option<ExecOptions>,
    /// Destination for `saveFile`.
    #[serde(default, alias = "Path", skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl Message {
    /// Create a message with no id, options or path.
    #[must_use]
    pub fn new(kind: Kind, body: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            kind,
            body: body.into(),
            options: None,
            path: String::new(),
        }
    }

    /// Create an output event from raw bytes, replacing invalid UTF-8.
    #[must_use]
    pub fn output(kind: Kind, bytes: &[u8]) -> Self {
        Self::new(kind, String::from_utf8_lossy(bytes))
    }

    /// Create an `end` event. The body carries the failure, if any.
    #[must_use]
    pub fn end(error: Option<&str>) -> Self {
        Self::new(Kind::End, error.unwrap_or_default())
    }

    /// Set the execution id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the backend options.
    #[must_use]
    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the destination path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Encode to a JSON frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON frame.
    ///
    /// # Errors
    /// Returns error if the frame is not a valid message.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }
}
