//! Backend variants.
//!
//! Each command kind maps to exactly one backend. The backend decides what to
//! spawn and how a kill is delivered.

mod file;
mod manifest;
mod program;
mod shell;
mod stateful;

use std::fmt;

use present_core::Kind;

use crate::{
    archive::Archive,
    error::StartError,
    launch::{LaunchContext, Launched},
    process::StartRequest,
};

/// Verb for manifest executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestVerb {
    Apply,
    Create,
    Delete,
}

impl ManifestVerb {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

/// Verb for stateful executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatefulVerb {
    Apply,
    Destroy,
}

impl StatefulVerb {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Destroy => "destroy",
        }
    }
}

/// The way a command is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Script piped to an interpreter, run in its own process group.
    Shell,
    /// Go sources built in a scratch directory; the binary is run directly.
    CompiledProgram,
    /// `kubectl <verb> -f` on a manifest in a scratch directory.
    ManifestApply(ManifestVerb),
    /// `terraform <verb>` in a persistent per-id directory.
    StatefulApply(StatefulVerb),
    /// Body written to a path; nothing is spawned.
    FileSave,
}

impl BackendKind {
    /// Backend for a command. `None` for `kill` and event kinds.
    #[must_use]
    pub fn for_command(kind: Kind, body: &str) -> Option<Self> {
        let backend = match kind {
            Kind::Run if Archive::looks_like_program(body) => Self::CompiledProgram,
            Kind::Run => Self::Shell,
            Kind::SaveFile => Self::FileSave,
            Kind::KubectlApply => Self::ManifestApply(ManifestVerb::Apply),
            Kind::KubectlCreate => Self::ManifestApply(ManifestVerb::Create),
            Kind::KubectlDelete => Self::ManifestApply(ManifestVerb::Delete),
            Kind::TerraformApply => Self::StatefulApply(StatefulVerb::Apply),
            Kind::TerraformDestroy => Self::StatefulApply(StatefulVerb::Destroy),
            Kind::Kill | Kind::Stdout | Kind::Stderr | Kind::End => return None,
        };
        Some(backend)
    }

    /// Whether a kill signals the child's whole process group.
    #[must_use]
    pub const fn kills_group(self) -> bool {
        matches!(self, Self::Shell)
    }

    pub(crate) async fn launch(
        self,
        ctx: &LaunchContext<'_>,
        request: &StartRequest,
    ) -> Result<Launched, StartError> {
        match self {
            Self::Shell => shell::launch(ctx, request).await,
            Self::CompiledProgram => program::launch(ctx, request).await,
            Self::ManifestApply(verb) => manifest::launch(ctx, request, verb).await,
            Self::StatefulApply(verb) => stateful::launch(ctx, request, verb).await,
            Self::FileSave => file::launch(request).await,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell => f.write_str("shell"),
            Self::CompiledProgram => f.write_str("go"),
            Self::ManifestApply(verb) => write!(f, "kubectl {}", verb.as_str()),
            Self::StatefulApply(verb) => write!(f, "terraform {}", verb.as_str()),
            Self::FileSave => f.write_str("saveFile"),
        }
    }
}
