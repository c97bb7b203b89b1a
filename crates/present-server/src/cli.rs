//! Command line configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use present_executor::ExecConfig;

/// Serve a presentation folder with a WebSocket for code execution.
#[derive(Debug, Parser)]
#[command(name = "present-server", version)]
pub struct Cli {
    /// Path to the folder containing static assets
    #[arg(long)]
    pub folder: PathBuf,

    /// Address to serve on
    #[arg(long, default_value = "localhost:8080")]
    pub address: String,

    /// Go toolchain used to build programs
    #[arg(long, default_value = "go")]
    pub go: String,

    /// Cluster CLI used for manifests and CRD lookups
    #[arg(long, default_value = "kubectl")]
    pub kubectl: String,

    /// Infrastructure CLI used for stateful applies
    #[arg(long, default_value = "terraform")]
    pub terraform: String,

    /// Directory holding per-id terraform state [default: next to this binary]
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}

impl Cli {
    /// Executor configuration for these arguments.
    #[must_use]
    pub fn exec_config(&self) -> ExecConfig {
        ExecConfig {
            go: self.go.clone(),
            kubectl: self.kubectl.clone(),
            terraform: self.terraform.clone(),
            state_root: self.state_dir.clone(),
            ..ExecConfig::default()
        }
    }
}

/// Validate that `path` is an existing directory and return its absolute form.
///
/// # Errors
/// Returns error if `path` is empty, missing or not a directory.
pub fn static_root(path: &Path) -> anyhow::Result<PathBuf> {
    if path.as_os_str().is_empty() {
        bail!("path cannot be empty");
    }
    let absolute = path
        .canonicalize()
        .with_context(|| format!("unable to resolve {}", path.display()))?;
    if !absolute.is_dir() {
        bail!("path must be a directory: {:?}", path);
    }
    Ok(absolute)
}
