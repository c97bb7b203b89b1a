//! Executor configuration.

use std::path::PathBuf;

use present_core::PipelineConfig;

/// Programs and limits used by the backends.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Go toolchain used to build programs.
    pub go: String,
    /// Cluster CLI for manifest executions.
    pub kubectl: String,
    /// Infrastructure CLI for stateful executions.
    pub terraform: String,
    /// Parent of the per-id terraform directories.
    ///
    /// Defaults to the directory holding the server binary.
    pub state_root: Option<PathBuf>,
    /// Output limiting and batching.
    pub pipeline: PipelineConfig,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            go: "go".into(),
            kubectl: "kubectl".into(),
            terraform: "terraform".into(),
            state_root: None,
            pipeline: PipelineConfig::default(),
        }
    }
}
