//! Custom resource introspection through the cluster CLI.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use present_core::Environment;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// Cluster CLI error.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{status}: {output}")]
    Exit { status: String, output: String },
    #[error("Unexpected CLI output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read access to custom resource definitions.
#[async_trait]
pub trait ClusterCli: Send + Sync + Debug {
    /// Raw JSON listing of every custom resource definition.
    async fn list_definitions(&self) -> Result<Vec<u8>, ClusterError>;

    /// Raw JSON of a single custom resource definition.
    async fn get_definition(&self, name: &str) -> Result<Vec<u8>, ClusterError>;
}

/// `kubectl`-backed [`ClusterCli`].
#[derive(Debug, Clone)]
pub struct KubectlCli {
    program: String,
    env: Arc<dyn Environment>,
}

impl KubectlCli {
    /// Run `program` with the variables of `env`.
    #[must_use]
    pub fn new(program: impl Into<String>, env: Arc<dyn Environment>) -> Self {
        Self {
            program: program.into(),
            env,
        }
    }

    async fn exec(&self, args: &[&str]) -> Result<Vec<u8>, ClusterError> {
        tracing::debug!(program = %self.program, ?args, "Querying cluster");
        let output = Command::new(&self.program)
            .args(args)
            .env_clear()
            .envs(self.env.vars())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ClusterError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(ClusterError::Exit {
                status: output.status.to_string(),
                output: text.trim_end().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl ClusterCli for KubectlCli {
    async fn list_definitions(&self) -> Result<Vec<u8>, ClusterError> {
        self.exec(&["get", "crd", "-o", "json"]).await
    }

    async fn get_definition(&self, name: &str) -> Result<Vec<u8>, ClusterError> {
        self.exec(&["get", "crd", name, "-o", "json"]).await
    }
}

#[derive(Debug, Deserialize)]
struct DefinitionList {
    #[serde(default)]
    items: Vec<Definition>,
}

#[derive(Debug, Deserialize)]
struct Definition {
    metadata: Metadata,
    #[serde(default)]
    spec: DefinitionSpec,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct DefinitionSpec {
    #[serde(default)]
    versions: Vec<Version>,
}

#[derive(Debug, Deserialize)]
struct Version {
    name: String,
    #[serde(default)]
    schema: Schema,
}

#[derive(Debug, Default, Deserialize)]
struct Schema {
    #[serde(rename = "openAPIV3Schema", default)]
    open_api_v3_schema: OpenApiSchema,
}

#[derive(Debug, Default, Deserialize)]
struct OpenApiSchema {
    #[serde(default)]
    properties: serde_json::Value,
}

/// Summary of a custom resource definition's first version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionDetails {
    pub version: String,
    /// The version's `openAPIV3Schema.properties`.
    pub spec: serde_json::Value,
}

/// Names of all definitions in a `get crd -o json` listing.
///
/// # Errors
/// Returns error if the listing is not valid JSON of the expected shape.
pub fn definition_names(listing: &[u8]) -> Result<Vec<String>, ClusterError> {
    let list: DefinitionList = serde_json::from_slice(listing)?;
    Ok(list.items.into_iter().map(|d| d.metadata.name).collect())
}

/// Details of a single definition; `None` if it declares no versions.
///
/// # Errors
/// Returns error if the definition is not valid JSON of the expected shape.
pub fn definition_details(definition: &[u8]) -> Result<Option<DefinitionDetails>, ClusterError> {
    let definition: Definition = serde_json::from_slice(definition)?;
    Ok(definition
        .spec
        .versions
        .into_iter()
        .next()
        .map(|v| DefinitionDetails {
            version: v.name,
            spec: v.schema.open_api_v3_schema.properties,
        }))
}
