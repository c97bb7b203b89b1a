//! kubectl apply/create/delete of a single manifest.

use crate::{
    backend::ManifestVerb,
    error::StartError,
    launch::{LaunchContext, Launched},
    process::StartRequest,
};

const MANIFEST_FILE: &str = "k8s.yml";

pub(super) async fn launch(
    ctx: &LaunchContext<'_>,
    request: &StartRequest,
    verb: ManifestVerb,
) -> Result<Launched, StartError> {
    let scratch = tempfile::Builder::new().prefix("present-kubectl-").tempdir()?;
    tokio::fs::write(scratch.path().join(MANIFEST_FILE), &request.body).await?;

    let mut cmd = ctx.command(&ctx.config.kubectl, Some(scratch.path()))?;
    cmd.args([verb.as_str(), "-f", MANIFEST_FILE]);
    let running = ctx.spawn(cmd, request.backend.kills_group())?;

    Ok(Launched {
        running: Some(running),
        scratch: Some(scratch),
        working_dir: request.working_dir.clone(),
    })
}
