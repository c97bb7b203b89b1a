//! terraform apply/destroy.
//!
//! Configuration lives in `<state root>/terraform-<id>` instead of a temp
//! directory and is never removed: the state files must survive a server
//! crash so an operator can still run a manual destroy.

use std::path::PathBuf;

use crate::{
    archive::Archive,
    backend::StatefulVerb,
    error::StartError,
    launch::{LaunchContext, Launched},
    process::StartRequest,
};

const ENTRY_FILE: &str = "main.tf";

/// Directory name for an execution id, restricted to `[A-Za-z0-9_-]`.
pub(crate) fn state_dir_name(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("terraform-{safe}")
}

fn state_root(configured: Option<&PathBuf>) -> Result<PathBuf, StartError> {
    if let Some(root) = configured {
        return Ok(root.clone());
    }
    let exe = std::env::current_exe().map_err(StartError::StateRoot)?;
    Ok(exe.parent().map(PathBuf::from).unwrap_or_default())
}

pub(super) async fn launch(
    ctx: &LaunchContext<'_>,
    request: &StartRequest,
    verb: StatefulVerb,
) -> Result<Launched, StartError> {
    let dir = state_root(ctx.config.state_root.as_ref())?.join(state_dir_name(&request.id));
    tokio::fs::create_dir_all(&dir).await?;

    let terraform = &ctx.config.terraform;
    if verb != StatefulVerb::Destroy {
        let mut archive = Archive::parse(&request.body);
        archive.promote_comment(ENTRY_FILE);
        archive.write_to(&dir).await?;

        let mut init = ctx.command(terraform, Some(&dir))?;
        init.arg("init");
        ctx.run(init)
            .await
            .map_err(|e| StartError::Init(Box::new(e)))?;
    }

    // No one can answer a prompt on the other end of the pipe.
    let mut cmd = ctx.command(terraform, Some(&dir))?;
    cmd.args([verb.as_str(), "-auto-approve"]);
    let running = ctx.spawn(cmd, request.backend.kills_group())?;

    Ok(Launched {
        running: Some(running),
        scratch: None,
        working_dir: request.working_dir.clone(),
    })
}
