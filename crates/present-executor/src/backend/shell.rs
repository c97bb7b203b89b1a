//! Shell snippets.

use std::process::Stdio;

use crate::{
    error::StartError,
    launch::{LaunchContext, Launched},
    process::StartRequest,
    shell::{Script, UnixShell, resolve_cd},
};

pub(super) async fn launch(
    ctx: &LaunchContext<'_>,
    request: &StartRequest,
) -> Result<Launched, StartError> {
    let script = Script::parse(&request.body)?;

    let mut working_dir = request.working_dir.clone();
    if let Some(target) = &script.cd {
        let target = target.as_deref().ok_or(StartError::MissingCdTarget)?;
        let resolved = resolve_cd(target, working_dir.as_deref(), ctx.env).await?;
        tracing::debug!(id = %request.id, dir = %resolved.display(), "Changed working directory");
        working_dir = Some(resolved);
    }
    if script.is_empty() {
        return Ok(Launched::completed(working_dir));
    }

    let mut cmd = match &script.shebang {
        Some(shebang) => {
            let mut cmd = ctx.command(&shebang.program, working_dir.as_deref())?;
            cmd.args(&shebang.args);
            cmd
        }
        None => {
            let shell = UnixShell::from_env(ctx.env);
            ctx.command(&shell.path().to_string_lossy(), working_dir.as_deref())?
        }
    };
    cmd.stdin(Stdio::piped());

    let mut running = ctx.spawn(cmd, request.backend.kills_group())?;
    running.feed_stdin(script.text);

    Ok(Launched {
        running: Some(running),
        scratch: None,
        working_dir,
    })
}
