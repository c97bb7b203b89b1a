//! Compiled Go programs.
//!
//! The sources are built with `go build` and the resulting binary is exec'd
//! directly, so the process handle belongs to the user's program rather than
//! to the go tool and a kill actually stops it.

use present_core::{Kind, Message};

use crate::{
    archive::Archive,
    error::StartError,
    launch::{LaunchContext, Launched},
    process::StartRequest,
};

const ENTRY_FILE: &str = "prog.go";

pub(super) async fn launch(
    ctx: &LaunchContext<'_>,
    request: &StartRequest,
) -> Result<Launched, StartError> {
    let scratch = tempfile::Builder::new().prefix("present-").tempdir()?;
    let dir = scratch.path();
    let bin = dir.join(if cfg!(windows) { "prog.exe" } else { "prog" });

    let mut archive = Archive::parse(&request.body);
    archive.promote_comment(ENTRY_FILE);
    archive.write_to(dir).await?;

    let go = &ctx.config.go;
    let mut build = ctx.command(go, Some(dir))?;
    build.args(["build", "-tags", "OMIT"]);
    if request.options.race {
        ctx.emit(Message::new(Kind::Stderr, "Running with race detector.\n"))
            .await;
        build.arg("-race");
    }
    build.arg("-o").arg(&bin);

    if archive.contains("go.mod") {
        let mut tidy = ctx.command(go, Some(dir))?;
        tidy.args(["mod", "tidy"]);
        ctx.run(tidy).await?;
    } else {
        build.env("GO111MODULE", "off");
    }
    ctx.run(build).await?;

    let mut run = ctx.command(&bin.to_string_lossy(), None)?;
    if request.options.race {
        run.env("GOMAXPROCS", "2");
    }
    let running = match ctx.spawn(run, request.backend.kills_group()) {
        Ok(running) => running,
        // A library package builds fine but leaves nothing executable.
        Err(_) if !archive.declares_main() => return Err(StartError::NotExecutable),
        Err(err) => return Err(err),
    };

    Ok(Launched {
        running: Some(running),
        scratch: Some(scratch),
        working_dir: request.working_dir.clone(),
    })
}
