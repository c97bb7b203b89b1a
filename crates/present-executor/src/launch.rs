//! Spawning children and streaming their output into an execution.

use std::{
    io,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Duration,
};

use command_group::{AsyncCommandGroup, AsyncGroupChild};
use present_core::{Environment, Kind, Message};
use tempfile::TempDir;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, Command},
    sync::mpsc,
    task::JoinHandle,
};

use crate::{config::ExecConfig, error::StartError, shell::resolve_executable};

const READ_CHUNK: usize = 8 * 1024;

/// Handle to a spawned child.
pub(crate) enum ChildHandle {
    /// Leader of its own process group; killing signals the whole group.
    Group(AsyncGroupChild),
    /// Plain child; killing signals only this process.
    Single(Child),
}

impl ChildHandle {
    fn inner(&mut self) -> &mut Child {
        match self {
            Self::Group(child) => child.inner(),
            Self::Single(child) => child,
        }
    }

    pub(crate) async fn wait(&mut self) -> io::Result<ExitStatus> {
        match self {
            Self::Group(child) => child.wait().await,
            Self::Single(child) => child.wait().await,
        }
    }

    pub(crate) fn start_kill(&mut self) -> io::Result<()> {
        match self {
            Self::Group(child) => child.start_kill(),
            Self::Single(child) => child.start_kill(),
        }
    }
}

/// A spawned child plus the tasks copying its output.
pub(crate) struct Running {
    pub(crate) child: ChildHandle,
    pub(crate) readers: Vec<JoinHandle<()>>,
}

impl Running {
    /// Feed `input` to the child's stdin, then close it.
    pub(crate) fn feed_stdin(&mut self, input: String) {
        let Some(mut stdin) = self.child.inner().stdin.take() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                tracing::debug!("Failed to write script to stdin: {e}");
            }
        });
    }

    /// Wait for the child and for its output to be fully forwarded.
    pub(crate) async fn finish(mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait().await;
        self.drain().await;
        status
    }

    /// Wait for every output reader to finish.
    ///
    /// Cancel safe: readers not yet finished stay in place.
    pub(crate) async fn drain(&mut self) {
        while let Some(reader) = self.readers.last_mut() {
            let _ = reader.await;
            self.readers.pop();
        }
    }

    /// Like [`Running::drain`], but abandons readers still blocked after
    /// `grace`. Descendants outside the killed group may hold the pipes open.
    pub(crate) async fn drain_within(&mut self, grace: Duration) {
        if tokio::time::timeout(grace, self.drain()).await.is_err() {
            tracing::debug!(readers = self.readers.len(), "Abandoning blocked output readers");
            for reader in self.readers.drain(..) {
                reader.abort();
            }
        }
    }

    /// Send SIGKILL to the child, or to its whole group for group leaders.
    ///
    /// Still reaches the group after the leader itself has exited.
    pub(crate) fn signal_kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}

/// What a backend leaves behind once started.
pub(crate) struct Launched {
    /// `None` when the execution completed without spawning anything.
    pub(crate) running: Option<Running>,
    /// Removed when the execution completes.
    pub(crate) scratch: Option<TempDir>,
    /// Carried to the next execution under the same id.
    pub(crate) working_dir: Option<PathBuf>,
}

impl Launched {
    pub(crate) const fn completed(working_dir: Option<PathBuf>) -> Self {
        Self {
            running: None,
            scratch: None,
            working_dir,
        }
    }
}

/// Everything a backend needs to start.
pub(crate) struct LaunchContext<'a> {
    pub(crate) env: &'a dyn Environment,
    pub(crate) config: &'a ExecConfig,
    out: mpsc::Sender<Message>,
}

impl<'a> LaunchContext<'a> {
    pub(crate) const fn new(
        env: &'a dyn Environment,
        config: &'a ExecConfig,
        out: mpsc::Sender<Message>,
    ) -> Self {
        Self { env, config, out }
    }

    /// Build a command with the injected environment and piped output.
    pub(crate) fn command(&self, program: &str, dir: Option<&Path>) -> Result<Command, StartError> {
        let executable = resolve_executable(program, self.env, dir)?;
        let mut cmd = Command::new(executable);
        cmd.env_clear()
            .envs(self.env.vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }

    /// Send an event into the execution's output.
    pub(crate) async fn emit(&self, msg: Message) {
        let _ = self.out.send(msg).await;
    }

    /// Spawn `cmd`, optionally as its own process group, and start copying
    /// its stdout and stderr into the execution's output.
    pub(crate) fn spawn(&self, mut cmd: Command, group: bool) -> Result<Running, StartError> {
        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        let spawned = if group {
            cmd.group_spawn().map(ChildHandle::Group)
        } else {
            cmd.spawn().map(ChildHandle::Single)
        };
        let mut child = spawned.map_err(|source| StartError::Spawn { program, source })?;

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.inner().stdout.take() {
            readers.push(self.forward(stdout, Kind::Stdout));
        }
        if let Some(stderr) = child.inner().stderr.take() {
            readers.push(self.forward(stderr, Kind::Stderr));
        }
        Ok(Running { child, readers })
    }

    /// Run a preparatory command to completion, streaming its output.
    pub(crate) async fn run(&self, cmd: Command) -> Result<(), StartError> {
        let status = self.spawn(cmd, false)?.finish().await?;
        match describe_exit(status) {
            None => Ok(()),
            Some(failure) => Err(StartError::Exit(failure)),
        }
    }

    fn forward<R>(&self, mut reader: R, kind: Kind) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let out = self.out.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; READ_CHUNK];
            // Bytes of a character split across reads.
            let mut pending = Vec::new();
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        pending.extend_from_slice(&buf[..n]);
                        let cut = utf8_boundary(&pending);
                        if cut == 0 {
                            continue;
                        }
                        let chunk: Vec<u8> = pending.drain(..cut).collect();
                        if out.send(Message::output(kind, &chunk)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(?kind, "Output read failed: {e}");
                        break;
                    }
                }
            }
            if !pending.is_empty() {
                let _ = out.send(Message::output(kind, &pending)).await;
            }
        })
    }
}

/// Length of the prefix of `bytes` that does not end in a truncated UTF-8
/// sequence. Invalid bytes elsewhere are left for lossy decoding.
fn utf8_boundary(bytes: &[u8]) -> usize {
    match std::str::from_utf8(bytes) {
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        _ => bytes.len(),
    }
}

/// Describe an unsuccessful exit; `None` on success.
pub(crate) fn describe_exit(status: ExitStatus) -> Option<String> {
    if status.success() {
        return None;
    }
    if let Some(code) = status.code() {
        return Some(format!("exit status {code}"));
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            let name = match signal {
                2 => "interrupt".to_string(),
                9 => "killed".to_string(),
                15 => "terminated".to_string(),
                other => other.to_string(),
            };
            return Some(format!("signal: {name}"));
        }
    }
    Some(status.to_string())
}
