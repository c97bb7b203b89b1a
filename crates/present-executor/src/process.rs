//! Execution lifecycle.
//!
//! Every execution gets three kinds of tasks:
//! - one reader per piped stream, copying output into the raw channel
//! - a completion task that owns the child and scratch directory, waits for
//!   exit (or a kill request) and emits the single `end` event
//! - a drain task that runs the raw channel through the limiter and batcher,
//!   tags events with the id and forwards them; it sets the done signal once
//!   `end` has been handed over
//!
//! `Process::kill` waits for that done signal, so once it returns the `end`
//! of the old execution is already queued ahead of anything a replacement
//! execution under the same id will produce.

use std::{path::PathBuf, sync::Arc, time::Duration};

use futures::StreamExt;
use present_core::{Environment, ExecOptions, KillSwitch, Message, PipelineConfig, batch, limit};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    backend::BackendKind,
    config::ExecConfig,
    launch::{LaunchContext, Launched, Running, describe_exit},
};

/// Capacity of the channel between output readers and the pipeline.
const RAW_CAPACITY: usize = 64;

/// How long output readers may keep running after a kill.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// `end` body of an execution killed after its leader already exited.
const KILLED: &str = "signal: killed";

/// Everything needed to start one execution.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub id: String,
    pub backend: BackendKind,
    pub body: String,
    pub options: ExecOptions,
    /// Destination for file saves.
    pub path: String,
    /// Working directory carried over from the previous execution.
    pub working_dir: Option<PathBuf>,
}

impl StartRequest {
    /// Build from a command message. `None` for `kill` and event kinds.
    #[must_use]
    pub fn from_message(msg: Message, working_dir: Option<PathBuf>) -> Option<Self> {
        let backend = BackendKind::for_command(msg.kind, &msg.body)?;
        Some(Self {
            id: msg.id,
            backend,
            body: msg.body,
            options: msg.options.unwrap_or_default(),
            path: msg.path,
            working_dir,
        })
    }
}

/// Handle to a started execution.
#[derive(Debug)]
pub struct Process {
    id: String,
    backend: BackendKind,
    working_dir: Option<PathBuf>,
    switch: KillSwitch,
    done: watch::Receiver<bool>,
}

impl Process {
    /// Execution id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Backend running this execution.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Working directory to seed the next execution under this id.
    #[must_use]
    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Consume the handle, keeping only its working directory.
    #[must_use]
    pub fn into_working_dir(self) -> Option<PathBuf> {
        self.working_dir
    }

    /// Whether the `end` event has been delivered.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        *self.done.borrow() || self.done.has_changed().is_err()
    }

    /// Wait until the `end` event has been delivered.
    pub async fn wait(&self) {
        let mut done = self.done.clone();
        // An error means the drain task is gone, which is just as final.
        let _ = done.wait_for(|finished| *finished).await;
    }

    /// Stop the execution and wait until it has fully completed.
    ///
    /// A no-op on a finished process.
    pub async fn kill(&self) {
        if self.is_finished() {
            return;
        }
        tracing::debug!(id = %self.id, backend = %self.backend, "Killing process");
        self.switch.trigger();
        self.wait().await;
    }
}

/// Starts executions.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    env: Arc<dyn Environment>,
    config: Arc<ExecConfig>,
}

impl Orchestrator {
    /// Create an orchestrator spawning children with `env`.
    #[must_use]
    pub fn new(env: Arc<dyn Environment>, config: ExecConfig) -> Self {
        Self {
            env,
            config: Arc::new(config),
        }
    }

    /// Executor configuration.
    #[must_use]
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Start an execution, sending its tagged events to `dest`.
    ///
    /// If the backend fails to start, the failure is delivered as the `end`
    /// event before this returns, and `None` is returned.
    pub async fn start(
        &self,
        request: StartRequest,
        dest: mpsc::Sender<Message>,
    ) -> Option<Process> {
        let switch = KillSwitch::new();
        let (raw_tx, raw_rx) = mpsc::channel(RAW_CAPACITY);
        let done = spawn_drain(
            request.id.clone(),
            raw_rx,
            dest,
            self.config.pipeline,
            switch.clone(),
        );

        let ctx = LaunchContext::new(self.env.as_ref(), &self.config, raw_tx.clone());
        match request.backend.launch(&ctx, &request).await {
            Ok(launched) => {
                let working_dir = launched.working_dir.clone();
                tokio::spawn(complete(
                    request.id.clone(),
                    launched,
                    switch.clone(),
                    raw_tx,
                ));
                Some(Process {
                    id: request.id,
                    backend: request.backend,
                    working_dir,
                    switch,
                    done,
                })
            }
            Err(err) => {
                tracing::warn!(
                    id = %request.id,
                    backend = %request.backend,
                    "Failed to start: {err}"
                );
                let _ = raw_tx.send(Message::end(Some(&err.to_string()))).await;
                drop(raw_tx);
                let mut done = done;
                let _ = done.wait_for(|finished| *finished).await;
                None
            }
        }
    }
}

fn spawn_drain(
    id: String,
    raw: mpsc::Receiver<Message>,
    dest: mpsc::Sender<Message>,
    config: PipelineConfig,
    switch: KillSwitch,
) -> watch::Receiver<bool> {
    let (done_tx, done_rx) = watch::channel(false);
    tokio::spawn(async move {
        let limited = limit(ReceiverStream::new(raw), config.limit, switch.clone());
        let mut events = Box::pin(batch(limited, config.window));
        let mut connected = true;
        while let Some(msg) = events.next().await {
            if connected && dest.send(msg.with_id(id.clone())).await.is_err() {
                // Nobody is listening any more; stop the child and keep
                // draining until its end arrives.
                tracing::debug!(%id, "Outbound queue closed, killing process");
                connected = false;
                switch.trigger();
            }
        }
        let _ = done_tx.send(true);
    });
    done_rx
}

async fn complete(id: String, launched: Launched, switch: KillSwitch, out: mpsc::Sender<Message>) {
    let Launched {
        running, scratch, ..
    } = launched;

    let failure = match running {
        None => None,
        Some(mut running) => {
            let mut killed = false;
            let status = tokio::select! {
                status = running.child.wait() => status,
                () = switch.triggered() => {
                    killed = true;
                    kill_running(&id, &mut running);
                    running.child.wait().await
                }
            };
            // Background children can outlive the leader and keep the pipes
            // open, so a kill must still be honoured while draining.
            if !killed {
                tokio::select! {
                    () = running.drain() => {}
                    () = switch.triggered() => {
                        killed = true;
                        kill_running(&id, &mut running);
                    }
                }
            }
            if killed {
                running.drain_within(KILL_GRACE).await;
            }
            match status {
                Ok(status) => describe_exit(status).or_else(|| killed.then(|| KILLED.to_string())),
                Err(e) => Some(e.to_string()),
            }
        }
    };

    if let Some(dir) = scratch {
        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            tracing::warn!(%id, path = %path.display(), "Failed to remove scratch directory: {e}");
        }
    }

    tracing::debug!(%id, failure = failure.as_deref().unwrap_or(""), "Execution finished");
    let _ = out.send(Message::end(failure.as_deref())).await;
}

fn kill_running(id: &str, running: &mut Running) {
    if let Err(e) = running.signal_kill() {
        tracing::debug!(%id, "Failed to signal process: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use present_core::{FixedEnvironment, Kind};
    use tokio::time::timeout;

    use super::*;
    use crate::backend::{ManifestVerb, StatefulVerb};

    const PATH: &str = "/usr/local/bin:/usr/bin:/bin";

    fn orchestrator(config: ExecConfig) -> Orchestrator {
        let env = FixedEnvironment::new([("PATH", PATH)]);
        Orchestrator::new(Arc::new(env), config)
    }

    fn request(id: &str, kind: Kind, body: &str) -> StartRequest {
        StartRequest::from_message(Message::new(kind, body).with_id(id), None).unwrap()
    }

    /// Collect events for one execution up to and including `end`.
    async fn collect_until_end(rx: &mut mpsc::Receiver<Message>) -> Vec<Message> {
        let mut events = Vec::new();
        loop {
            let msg = timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("timed out waiting for output")
                .expect("outbound closed");
            let end = msg.kind == Kind::End;
            events.push(msg);
            if end {
                return events;
            }
        }
    }

    fn stdout_of(events: &[Message]) -> String {
        events
            .iter()
            .filter(|m| m.kind == Kind::Stdout)
            .map(|m| m.body.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_run_single_line_script() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        let process = orch.start(request("a", Kind::Run, "echo hello"), tx).await;
        assert!(process.is_some());

        let events = collect_until_end(&mut rx).await;
        assert!(events.iter().all(|m| m.id == "a"));
        assert_eq!(stdout_of(&events), "hello\n");
        let end = events.last().unwrap();
        assert_eq!(end.kind, Kind::End);
        assert_eq!(end.body, "");
        assert_eq!(events.iter().filter(|m| m.kind == Kind::End).count(), 1);
    }

    #[tokio::test]
    async fn test_nonzero_exit_reported_in_end() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        orch.start(request("a", Kind::Run, "echo oops >&2\nexit 3"), tx).await;

        let events = collect_until_end(&mut rx).await;
        assert!(events.iter().any(|m| m.kind == Kind::Stderr && m.body == "oops\n"));
        assert_eq!(events.last().unwrap().body, "exit status 3");
    }

    #[tokio::test]
    async fn test_shebang_interpreter() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        orch.start(request("a", Kind::Run, "#!/bin/sh -e\necho from-sh"), tx)
            .await;

        let events = collect_until_end(&mut rx).await;
        assert_eq!(stdout_of(&events), "from-sh\n");
        assert_eq!(events.last().unwrap().body, "");
    }

    #[tokio::test]
    async fn test_cd_persists_without_spawning() {
        let root = tempfile::tempdir().unwrap();
        let root_path = root.path().canonicalize().unwrap();
        std::fs::create_dir(root_path.join("work")).unwrap();

        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        let mut cd = request("a", Kind::Run, "#!/bin/sh\ncd work");
        cd.working_dir = Some(root_path.clone());
        let process = orch.start(cd, tx.clone()).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(events, vec![Message::end(None).with_id("a")]);
        assert_eq!(process.working_dir(), Some(&root_path.join("work")));

        process.kill().await;
        let mut pwd = request("a", Kind::Run, "pwd");
        pwd.working_dir = process.into_working_dir();
        orch.start(pwd, tx).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(stdout_of(&events), format!("{}\n", root_path.join("work").display()));
    }

    #[tokio::test]
    async fn test_bare_cd_is_a_start_error() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        let process = orch.start(request("a", Kind::Run, "cd"), tx).await;
        assert!(process.is_none());

        let events = collect_until_end(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].body, "cd: missing directory operand");
    }

    #[tokio::test]
    async fn test_kill_stops_process_group() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        // The background sleep is a separate process in the same group.
        let body = "sleep 30 &\necho started\nwait";
        let process = orch.start(request("a", Kind::Run, body), tx).await.unwrap();

        let first = timeout(Duration::from_secs(10), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.body, "started\n");

        timeout(Duration::from_secs(10), process.kill())
            .await
            .expect("kill should not hang on the background child");
        assert!(process.is_finished());

        let events = collect_until_end(&mut rx).await;
        assert_eq!(events.last().unwrap().body, "signal: killed");
    }

    #[tokio::test]
    async fn test_kill_after_leader_exits() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        // The shell exits at once; the orphaned sleep keeps the pipes open.
        let body = "sleep 30 &\necho started";
        let process = orch.start(request("a", Kind::Run, body), tx).await.unwrap();

        let first = timeout(Duration::from_secs(10), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.body, "started\n");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!process.is_finished());

        timeout(Duration::from_secs(5), process.kill())
            .await
            .expect("kill should reach children of an exited shell");
        assert!(process.is_finished());

        let events = collect_until_end(&mut rx).await;
        assert_eq!(events.last().unwrap().body, "signal: killed");
    }

    #[tokio::test]
    async fn test_kill_is_idempotent() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        let process = orch.start(request("a", Kind::Run, "true"), tx).await.unwrap();
        collect_until_end(&mut rx).await;
        process.wait().await;

        let mut kill = tokio_test::task::spawn(process.kill());
        tokio_test::assert_ready!(kill.poll());
        drop(kill);
        let mut again = tokio_test::task::spawn(process.kill());
        tokio_test::assert_ready!(again.poll());
    }

    #[tokio::test]
    async fn test_output_flood_is_limited() {
        let mut config = ExecConfig::default();
        config.pipeline.limit = 5;
        let orch = orchestrator(config);
        let (tx, mut rx) = mpsc::channel(64);

        let body = "i=0\nwhile [ $i -lt 1500 ]; do echo x; sleep 0.01; i=$((i+1)); done";
        orch.start(request("a", Kind::Run, body), tx).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        let delivered = stdout_of(&events).lines().count();
        assert!(delivered < 1500, "flood was not cut short: {delivered}");
        let end = events.last().unwrap();
        assert_eq!(end.kind, Kind::End);
        assert_eq!(end.body, "signal: killed");
    }

    #[tokio::test]
    async fn test_manifest_apply_invokes_cli_in_scratch_dir() {
        let config = ExecConfig {
            kubectl: "echo".into(),
            ..ExecConfig::default()
        };
        let orch = orchestrator(config);
        let (tx, mut rx) = mpsc::channel(64);

        let mut req = request("k", Kind::KubectlApply, "kind: ConfigMap\n");
        assert_eq!(req.backend, BackendKind::ManifestApply(ManifestVerb::Apply));
        req.backend = BackendKind::ManifestApply(ManifestVerb::Delete);
        orch.start(req, tx).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(stdout_of(&events), "delete -f k8s.yml\n");
        assert_eq!(events.last().unwrap().body, "");
    }

    #[tokio::test]
    async fn test_stateful_apply_keeps_state_dir() {
        let root = tempfile::tempdir().unwrap();
        let config = ExecConfig {
            terraform: "echo".into(),
            state_root: Some(root.path().to_path_buf()),
            ..ExecConfig::default()
        };
        let orch = orchestrator(config);
        let (tx, mut rx) = mpsc::channel(64);

        let body = "resource \"null_resource\" \"x\" {}\n";
        orch.start(request("tf", Kind::TerraformApply, body), tx.clone())
            .await
            .unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(stdout_of(&events), "init\napply -auto-approve\n");
        let state = root.path().join("terraform-tf");
        assert_eq!(std::fs::read_to_string(state.join("main.tf")).unwrap(), body);

        let destroy = request("tf", Kind::TerraformDestroy, "");
        assert_eq!(destroy.backend, BackendKind::StatefulApply(StatefulVerb::Destroy));
        orch.start(destroy, tx).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(stdout_of(&events), "destroy -auto-approve\n");
        assert!(state.join("main.tf").exists());
    }

    #[tokio::test]
    async fn test_stateful_init_failure() {
        let root = tempfile::tempdir().unwrap();
        let config = ExecConfig {
            terraform: "false".into(),
            state_root: Some(root.path().to_path_buf()),
            ..ExecConfig::default()
        };
        let orch = orchestrator(config);
        let (tx, mut rx) = mpsc::channel(64);

        let process = orch.start(request("tf", Kind::TerraformApply, "x"), tx).await;
        assert!(process.is_none());
        let events = collect_until_end(&mut rx).await;
        assert_eq!(events.last().unwrap().body, "unable to init terraform: exit status 1");
    }

    #[tokio::test]
    async fn test_file_save() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("slide.txt");
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        let msg = Message::new(Kind::SaveFile, "saved body")
            .with_id("f")
            .with_path(target.to_string_lossy());
        let req = StartRequest::from_message(msg, None).unwrap();
        let process = orch.start(req, tx).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(events, vec![Message::end(None).with_id("f")]);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "saved body");
        process.wait().await;
        assert!(process.is_finished());
    }

    #[tokio::test]
    async fn test_file_save_without_path() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, mut rx) = mpsc::channel(64);

        assert!(orch.start(request("f", Kind::SaveFile, "x"), tx).await.is_none());
        let events = collect_until_end(&mut rx).await;
        assert_eq!(events[0].body, "saveFile requires a destination path");
    }

    #[tokio::test]
    async fn test_missing_toolchain_reported() {
        let config = ExecConfig {
            go: "definitely-not-a-go-toolchain".into(),
            ..ExecConfig::default()
        };
        let orch = orchestrator(config);
        let (tx, mut rx) = mpsc::channel(64);

        let body = "package main\n\nfunc main() {}\n";
        assert!(orch.start(request("g", Kind::Run, body), tx).await.is_none());
        let events = collect_until_end(&mut rx).await;
        assert_eq!(
            events[0].body,
            "executable not found: definitely-not-a-go-toolchain"
        );
    }

    /// Stand-in Go toolchain. Logs every invocation with its `GO111MODULE`
    /// and, for `build`, writes a program that reports its `GOMAXPROCS`.
    const FAKE_GO: &str = r##"#!/bin/sh
echo "$*|${GO111MODULE:-}" >> "$GO_LOG"
[ "$1" = build ] || exit 0
while [ $# -gt 0 ]; do
    [ "$1" = -o ] && out=$2
    shift
done
[ -n "${FAKE_GO_NO_BINARY:-}" ] && exit 0
printf '#!/bin/sh\necho "ran GOMAXPROCS=${GOMAXPROCS:-unset}"\n' > "$out"
chmod +x "$out"
"##;

    /// Install the fake toolchain in `dir` and return an orchestrator using it.
    fn fake_go(dir: &std::path::Path, extra: &[(&str, &str)]) -> Orchestrator {
        let go = dir.join("go");
        // Written by a child so this process never holds the file open for
        // writing while other tests fork.
        let status = std::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(r#"printf '%s' "$2" > "$1" && chmod +x "$1""#)
            .arg("sh")
            .arg(&go)
            .arg(FAKE_GO)
            .status()
            .unwrap();
        assert!(status.success());

        let log = dir.join("go.log").to_string_lossy().into_owned();
        let mut env = FixedEnvironment::new([("PATH", PATH), ("GO_LOG", log.as_str())]);
        for (key, value) in extra {
            env = env.with(*key, *value);
        }
        let config = ExecConfig {
            go: go.to_string_lossy().into_owned(),
            ..ExecConfig::default()
        };
        Orchestrator::new(Arc::new(env), config)
    }

    fn go_log(dir: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("go.log"))
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    fn stderr_of(events: &[Message]) -> String {
        events
            .iter()
            .filter(|m| m.kind == Kind::Stderr)
            .map(|m| m.body.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_program_built_then_run_directly() {
        let tools = tempfile::tempdir().unwrap();
        let orch = fake_go(tools.path(), &[]);
        let (tx, mut rx) = mpsc::channel(64);

        let body = "package main\n\nfunc main() {}\n";
        orch.start(request("g", Kind::Run, body), tx).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(stdout_of(&events), "ran GOMAXPROCS=unset\n");
        assert_eq!(stderr_of(&events), "");
        assert_eq!(events.last().unwrap().body, "");

        // The toolchain only builds; the program is not started through it.
        let log = go_log(tools.path());
        assert_eq!(log.len(), 1, "log: {log:?}");
        assert!(log[0].starts_with("build -tags OMIT -o "), "log: {log:?}");
        assert!(log[0].ends_with("/prog|off"), "log: {log:?}");
    }

    #[tokio::test]
    async fn test_program_race_detector() {
        let tools = tempfile::tempdir().unwrap();
        let orch = fake_go(tools.path(), &[]);
        let (tx, mut rx) = mpsc::channel(64);

        let msg = Message::new(Kind::Run, "package main\n\nfunc main() {}\n")
            .with_id("g")
            .with_options(ExecOptions { race: true });
        let start = StartRequest::from_message(msg, None).unwrap();
        orch.start(start, tx).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(stderr_of(&events), "Running with race detector.\n");
        assert_eq!(stdout_of(&events), "ran GOMAXPROCS=2\n");
        assert_eq!(events.last().unwrap().body, "");

        let log = go_log(tools.path());
        assert!(log[0].starts_with("build -tags OMIT -race -o "), "log: {log:?}");
    }

    #[tokio::test]
    async fn test_program_with_module_is_tidied() {
        let tools = tempfile::tempdir().unwrap();
        let orch = fake_go(tools.path(), &[]);
        let (tx, mut rx) = mpsc::channel(64);

        let body = "-- prog.go --\npackage main\n\nfunc main() {}\n-- go.mod --\nmodule demo\n";
        orch.start(request("g", Kind::Run, body), tx).await.unwrap();

        let events = collect_until_end(&mut rx).await;
        assert_eq!(stdout_of(&events), "ran GOMAXPROCS=unset\n");

        let log = go_log(tools.path());
        assert_eq!(log.len(), 2, "log: {log:?}");
        assert_eq!(log[0], "mod tidy|");
        assert!(log[1].starts_with("build -tags OMIT -o "), "log: {log:?}");
        assert!(log[1].ends_with("/prog|"), "log: {log:?}");
    }

    #[tokio::test]
    async fn test_library_package_is_not_executable() {
        let tools = tempfile::tempdir().unwrap();
        let orch = fake_go(tools.path(), &[("FAKE_GO_NO_BINARY", "1")]);
        let (tx, mut rx) = mpsc::channel(64);

        let body = "package lib\n\nfunc Helper() {}\n";
        assert!(orch.start(request("g", Kind::Run, body), tx).await.is_none());

        let events = collect_until_end(&mut rx).await;
        assert_eq!(
            events.last().unwrap().body,
            "executable programs must use \"package main\""
        );
    }

    #[tokio::test]
    async fn test_dropped_outbound_still_completes() {
        let orch = orchestrator(ExecConfig::default());
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let process = orch.start(request("a", Kind::Run, "sleep 30"), tx).await.unwrap();
        timeout(Duration::from_secs(10), process.kill()).await.unwrap();
        assert!(process.is_finished());
    }
}
