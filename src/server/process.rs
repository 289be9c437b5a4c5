use crate::error::{Error, Result};
use crate::server::command::LaunchSpec;
use async_process::{Child, ChildStdin, Command, Stdio};
use futures_lite::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Callback receiving each console output line, already stripped of its
/// trailing newline. Stdout and stderr lines are interleaved but each
/// stream's lines arrive in order.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Callback fired exactly once after the child's stdout stream closes and
/// every buffered line has been forwarded to the sink.
pub type StoppedCallback = Box<dyn FnOnce() + Send>;

/// Lifecycle states of a managed server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    /// No child process exists.
    Idle,
    /// A spawn is in progress.
    Starting,
    /// The child process is (as far as we know) alive.
    Running,
    /// A stop escalation is in progress.
    Stopping,
}

/// How long each rung of the stop ladder waits before escalating.
const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(15);
const TERMINATE_TIMEOUT: Duration = Duration::from_secs(10);
const KILL_TIMEOUT: Duration = Duration::from_secs(5);

/// Controller for a single server child process.
///
/// Owns the child handle, its stdin pipe, and the background tasks reading
/// its output. Methods take `&mut self`; callers wanting cross-task access
/// wrap the controller in their own lock (see the facade in `lib.rs`).
///
/// # Examples
///
/// ```no_run
/// use craft_runner::server::{LaunchSpec, ServerProcess};
/// use std::sync::Arc;
///
/// # async fn run() -> craft_runner::Result<()> {
/// let mut server = ServerProcess::new();
/// let spec = LaunchSpec::vanilla("/srv/minecraft", "server.jar", 2048, None);
/// server
///     .start(&spec, Arc::new(|line| println!("{line}")), None)
///     .await?;
/// server.send_command("say hello").await?;
/// server.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct ServerProcess {
    id: Uuid,
    status: ServerStatus,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    reader_tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl ServerProcess {
    /// Create an idle controller with a fresh instance id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ServerStatus::Idle,
            child: None,
            stdin: None,
            reader_tasks: Vec::new(),
        }
    }

    /// Instance identifier, stable across starts of this controller.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state. Does not poll the OS; a crashed child is
    /// reported `Running` until [`try_wait`](Self::try_wait) or
    /// [`stop`](Self::stop) observes the exit.
    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// OS process id of the child, if one is running.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(|c| c.id())
    }

    /// Spawn the server in detached mode.
    ///
    /// Stdin, stdout, and stderr are piped. Background tasks forward each
    /// output line to `sink`; `on_stopped`, if given, fires exactly once
    /// after stdout reaches end-of-file and every line has been delivered.
    /// Returns as soon as the process is spawned.
    #[tracing::instrument(skip_all, fields(id = %self.id, program = %spec.program))]
    pub async fn start(
        &mut self,
        spec: &LaunchSpec,
        sink: LogSink,
        on_stopped: Option<StoppedCallback>,
    ) -> Result<()> {
        if self.child.is_some() {
            return Err(Error::AlreadyRunning);
        }
        self.status = ServerStatus::Starting;

        let mut child = match self.spawn(spec) {
            Ok(child) => child,
            Err(e) => {
                self.status = ServerStatus::Idle;
                return Err(e);
            }
        };
        tracing::info!(pid = child.id(), dir = ?spec.dir, "server process started");

        self.stdin = child.stdin.take();

        if let Some(stdout) = child.stdout.take() {
            let sink = sink.clone();
            self.reader_tasks.push(tokio::spawn(async move {
                forward_lines(stdout, sink).await;
                if let Some(cb) = on_stopped {
                    cb();
                }
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            self.reader_tasks.push(tokio::spawn(async move {
                forward_lines(stderr, sink).await;
            }));
        }

        self.child = Some(child);
        self.status = ServerStatus::Running;
        Ok(())
    }

    /// Spawn the server and block until it exits on its own, streaming
    /// output to `sink`. Used for one-shot runs such as loader installers.
    #[tracing::instrument(skip_all, fields(id = %self.id, program = %spec.program))]
    pub async fn run_to_exit(&mut self, spec: &LaunchSpec, sink: LogSink) -> Result<i32> {
        if self.child.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let mut child = self.spawn(spec)?;
        self.status = ServerStatus::Running;
        if let Some(stdout) = child.stdout.take() {
            let sink = sink.clone();
            self.reader_tasks.push(tokio::spawn(async move {
                forward_lines(stdout, sink).await;
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            self.reader_tasks.push(tokio::spawn(async move {
                forward_lines(stderr, sink).await;
            }));
        }

        // Keep the handle on self while waiting, so a caller that wraps
        // this future in a timeout can still terminate the child.
        self.child = Some(child);
        let status = match self.child.as_mut() {
            Some(child) => child
                .status()
                .await
                .map_err(|e| Error::Process(format!("Failed waiting for process exit: {}", e)))?,
            None => return Err(Error::NotRunning),
        };
        self.cleanup();
        Ok(status.code().unwrap_or(-1))
    }

    fn spawn(&self, spec: &LaunchSpec) -> Result<Child> {
        Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::MissingRuntime(spec.program.clone()),
                _ => Error::Process(format!("Failed to start '{}': {}", spec.program, e)),
            })
    }

    /// Write a console command to the server's stdin.
    ///
    /// Appends a newline and flushes. A delivery failure (process not
    /// running, stdin pipe gone) is reported as an error but is non-fatal
    /// to the controller; the process keeps its state.
    pub async fn send_command(&mut self, text: &str) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Err(Error::NotRunning);
        }
        let stdin = self.stdin.as_mut().ok_or(Error::NotRunning)?;
        let line = format!("{}\n", text);
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::Communication(format!("Failed to write command: {}", e)))?;
        stdin
            .flush()
            .await
            .map_err(|e| Error::Communication(format!("Failed to flush command: {}", e)))?;
        tracing::debug!(command = text, "console command sent");
        Ok(())
    }

    /// Check for a completed exit without blocking. Returns the exit code
    /// if the child has terminated; transitions to `Idle` when it has.
    pub fn try_wait(&mut self) -> Result<Option<i32>> {
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };
        match child.try_status() {
            Ok(Some(status)) => {
                let code = status.code().unwrap_or(-1);
                self.cleanup();
                Ok(Some(code))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(Error::Process(format!("Failed to poll process: {}", e))),
        }
    }

    /// Stop the server through the escalation ladder.
    ///
    /// 1. Console `stop` command, waiting up to 15 seconds
    /// 2. SIGTERM (Unix; skipped on other platforms), up to 10 seconds
    /// 3. Hard kill of the child, up to 5 seconds
    /// 4. Process-tree kill of any surviving descendants, then the root
    ///
    /// The child handle is cleared and the state returns to `Idle` whichever
    /// rung succeeds.
    #[tracing::instrument(skip_all, fields(id = %self.id))]
    pub async fn stop(&mut self) -> Result<()> {
        if self.child.is_none() {
            return Err(Error::NotRunning);
        }
        self.status = ServerStatus::Stopping;
        let pid = self.pid();

        // Rung 1: polite console stop.
        let polite = match self.stdin.as_mut() {
            Some(stdin) => {
                stdin.write_all(b"stop\n").await.is_ok() && stdin.flush().await.is_ok()
            }
            None => false,
        };
        if polite && self.wait_exit(GRACEFUL_STOP_TIMEOUT).await {
            tracing::info!("server stopped gracefully");
            self.cleanup();
            return Ok(());
        }

        // Rung 2: SIGTERM.
        #[cfg(unix)]
        if let Some(pid) = pid {
            tracing::warn!(pid, "graceful stop timed out, sending SIGTERM");
            let _ = nix::sys::signal::kill(
                nix::unistd::Pid::from_raw(pid as i32),
                nix::sys::signal::Signal::SIGTERM,
            );
            if self.wait_exit(TERMINATE_TIMEOUT).await {
                self.cleanup();
                return Ok(());
            }
        }

        // Rung 3: hard kill.
        if let Some(child) = self.child.as_mut() {
            tracing::warn!("terminate timed out, killing process");
            let _ = child.kill();
            if self.wait_exit(KILL_TIMEOUT).await {
                self.cleanup();
                return Ok(());
            }
        }

        // Rung 4: take down the whole tree, descendants first.
        if let Some(pid) = pid {
            tracing::warn!(pid, "kill timed out, sweeping process tree");
            crate::server::sweep::kill_tree(pid);
        }
        self.cleanup();
        Ok(())
    }

    /// Terminate without the console-stop rung: SIGTERM on Unix, hard kill
    /// elsewhere, escalating to a kill if the signal is ignored. Used by
    /// the first-run sequencer, which only needs config files generated.
    pub async fn terminate(&mut self) -> Result<()> {
        if self.child.is_none() {
            return Err(Error::NotRunning);
        }
        self.status = ServerStatus::Stopping;

        #[cfg(unix)]
        if let Some(pid) = self.pid() {
            let _ = nix::sys::signal::kill(
                nix::unistd::Pid::from_raw(pid as i32),
                nix::sys::signal::Signal::SIGTERM,
            );
            if self.wait_exit(TERMINATE_TIMEOUT).await {
                self.cleanup();
                return Ok(());
            }
        }

        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = self.wait_exit(KILL_TIMEOUT).await;
        }
        self.cleanup();
        Ok(())
    }

    /// Wait up to `limit` for the child to exit. True only on a confirmed
    /// exit; a timeout or a failed wait both leave the next rung to act.
    async fn wait_exit(&mut self, limit: Duration) -> bool {
        let Some(child) = self.child.as_mut() else {
            return true;
        };
        matches!(
            tokio::time::timeout(limit, child.status()).await,
            Ok(Ok(_))
        )
    }

    fn cleanup(&mut self) {
        self.child = None;
        self.stdin = None;
        // Reader tasks finish on their own once the pipes hit EOF.
        self.reader_tasks.clear();
        self.status = ServerStatus::Idle;
    }
}

impl Default for ServerProcess {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward each line from `pipe` to `sink`, tolerating invalid UTF-8.
async fn forward_lines<R>(pipe: R, sink: LogSink)
where
    R: futures_lite::AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                sink(line.trim_end_matches(['\r', '\n']));
            }
            Err(e) => {
                tracing::warn!(error = %e, "output stream read failed");
                break;
            }
        }
    }
}
