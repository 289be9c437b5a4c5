//! First-run provisioning.
//!
//! A freshly installed Minecraft server will not start properly until it
//! has generated and had accepted its `eula.txt`, and generated its
//! `server.properties`. [`FirstRunSequencer`] automates both by running the
//! server twice in bootstrap mode: once until `eula.txt` appears, once more
//! until `server.properties` appears, terminating the server each time the
//! target artifact lands on disk.

mod watch;

pub use watch::{ArtifactWatcher, PollWatcher};

use crate::config::{Eula, ServerProperties};
use crate::detect::Installation;
use crate::error::{Error, Result};
use crate::server::{sweep_leftovers, LaunchSpec, LogSink, ServerProcess};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bootstrap runs use a deliberately small heap; the server only needs to
/// get far enough to write its config files.
const BOOTSTRAP_RAM_MB: u32 = 1024;

/// Modded servers take far longer to reach the point where they write
/// their config files, so each phase gets a larger budget.
const EULA_TIMEOUT_VANILLA: Duration = Duration::from_secs(10);
const EULA_TIMEOUT_MODDED: Duration = Duration::from_secs(20);
const PROPERTIES_TIMEOUT_VANILLA: Duration = Duration::from_secs(30);
const PROPERTIES_TIMEOUT_MODDED: Duration = Duration::from_secs(120);

/// Grace period after the artifact appears, letting the server finish
/// flushing it before we pull the plug.
const WRITER_FLUSH_WAIT: Duration = Duration::from_millis(500);

/// Two-phase first-run bootstrap.
///
/// Phase 1 starts the server with minimal memory and waits for `eula.txt`;
/// the generated file is validated and accepted. Phase 2 starts it again
/// and waits for `server.properties`, validates it, then applies the
/// default property overrides. Each phase terminates the server as soon as
/// its artifact is complete, and a timeout aborts the whole sequence with a
/// diagnostic naming the missing artifact. Phases whose artifact already
/// exists are skipped, so the sequencer is safe to re-run.
pub struct FirstRunSequencer {
    watcher: Box<dyn ArtifactWatcher>,
    java: Option<PathBuf>,
}

impl FirstRunSequencer {
    /// Sequencer with the default 100 ms polling watcher.
    pub fn new() -> Self {
        Self::with_watcher(Box::new(PollWatcher::default()))
    }

    /// Sequencer with a custom artifact watcher.
    pub fn with_watcher(watcher: Box<dyn ArtifactWatcher>) -> Self {
        Self {
            watcher,
            java: None,
        }
    }

    /// Use a specific java executable instead of `java` from `PATH`.
    pub fn java(mut self, path: impl Into<PathBuf>) -> Self {
        self.java = Some(path.into());
        self
    }

    /// Run the full bootstrap sequence for `installation`, streaming all
    /// server output through `sink`.
    #[tracing::instrument(skip_all, fields(dir = ?installation.dir()))]
    pub async fn run(&self, installation: &Installation, sink: LogSink) -> Result<()> {
        let dir = installation.dir();
        let modded = installation.loader().is_modded();
        let spec = LaunchSpec::for_installation(installation, BOOTSTRAP_RAM_MB, self.java.as_deref())?;

        let eula = Eula::in_dir(dir);
        if !eula.path().exists() {
            sink("[provision] generating eula.txt (phase 1 of 2)");
            let timeout = if modded {
                EULA_TIMEOUT_MODDED
            } else {
                EULA_TIMEOUT_VANILLA
            };
            self.bootstrap_until(&spec, eula.path(), timeout, &sink)
                .await?;
            eula.validate_generated()?;
        }
        eula.accept()?;
        sink("[provision] EULA accepted");

        let properties = ServerProperties::in_dir(dir);
        if !properties.path().exists() {
            sink("[provision] generating server.properties (phase 2 of 2)");
            let timeout = if modded {
                PROPERTIES_TIMEOUT_MODDED
            } else {
                PROPERTIES_TIMEOUT_VANILLA
            };
            self.bootstrap_until(&spec, properties.path(), timeout, &sink)
                .await?;
            properties.validate_generated()?;
        }
        properties.set("online-mode", "false")?;
        properties.set("difficulty", "normal")?;
        sink("[provision] server.properties configured");

        let swept = sweep_leftovers(dir);
        if swept > 0 {
            tracing::warn!(swept, "killed leftover bootstrap processes");
        }
        tracing::info!("first-run provisioning complete");
        Ok(())
    }

    /// Start the server, wait for `target` to appear, then terminate it.
    async fn bootstrap_until(
        &self,
        spec: &LaunchSpec,
        target: &Path,
        timeout: Duration,
        sink: &LogSink,
    ) -> Result<()> {
        let mut process = ServerProcess::new();
        process.start(spec, sink.clone(), None).await?;

        let appeared = self.watcher.wait_for(target, timeout).await;
        if appeared {
            // Give the server a moment to finish writing the file.
            tokio::time::sleep(WRITER_FLUSH_WAIT).await;
        }
        let _ = process.terminate().await;

        if !appeared {
            return Err(Error::Timeout(format!(
                "'{}' was not generated within {} seconds",
                target.display(),
                timeout.as_secs()
            )));
        }
        Ok(())
    }
}

impl Default for FirstRunSequencer {
    fn default() -> Self {
        Self::new()
    }
}
