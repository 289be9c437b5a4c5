//! # craft-runner
//!
//! A library for provisioning and running local Minecraft server processes,
//! vanilla and modded.
//!
//! ## Overview
//!
//! craft-runner turns a directory on disk into a runnable Minecraft server
//! installation and manages its process lifecycle:
//!
//! - **Detection**: figure out which mod loader and Minecraft version a
//!   directory contains without running it ([`detect`])
//! - **Provisioning**: bootstrap a fresh installation's `eula.txt` and
//!   `server.properties` by running the server just long enough to generate
//!   them ([`provision`])
//! - **Process control**: start the server with piped console streams, send
//!   commands, and stop it through a bounded escalation ladder ([`server`])
//! - **Loader installation**: install Forge/NeoForge via their installer
//!   jars or Fabric/Quilt via their launcher downloads ([`loader`])
//! - **Modpack installation**: install Modrinth and CurseForge packs end to
//!   end ([`modpack`]), quarantining client-only mods ([`mods`])
//!
//! Network catalogs (version lists, mod metadata, runtime discovery) are
//! not implemented here; they are ports in [`sources`] for the embedding
//! application to supply.
//!
//! ## Quick start
//!
//! ```no_run
//! use craft_runner::ServerManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> craft_runner::Result<()> {
//!     let mut manager = ServerManager::new("/srv/minecraft")
//!         .sink(Arc::new(|line| println!("{line}")));
//!
//!     manager.start(None, None).await?;
//!     manager.send_command("say server is up").await?;
//!     manager.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod detect;
pub mod download;
pub mod error;
pub mod loader;
pub mod modpack;
pub mod mods;
pub mod provision;
pub mod server;
pub mod sources;

pub use detect::{Installation, LoaderKind};
pub use error::{Error, Result};
pub use modpack::{InstallReport, ModpackInstaller};
pub use provision::FirstRunSequencer;
pub use server::{LaunchSpec, LogSink, ServerProcess, ServerStatus};

use crate::config::Eula;
use crate::server::StoppedCallback;
use std::path::PathBuf;
use std::sync::Arc;

/// Per-installation entry point tying the pieces together.
///
/// Owns the install directory, the cached detection facts, and one
/// [`ServerProcess`]. Starting a modded installation quarantines client-only
/// mods first; starting an unprovisioned installation runs the first-run
/// sequencer automatically. Methods take `&mut self`: one caller drives the
/// lifecycle, and cross-task sharing is the embedder's lock to add.
pub struct ServerManager {
    installation: Installation,
    process: ServerProcess,
    java: Option<PathBuf>,
    sink: LogSink,
}

impl ServerManager {
    /// Create a manager for `dir`, running detection immediately.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            installation: Installation::detect(dir.into()),
            process: ServerProcess::new(),
            java: None,
            sink: Arc::new(|_| {}),
        }
    }

    /// Receive every console output line.
    pub fn sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    /// Use a specific java executable instead of `java` from `PATH`.
    pub fn java(mut self, path: impl Into<PathBuf>) -> Self {
        self.java = Some(path.into());
        self
    }

    /// Cached detection facts for the install directory.
    pub fn installation(&self) -> &Installation {
        &self.installation
    }

    /// Current process state.
    pub fn status(&self) -> ServerStatus {
        self.process.status()
    }

    /// Re-run detection, keeping previously detected modded facts.
    pub fn refresh_detection(&mut self) {
        self.installation.refresh();
    }

    /// Run the two-phase first-run bootstrap for this installation.
    #[tracing::instrument(skip_all, fields(dir = ?self.installation.dir()))]
    pub async fn provision(&mut self) -> Result<()> {
        let mut sequencer = FirstRunSequencer::new();
        if let Some(java) = &self.java {
            sequencer = sequencer.java(java);
        }
        sequencer.run(&self.installation, self.sink.clone()).await
    }

    /// Start the server in detached mode.
    ///
    /// Client-only mods are quarantined first when the installation is
    /// modded, and an unprovisioned installation is bootstrapped
    /// automatically. `ram_mb` defaults to a recommendation based on the
    /// installed mod count. `on_stopped`, if given, fires exactly once
    /// after the server's output stream closes.
    #[tracing::instrument(skip_all, fields(dir = ?self.installation.dir()))]
    pub async fn start(
        &mut self,
        ram_mb: Option<u32>,
        on_stopped: Option<StoppedCallback>,
    ) -> Result<()> {
        if self.process.status() != ServerStatus::Idle {
            return Err(Error::AlreadyRunning);
        }
        self.installation.refresh();
        let dir = self.installation.dir().to_path_buf();

        if self.installation.loader().is_modded() {
            let quarantined = mods::quarantine(&dir.join("mods"))?;
            for name in &quarantined {
                (self.sink)(&format!("[mods] quarantined client-only mod {}", name));
            }
        }

        let provisioned = Eula::in_dir(&dir).is_accepted()?
            && dir.join("server.properties").exists();
        if !provisioned {
            (self.sink)("[manager] installation not provisioned, running first-run bootstrap");
            self.provision().await?;
        }

        let ram = ram_mb.unwrap_or_else(|| server::recommend_ram_mb(installed_mod_count(&dir)));
        let spec = LaunchSpec::for_installation(&self.installation, ram, self.java.as_deref())?;
        self.process.start(&spec, self.sink.clone(), on_stopped).await
    }

    /// Download the official server jar for `version` into the install
    /// directory, if it does not already have one.
    pub async fn ensure_server_jar(
        &self,
        source: &dyn sources::ServerArtifactSource,
        version: &str,
    ) -> Result<()> {
        let dest = self.installation.dir().join("server.jar");
        if dest.exists() {
            return Ok(());
        }
        (self.sink)(&format!("[manager] downloading server jar for {}", version));
        let url = source.server_jar_url(version).await?;
        let client = reqwest::Client::new();
        download::download_to_file(&client, &url, &dest).await
    }

    /// Write a console command to the running server.
    pub async fn send_command(&mut self, text: &str) -> Result<()> {
        self.process.send_command(text).await
    }

    /// Stop the running server through the escalation ladder.
    pub async fn stop(&mut self) -> Result<()> {
        self.process.stop().await
    }

    /// Kill any stray java processes left over from previous runs of this
    /// installation. Best-effort; returns how many were signalled.
    pub fn sweep_leftovers(&self) -> usize {
        server::sweep_leftovers(self.installation.dir())
    }
}

fn installed_mod_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir.join("mods"))
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.file_name().to_string_lossy().ends_with(".jar"))
                .count()
        })
        .unwrap_or(0)
}
