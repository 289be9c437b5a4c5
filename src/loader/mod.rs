//! Mod loader installation.
//!
//! Two installation families exist. Forge and NeoForge ship an installer
//! jar that must be run with `--installServer` and writes the server files
//! itself; Fabric and Quilt serve a ready-to-run server-launcher jar that
//! only needs downloading. The dispatch is a plain branch on
//! [`LoaderKind`]; the families share nothing worth a trait.

mod fabric;
mod forge;

use crate::detect::LoaderKind;
use crate::error::{Error, Result};
use crate::server::LogSink;
use crate::sources::LoaderMetadataSource;
use std::path::{Path, PathBuf};

/// Installs a mod loader's server files into an install directory.
pub struct LoaderInstaller<'a> {
    metadata: &'a dyn LoaderMetadataSource,
    client: reqwest::Client,
    java: Option<PathBuf>,
}

impl<'a> LoaderInstaller<'a> {
    pub fn new(metadata: &'a dyn LoaderMetadataSource) -> Self {
        Self {
            metadata,
            client: reqwest::Client::new(),
            java: None,
        }
    }

    /// Use a specific java executable for installer runs.
    pub fn java(mut self, path: impl Into<PathBuf>) -> Self {
        self.java = Some(path.into());
        self
    }

    /// Install `kind` for `minecraft_version` into `dir`.
    ///
    /// When `loader_version` is `None` the metadata source picks the
    /// recommended release, falling back to the latest. Returns the loader
    /// version that was installed. Installing `Vanilla` is a no-op.
    #[tracing::instrument(skip(self, sink))]
    pub async fn install(
        &self,
        dir: &Path,
        kind: LoaderKind,
        minecraft_version: &str,
        loader_version: Option<&str>,
        sink: &LogSink,
    ) -> Result<String> {
        match kind {
            LoaderKind::Vanilla => Ok(String::new()),
            LoaderKind::Forge | LoaderKind::NeoForge => {
                let meta = self
                    .metadata
                    .resolve(kind, minecraft_version, loader_version)
                    .await?;
                forge::install(
                    &self.client,
                    dir,
                    kind,
                    &meta,
                    self.java.as_deref(),
                    sink,
                )
                .await?;
                Ok(meta.version)
            }
            LoaderKind::Fabric | LoaderKind::Quilt => {
                let meta = self
                    .metadata
                    .resolve(kind, minecraft_version, loader_version)
                    .await?;
                fabric::install(&self.client, dir, kind, &meta, sink).await?;
                Ok(meta.version)
            }
            LoaderKind::Unknown => Err(Error::Other(
                "Cannot install an unrecognized loader".to_string(),
            )),
        }
    }
}
