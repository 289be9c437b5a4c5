//! Collaborator ports.
//!
//! Provisioning needs a handful of answers from the outside world: where to
//! download a server jar, which loader version to install, which java
//! runtime suits a Minecraft version, and where a catalog-referenced mod
//! file lives. Those concerns are network catalog clients and are out of
//! scope here, so they are expressed purely as traits for the embedding
//! application to implement.

use crate::detect::LoaderKind;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Resolved loader release: the version chosen and the URL of the artifact
/// to download (an installer jar for Forge/NeoForge, the server-launcher
/// jar itself for Fabric/Quilt).
#[derive(Debug, Clone)]
pub struct LoaderMetadata {
    pub version: String,
    pub download_url: String,
}

/// Resolved mod file: its canonical file name and download URL.
#[derive(Debug, Clone)]
pub struct ModFileMetadata {
    pub file_name: String,
    pub download_url: String,
}

/// Resolves server jar downloads for vanilla Minecraft versions.
#[async_trait]
pub trait ServerArtifactSource: Send + Sync {
    /// Download URL of the official server jar for `minecraft_version`.
    async fn server_jar_url(&self, minecraft_version: &str) -> Result<String>;
}

/// Resolves loader releases against the loader project's metadata service.
#[async_trait]
pub trait LoaderMetadataSource: Send + Sync {
    /// Resolve the artifact for `kind` on `minecraft_version`. When
    /// `loader_version` is `None`, implementations pick the recommended
    /// release, falling back to the latest.
    async fn resolve(
        &self,
        kind: LoaderKind,
        minecraft_version: &str,
        loader_version: Option<&str>,
    ) -> Result<LoaderMetadata>;
}

/// Locates a suitable java executable for a Minecraft version.
#[async_trait]
pub trait RuntimeResolver: Send + Sync {
    /// Path to a java executable able to run `minecraft_version`, or `None`
    /// when no suitable runtime is available.
    async fn java_for(&self, minecraft_version: &str) -> Result<Option<PathBuf>>;
}

/// Resolves catalog file references (project id + file id) to downloads.
#[async_trait]
pub trait ModFileMetadataSource: Send + Sync {
    async fn file_metadata(&self, project_id: u64, file_id: u64) -> Result<ModFileMetadata>;
}
