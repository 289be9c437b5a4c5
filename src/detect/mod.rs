//! Installed-artifact detection.
//!
//! Given an install directory, figures out which mod loader (if any) is
//! installed and which Minecraft version it targets, without running the
//! server. Detection is a fixed priority chain over cheap filesystem
//! evidence; every step is best-effort and no step can fail the chain.

mod loader;
mod version;

use std::fmt;
use std::path::{Path, PathBuf};

pub use loader::detect_loader;
pub use version::detect_minecraft_version;

/// The mod-loader family installed in a server directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderKind {
    /// Plain Mojang server, no loader.
    Vanilla,
    Forge,
    NeoForge,
    Fabric,
    Quilt,
    /// No recognizable server artifact, or modding evidence without a
    /// nameable family.
    Unknown,
}

impl LoaderKind {
    /// Whether this kind requires a loader-specific launch path.
    pub fn is_modded(&self) -> bool {
        !matches!(self, LoaderKind::Vanilla)
    }

    /// Whether the loader launches through Forge-style `@args-file`
    /// argument files rather than a single server jar.
    pub fn uses_args_files(&self) -> bool {
        matches!(self, LoaderKind::Forge | LoaderKind::NeoForge)
    }

    /// Match a free-form loader identifier ("forge-47.2.0", "neoforge",
    /// "fabric-loader") against a family.
    ///
    /// NeoForge is checked before Forge since its identifier contains the
    /// substring "forge".
    pub fn from_loader_id(id: &str) -> Self {
        let id = id.to_lowercase();
        if id.contains("neoforge") {
            LoaderKind::NeoForge
        } else if id.contains("forge") {
            LoaderKind::Forge
        } else if id.contains("fabric") {
            LoaderKind::Fabric
        } else if id.contains("quilt") {
            LoaderKind::Quilt
        } else {
            LoaderKind::Unknown
        }
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoaderKind::Vanilla => "vanilla",
            LoaderKind::Forge => "forge",
            LoaderKind::NeoForge => "neoforge",
            LoaderKind::Fabric => "fabric",
            LoaderKind::Quilt => "quilt",
            LoaderKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Cached detection facts for one install directory.
///
/// Once a non-vanilla loader has been detected for a directory the cached
/// kind never reverts to [`LoaderKind::Vanilla`], even if a later refresh
/// finds less evidence (for example after logs rotate away).
#[derive(Debug, Clone)]
pub struct Installation {
    dir: PathBuf,
    minecraft_version: Option<String>,
    loader: LoaderKind,
    loader_version: Option<String>,
}

impl Installation {
    /// Run detection against `dir` and cache the results.
    pub fn detect(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let (loader, loader_version) = detect_loader(&dir);
        let minecraft_version = detect_minecraft_version(&dir);
        tracing::debug!(
            dir = ?dir,
            %loader,
            loader_version = loader_version.as_deref().unwrap_or("-"),
            minecraft_version = minecraft_version.as_deref().unwrap_or("-"),
            "installation detected"
        );
        Self {
            dir,
            minecraft_version,
            loader,
            loader_version,
        }
    }

    /// Re-run detection, keeping a previously detected modded kind if the
    /// fresh pass would downgrade it to vanilla.
    pub fn refresh(&mut self) {
        let fresh = Self::detect(self.dir.clone());
        if fresh.loader.is_modded() || !self.loader.is_modded() {
            self.loader = fresh.loader;
            self.loader_version = fresh.loader_version;
        }
        if fresh.minecraft_version.is_some() {
            self.minecraft_version = fresh.minecraft_version;
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn loader(&self) -> LoaderKind {
        self.loader
    }

    pub fn loader_version(&self) -> Option<&str> {
        self.loader_version.as_deref()
    }

    pub fn minecraft_version(&self) -> Option<&str> {
        self.minecraft_version.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_id_matching_prefers_neoforge_over_forge() {
        assert_eq!(
            LoaderKind::from_loader_id("neoforge-20.4.237"),
            LoaderKind::NeoForge
        );
        assert_eq!(LoaderKind::from_loader_id("forge-47.2.0"), LoaderKind::Forge);
        assert_eq!(
            LoaderKind::from_loader_id("fabric-loader"),
            LoaderKind::Fabric
        );
        assert_eq!(LoaderKind::from_loader_id("quilt-loader"), LoaderKind::Quilt);
        assert_eq!(LoaderKind::from_loader_id("paper"), LoaderKind::Unknown);
    }
}
