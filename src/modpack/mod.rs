//! Modpack installation.
//!
//! Handles the two dominant pack distribution formats: Modrinth `.mrpack`
//! archives (direct download URLs per file) and CurseForge pack zips
//! (catalog project/file references resolved through a metadata port).
//! Both reduce to one [`ResolvedManifest`] shape before the pipeline runs.

pub mod manifest;
mod pipeline;

pub use manifest::{ManifestDocument, ManifestKind, ModRef, ResolvedManifest};
pub use pipeline::{InstallReport, ModpackInstaller};
