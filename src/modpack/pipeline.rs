use crate::config::{Eula, ServerProperties};
use crate::detect::LoaderKind;
use crate::download::download_to_file;
use crate::error::{Error, Result};
use crate::loader::LoaderInstaller;
use crate::modpack::manifest::{ManifestDocument, ModRef, ResolvedManifest};
use crate::server::LogSink;
use crate::sources::{LoaderMetadataSource, ModFileMetadataSource, RuntimeResolver};
use std::fs;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Outcome of a completed modpack installation.
#[derive(Debug)]
pub struct InstallReport {
    pub name: Option<String>,
    pub minecraft_version: String,
    pub loader: LoaderKind,
    pub loader_version: String,
    pub mods_downloaded: usize,
    /// Labels of mods that could not be downloaded. Individual failures do
    /// not abort the installation.
    pub mods_failed: Vec<String>,
}

/// Sequential modpack installation pipeline.
///
/// Stages run strictly in order and, apart from individual mod downloads,
/// any failure aborts the remainder: archive download, extraction, manifest
/// normalization, runtime resolution, mod downloads, overrides merge,
/// loader installation, manifest persistence. The scratch directory is
/// removed whatever the outcome. Progress lines go to the sink around every
/// stage so an embedding UI can narrate the install.
pub struct ModpackInstaller<'a> {
    runtime: &'a dyn RuntimeResolver,
    loader_metadata: &'a dyn LoaderMetadataSource,
    mod_files: &'a dyn ModFileMetadataSource,
    client: reqwest::Client,
}

impl<'a> ModpackInstaller<'a> {
    pub fn new(
        runtime: &'a dyn RuntimeResolver,
        loader_metadata: &'a dyn LoaderMetadataSource,
        mod_files: &'a dyn ModFileMetadataSource,
    ) -> Self {
        Self {
            runtime,
            loader_metadata,
            mod_files,
            client: reqwest::Client::new(),
        }
    }

    /// Install the pack archive at `pack_url` into `install_dir`.
    #[tracing::instrument(skip(self, sink))]
    pub async fn install(
        &self,
        pack_url: &str,
        install_dir: &Path,
        sink: LogSink,
    ) -> Result<InstallReport> {
        fs::create_dir_all(install_dir)
            .map_err(|e| Error::from_io("creating install directory", e))?;
        let scratch = std::env::temp_dir().join(format!("craft-runner-pack-{}", Uuid::new_v4()));
        fs::create_dir_all(&scratch)
            .map_err(|e| Error::from_io("creating scratch directory", e))?;

        let result = self
            .run_stages(pack_url, install_dir, &scratch, &sink)
            .await;

        // Scratch space goes away whether the install worked or not.
        if let Err(e) = fs::remove_dir_all(&scratch) {
            tracing::warn!(error = %e, scratch = ?scratch, "failed to remove scratch directory");
        }
        result
    }

    async fn run_stages(
        &self,
        pack_url: &str,
        install_dir: &Path,
        scratch: &Path,
        sink: &LogSink,
    ) -> Result<InstallReport> {
        sink("[modpack] downloading pack archive");
        let archive_path = scratch.join("pack.zip");
        download_to_file(&self.client, pack_url, &archive_path).await?;

        sink("[modpack] extracting pack archive");
        let extract_dir = scratch.join("extracted");
        extract_archive(archive_path, extract_dir.clone()).await?;

        sink("[modpack] reading manifest");
        let (manifest_path, document) = ManifestDocument::find_in_dir(&extract_dir)?;
        let resolved = document.normalize()?;
        sink(&format!(
            "[modpack] {} for Minecraft {} with {} {}",
            resolved.name.as_deref().unwrap_or("pack"),
            resolved.minecraft_version,
            resolved.loader,
            resolved.loader_version.as_deref().unwrap_or("(auto)")
        ));

        sink("[modpack] resolving java runtime");
        let java = self
            .runtime
            .java_for(&resolved.minecraft_version)
            .await?
            .ok_or_else(|| {
                Error::MissingRuntime(format!(
                    "No java runtime available for Minecraft {}",
                    resolved.minecraft_version
                ))
            })?;

        sink(&format!("[modpack] downloading {} mods", resolved.mods.len()));
        let (mods_downloaded, mods_failed) =
            self.download_mods(&resolved, install_dir, sink).await?;

        sink("[modpack] merging overrides");
        let pack_root = manifest_path.parent().unwrap_or(&extract_dir);
        let overrides = pack_root.join(&resolved.overrides_dir);
        if overrides.is_dir() {
            copy_dir_recursive(&overrides, install_dir)?;
        }

        sink("[modpack] installing mod loader");
        let loader_version = LoaderInstaller::new(self.loader_metadata)
            .java(&java)
            .install(
                install_dir,
                resolved.loader,
                &resolved.minecraft_version,
                resolved.loader_version.as_deref(),
                sink,
            )
            .await?;

        sink("[modpack] saving manifest");
        fs::copy(&manifest_path, install_dir.join(resolved.kind.file_name()))
            .map_err(|e| Error::from_io("persisting manifest", e))?;

        // Pre-accept the EULA and lay down default properties so the first
        // real start does not need a generation-only run.
        Eula::in_dir(install_dir).accept()?;
        ServerProperties::in_dir(install_dir).ensure_defaults()?;

        sink(&format!(
            "[modpack] installation complete ({} mods, {} failed)",
            mods_downloaded,
            mods_failed.len()
        ));
        Ok(InstallReport {
            name: resolved.name.clone(),
            minecraft_version: resolved.minecraft_version.clone(),
            loader: resolved.loader,
            loader_version,
            mods_downloaded,
            mods_failed,
        })
    }

    /// Download every mod the manifest names. Failures are logged, reported
    /// in the result, and skipped; the batch keeps going.
    async fn download_mods(
        &self,
        resolved: &ResolvedManifest,
        install_dir: &Path,
        sink: &LogSink,
    ) -> Result<(usize, Vec<String>)> {
        let mods_dir = install_dir.join("mods");
        fs::create_dir_all(&mods_dir)
            .map_err(|e| Error::from_io("creating mods directory", e))?;

        let mut downloaded = 0;
        let mut failed = Vec::new();
        let total = resolved.mods.len();

        for (index, entry) in resolved.mods.iter().enumerate() {
            let (label, outcome) = match entry {
                ModRef::Direct { path, urls } => {
                    (path.clone(), self.download_direct(install_dir, path, urls).await)
                }
                ModRef::Lookup {
                    project_id,
                    file_id,
                } => match self.mod_files.file_metadata(*project_id, *file_id).await {
                    Ok(meta) => (
                        meta.file_name.clone(),
                        download_to_file(
                            &self.client,
                            &meta.download_url,
                            &mods_dir.join(&meta.file_name),
                        )
                        .await,
                    ),
                    Err(e) => (format!("project {} file {}", project_id, file_id), Err(e)),
                },
            };

            match outcome {
                Ok(()) => {
                    downloaded += 1;
                    sink(&format!("[modpack] mod {}/{}: {}", index + 1, total, label));
                }
                Err(e) => {
                    tracing::warn!(mod_label = %label, error = %e, "mod download failed, skipping");
                    sink(&format!(
                        "[modpack] mod {}/{}: {} FAILED ({})",
                        index + 1,
                        total,
                        label,
                        e
                    ));
                    failed.push(label);
                }
            }
        }
        Ok((downloaded, failed))
    }

    async fn download_direct(
        &self,
        install_dir: &Path,
        rel_path: &str,
        urls: &[String],
    ) -> Result<()> {
        let rel = Path::new(rel_path);
        if rel.is_absolute() || rel.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(Error::Manifest(format!(
                "Refusing manifest file path escaping the install root: '{}'",
                rel_path
            )));
        }
        let dest = install_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::from_io("creating mod file directory", e))?;
        }

        let mut last = None;
        for url in urls {
            match download_to_file(&self.client, url, &dest).await {
                Ok(()) => return Ok(()),
                Err(e) => last = Some(e),
            }
        }
        Err(last.unwrap_or_else(|| {
            Error::Download(format!("No download URLs listed for '{}'", rel_path))
        }))
    }
}

/// Unzip `archive` into `dest` on the blocking pool.
async fn extract_archive(archive: PathBuf, dest: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&archive)
            .map_err(|e| Error::from_io("opening pack archive", e))?;
        let mut zip = zip::ZipArchive::new(file)
            .map_err(|e| Error::Other(format!("Failed to read pack archive: {}", e)))?;
        zip.extract(&dest)
            .map_err(|e| Error::Other(format!("Failed to extract pack archive: {}", e)))
    })
    .await
    .map_err(|e| Error::Other(format!("Extraction task failed: {}", e)))?
}

/// Merge `src` into `dst`, creating directories and overwriting files.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::from_io("creating overrides target", e))?;
    let entries = fs::read_dir(src).map_err(|e| Error::from_io("reading overrides", e))?;
    for entry in entries.flatten() {
        let target = dst.join(entry.file_name());
        let path = entry.path();
        if path.is_dir() {
            copy_dir_recursive(&path, &target)?;
        } else {
            fs::copy(&path, &target).map_err(|e| Error::from_io("copying override file", e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn overrides_merge_is_recursive_and_overwrites() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("overrides");
        let dst = dir.path().join("install");
        fs::create_dir_all(src.join("config/nested")).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("config/common.toml"), "fresh").unwrap();
        fs::write(src.join("config/nested/deep.toml"), "deep").unwrap();
        fs::create_dir_all(dst.join("config")).unwrap();
        fs::write(dst.join("config/common.toml"), "stale").unwrap();

        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(
            fs::read_to_string(dst.join("config/common.toml")).unwrap(),
            "fresh"
        );
        assert_eq!(
            fs::read_to_string(dst.join("config/nested/deep.toml")).unwrap(),
            "deep"
        );
    }
}
