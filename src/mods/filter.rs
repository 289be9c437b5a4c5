use super::patterns::CLIENT_ONLY_PATTERNS;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Directory (sibling of `mods/`) receiving quarantined jars.
pub const QUARANTINE_DIR: &str = "mods_disabled_client";

/// Whether a jar file name matches the client-only pattern list.
pub fn is_client_only(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    CLIENT_ONLY_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Move client-only jars out of `mods_dir` into the sibling quarantine
/// directory, preserving file names.
///
/// Returns the names of the jars moved by this call. Idempotent: already
/// quarantined files are no longer in `mods_dir` and a second run moves
/// nothing. A missing `mods_dir` is a no-op, not an error. Runs before
/// every modded start so packs updated in place stay clean.
#[tracing::instrument(skip_all, fields(mods_dir = ?mods_dir))]
pub fn quarantine(mods_dir: &Path) -> Result<Vec<String>> {
    if !mods_dir.is_dir() {
        return Ok(Vec::new());
    }

    let quarantine_dir = mods_dir
        .parent()
        .map(|p| p.join(QUARANTINE_DIR))
        .unwrap_or_else(|| mods_dir.join(QUARANTINE_DIR));

    let mut moved = Vec::new();
    let entries =
        fs::read_dir(mods_dir).map_err(|e| Error::from_io("reading mods directory", e))?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.to_lowercase().ends_with(".jar") || !is_client_only(&name) {
            continue;
        }
        if moved.is_empty() {
            fs::create_dir_all(&quarantine_dir)
                .map_err(|e| Error::from_io("creating quarantine directory", e))?;
        }
        fs::rename(entry.path(), quarantine_dir.join(&name))
            .map_err(|e| Error::from_io("quarantining mod", e))?;
        tracing::info!(jar = %name, "quarantined client-only mod");
        moved.push(name);
    }

    if !moved.is_empty() {
        tracing::info!(count = moved.len(), "client-only mods quarantined");
    }
    Ok(moved)
}
