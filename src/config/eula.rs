use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Editor for a server's `eula.txt`.
///
/// Mojang servers refuse to start until the file contains `eula=true`.
/// [`Eula::accept`] is idempotent and preserves any comment lines the server
/// wrote when it generated the file.
pub struct Eula {
    path: PathBuf,
}

impl Eula {
    /// Create an editor for the EULA file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create an editor for `eula.txt` inside `install_dir`.
    pub fn in_dir(install_dir: impl AsRef<Path>) -> Self {
        Self::new(install_dir.as_ref().join("eula.txt"))
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file currently records acceptance.
    pub fn is_accepted(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| Error::from_io("reading eula.txt", e))?;
        Ok(content.contains("eula=true"))
    }

    /// Mark the EULA as accepted.
    ///
    /// An absent or empty file is created pre-accepted with a leading comment
    /// line and exactly one `eula=true` token. An existing `eula=false` is
    /// rewritten by substring substitution, keeping the server-generated
    /// comments intact. Calling this on an already-accepted file is a no-op.
    pub fn accept(&self) -> Result<()> {
        let existing = if self.path.exists() {
            fs::read_to_string(&self.path).map_err(|e| Error::from_io("reading eula.txt", e))?
        } else {
            String::new()
        };

        if existing.contains("eula=true") {
            return Ok(());
        }

        let updated = if existing.contains("eula=false") {
            existing.replace("eula=false", "eula=true")
        } else {
            "#By changing the setting below to TRUE you are indicating your agreement to the Minecraft EULA (https://aka.ms/MinecraftEULA).\neula=true\n"
                .to_string()
        };

        fs::write(&self.path, updated).map_err(|e| Error::from_io("writing eula.txt", e))?;
        tracing::info!(path = ?self.path, "EULA accepted");
        Ok(())
    }

    /// Validate that a server-generated `eula.txt` is complete: minimum size
    /// and presence of the `eula=` token.
    ///
    /// Used between bootstrap phases to distinguish a fully written file from
    /// a partial one caught mid-flush.
    pub fn validate_generated(&self) -> Result<()> {
        let meta = fs::metadata(&self.path)
            .map_err(|_| Error::Validation("eula.txt was not generated".to_string()))?;
        if meta.len() < 50 {
            return Err(Error::Validation(format!(
                "eula.txt too small: {} bytes",
                meta.len()
            )));
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| Error::from_io("reading eula.txt", e))?;
        if !content.contains("eula=") {
            return Err(Error::Validation(
                "eula.txt missing 'eula=' token".to_string(),
            ));
        }
        Ok(())
    }
}
