use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Editor for a server's `server.properties` file.
///
/// Operations scan line-by-line; an existing `key=` line is replaced in
/// place, otherwise the key is appended. Files are always rewritten with a
/// trailing newline.
///
/// # Examples
///
/// ```no_run
/// use craft_runner::config::ServerProperties;
///
/// let props = ServerProperties::new("/srv/minecraft/server.properties");
/// props.set("online-mode", "false")?;
/// assert_eq!(props.get("online-mode")?, Some("false".to_string()));
/// # craft_runner::Result::Ok(())
/// ```
pub struct ServerProperties {
    path: PathBuf,
}

impl ServerProperties {
    /// Create an editor for the properties file at `path`. The file is not
    /// touched until an operation runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create an editor for `server.properties` inside `install_dir`.
    pub fn in_dir(install_dir: impl AsRef<Path>) -> Self {
        Self::new(install_dir.as_ref().join("server.properties"))
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value of `key`, or `None` if the file or key is absent.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::from_io("reading server.properties", e))?;

        let prefix = format!("{}=", key);
        for line in content.lines() {
            if let Some(value) = line.trim().strip_prefix(&prefix) {
                return Ok(Some(value.to_string()));
            }
        }
        Ok(None)
    }

    /// Upsert `key=value`.
    ///
    /// If the key exists its line is replaced in place, leaving the file's
    /// line count unchanged; otherwise the pair is appended. The file is
    /// created if it does not exist.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let content = if self.path.exists() {
            fs::read_to_string(&self.path)
                .map_err(|e| Error::from_io("reading server.properties", e))?
        } else {
            String::new()
        };

        let prefix = format!("{}=", key);
        let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
        let mut replaced = false;

        for line in lines.iter_mut() {
            if line.trim().starts_with(&prefix) {
                *line = format!("{}={}", key, value);
                replaced = true;
                break;
            }
        }
        if !replaced {
            lines.push(format!("{}={}", key, value));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        fs::write(&self.path, out).map_err(|e| Error::from_io("writing server.properties", e))?;

        tracing::debug!(key, value, "server.properties updated");
        Ok(())
    }

    /// Validate that a generated properties file is usable: minimum size and
    /// presence of the keys every server generation writes.
    ///
    /// A file that exists but fails these checks is treated the same as one
    /// that was never generated.
    pub fn validate_generated(&self) -> Result<()> {
        let meta = fs::metadata(&self.path)
            .map_err(|_| Error::Validation("server.properties was not generated".to_string()))?;
        if meta.len() < 500 {
            return Err(Error::Validation(format!(
                "server.properties too small: {} bytes",
                meta.len()
            )));
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::from_io("reading server.properties", e))?;
        for required in ["server-port=", "difficulty=", "gamemode="] {
            if !content.contains(required) {
                return Err(Error::Validation(format!(
                    "server.properties missing '{}'",
                    required
                )));
            }
        }
        Ok(())
    }

    /// Write a complete default properties file if none exists yet, so a
    /// freshly installed server can start without a generation-only run.
    /// Existing files are never overwritten.
    pub fn ensure_defaults(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        tracing::info!(path = ?self.path, "writing default server.properties");
        fs::write(&self.path, DEFAULT_PROPERTIES)
            .map_err(|e| Error::from_io("writing server.properties", e))?;
        Ok(())
    }
}

/// Default `server.properties` content, compatible with Minecraft 1.19.2+.
const DEFAULT_PROPERTIES: &str = "\
#Minecraft server properties
#Auto-generated by craft-runner
enable-jmx-monitoring=false
rcon.port=25575
level-seed=
gamemode=survival
enable-command-block=false
enable-query=false
generator-settings={}
enforce-secure-profile=false
level-name=world
motd=A Minecraft Server
query.port=25565
pvp=true
generate-structures=true
max-chained-neighbor-updates=1000000
difficulty=normal
network-compression-threshold=256
max-tick-time=60000
require-resource-pack=false
use-native-transport=true
max-players=20
online-mode=false
enable-status=true
allow-flight=false
initial-disabled-packs=
broadcast-rcon-to-ops=true
view-distance=10
server-ip=
resource-pack-prompt=
allow-nether=true
server-port=25565
enable-rcon=false
sync-chunk-writes=true
op-permission-level=4
prevent-proxy-connections=false
hide-online-players=false
resource-pack=
entity-broadcast-range-percentage=100
simulation-distance=10
rcon.password=
player-idle-timeout=0
force-gamemode=false
rate-limit=0
hardcore=false
white-list=false
broadcast-console-to-ops=true
spawn-npcs=true
spawn-animals=true
function-permission-level=2
initial-enabled-packs=vanilla
level-type=minecraft\\:normal
text-filtering-config=
spawn-monsters=true
enforce-whitelist=false
spawn-protection=16
resource-pack-sha1=
max-world-size=29999984
";

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_replaces_in_place_without_changing_line_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.properties");
        fs::write(&path, "a=1\ndifficulty=hard\nb=2\n").unwrap();

        let props = ServerProperties::new(&path);
        props.set("difficulty", "normal").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert_eq!(content, "a=1\ndifficulty=normal\nb=2\n");
    }

    #[test]
    fn set_appends_missing_key_with_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.properties");
        fs::write(&path, "a=1").unwrap();

        let props = ServerProperties::new(&path);
        props.set("motd", "hello").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a=1\nmotd=hello\n");
    }

    #[test]
    fn get_returns_none_for_absent_file() {
        let dir = tempdir().unwrap();
        let props = ServerProperties::in_dir(dir.path());
        assert_eq!(props.get("difficulty").unwrap(), None);
    }

    #[test]
    fn ensure_defaults_passes_validation() {
        let dir = tempdir().unwrap();
        let props = ServerProperties::in_dir(dir.path());
        props.ensure_defaults().unwrap();
        props.validate_generated().unwrap();
        assert_eq!(props.get("online-mode").unwrap(), Some("false".into()));
    }

    #[test]
    fn validation_rejects_undersized_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.properties");
        fs::write(&path, "server-port=25565\ndifficulty=normal\ngamemode=survival\n").unwrap();

        let props = ServerProperties::new(&path);
        assert!(props.validate_generated().is_err());
    }
}
