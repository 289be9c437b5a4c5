use crate::detect::{Installation, LoaderKind};
use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// A fully resolved launch command: program, arguments, working directory.
///
/// Built by the constructors below; the controller runs it verbatim.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

/// Heap recommendation in megabytes for a modded server, by mod count.
pub fn recommend_ram_mb(mod_count: usize) -> u32 {
    match mod_count {
        0 => 2048,
        1..=25 => 4096,
        26..=50 => 6144,
        _ => 8192,
    }
}

impl LaunchSpec {
    /// Plain single-jar launch: `java -Xmx.. -Xms.. -jar <jar> nogui`.
    pub fn vanilla(
        dir: impl Into<PathBuf>,
        jar: impl AsRef<str>,
        ram_mb: u32,
        java: Option<&Path>,
    ) -> Self {
        Self {
            program: java_program(java),
            args: vec![
                format!("-Xmx{}M", ram_mb),
                format!("-Xms{}M", ram_mb),
                "-jar".to_string(),
                jar.as_ref().to_string(),
                "nogui".to_string(),
            ],
            dir: dir.into(),
        }
    }

    /// Loader installer invocation: headless java running the installer jar
    /// with `--installServer`.
    pub fn installer(dir: impl Into<PathBuf>, installer_jar: impl AsRef<str>, java: Option<&Path>) -> Self {
        Self {
            program: java_program(java),
            args: vec![
                "-Djava.awt.headless=true".to_string(),
                "-jar".to_string(),
                installer_jar.as_ref().to_string(),
                "--installServer".to_string(),
            ],
            dir: dir.into(),
        }
    }

    /// Build the launch command appropriate for a detected installation.
    ///
    /// Forge and NeoForge launch through their generated argument files
    /// (`@user_jvm_args.txt @libraries/.../unix_args.txt`), with the heap
    /// size rewritten into `user_jvm_args.txt` first. Fabric and Quilt run
    /// their server-launcher jar; everything else runs the vanilla jar.
    pub fn for_installation(
        installation: &Installation,
        ram_mb: u32,
        java: Option<&Path>,
    ) -> Result<Self> {
        let dir = installation.dir();
        match installation.loader() {
            LoaderKind::Forge | LoaderKind::NeoForge => {
                let args_file = find_args_file(dir, installation.loader()).ok_or_else(|| {
                    Error::Process(format!(
                        "No {} argument file found under libraries/; is the loader installed?",
                        installation.loader()
                    ))
                })?;
                write_user_jvm_args(dir, ram_mb)?;
                Ok(Self {
                    program: java_program(java),
                    args: vec![
                        "@user_jvm_args.txt".to_string(),
                        format!("@{}", args_file),
                        "nogui".to_string(),
                    ],
                    dir: dir.to_path_buf(),
                })
            }
            LoaderKind::Fabric | LoaderKind::Quilt => {
                let jar = find_launcher_jar(dir, installation.loader()).ok_or_else(|| {
                    Error::Process(format!(
                        "No {} server launcher jar found in install directory",
                        installation.loader()
                    ))
                })?;
                Ok(Self::vanilla(dir, jar, ram_mb, java))
            }
            LoaderKind::Vanilla | LoaderKind::Unknown => {
                let jar = find_server_jar(dir).ok_or_else(|| {
                    Error::Process("No server jar found in install directory".to_string())
                })?;
                Ok(Self::vanilla(dir, jar, ram_mb, java))
            }
        }
    }
}

fn java_program(java: Option<&Path>) -> String {
    java.map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "java".to_string())
}

/// Relative path (from the install root) of the loader's generated
/// platform argument file.
fn find_args_file(dir: &Path, kind: LoaderKind) -> Option<String> {
    let family_dir = match kind {
        LoaderKind::Forge => "libraries/net/minecraftforge/forge",
        LoaderKind::NeoForge => "libraries/net/neoforged/neoforge",
        _ => return None,
    };
    let file_name = if cfg!(windows) {
        "win_args.txt"
    } else {
        "unix_args.txt"
    };

    let entries = fs::read_dir(dir.join(family_dir)).ok()?;
    for entry in entries.flatten() {
        let candidate = entry.path().join(file_name);
        if candidate.is_file() {
            let version = entry.file_name().to_string_lossy().to_string();
            return Some(format!("{}/{}/{}", family_dir, version, file_name));
        }
    }
    None
}

/// Rewrite (or create) `user_jvm_args.txt` so its `-Xmx` matches `ram_mb`.
fn write_user_jvm_args(dir: &Path, ram_mb: u32) -> Result<()> {
    let path = dir.join("user_jvm_args.txt");
    let xmx = format!("-Xmx{}M", ram_mb);

    let content = if path.exists() {
        fs::read_to_string(&path).map_err(|e| Error::from_io("reading user_jvm_args.txt", e))?
    } else {
        String::new()
    };

    let re = Regex::new(r"-Xmx\d+[MGmg]").unwrap();
    let updated = if re.is_match(&content) {
        re.replace(&content, xmx.as_str()).to_string()
    } else {
        let mut out = content;
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&xmx);
        out.push('\n');
        out
    };

    fs::write(&path, updated).map_err(|e| Error::from_io("writing user_jvm_args.txt", e))
}

fn find_launcher_jar(dir: &Path, kind: LoaderKind) -> Option<String> {
    let candidates: &[&str] = match kind {
        LoaderKind::Fabric => &["fabric-server-launch.jar", "fabric-server-launcher.jar"],
        LoaderKind::Quilt => &["quilt-server-launch.jar", "quilt-server-launcher.jar"],
        _ => return None,
    };
    candidates
        .iter()
        .find(|name| dir.join(name).is_file())
        .map(|name| name.to_string())
}

fn find_server_jar(dir: &Path) -> Option<String> {
    if dir.join("server.jar").is_file() {
        return Some("server.jar".to_string());
    }
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("minecraft_server") && name.ends_with(".jar") {
            return Some(name);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Installation;
    use tempfile::tempdir;

    #[test]
    fn ram_recommendation_scales_with_mod_count() {
        assert_eq!(recommend_ram_mb(0), 2048);
        assert_eq!(recommend_ram_mb(10), 4096);
        assert_eq!(recommend_ram_mb(40), 6144);
        assert_eq!(recommend_ram_mb(120), 8192);
    }

    #[test]
    fn vanilla_spec_uses_heap_flags_and_nogui() {
        let spec = LaunchSpec::vanilla("/srv", "server.jar", 4096, None);
        assert_eq!(spec.program, "java");
        assert_eq!(
            spec.args,
            vec!["-Xmx4096M", "-Xms4096M", "-jar", "server.jar", "nogui"]
        );
    }

    #[test]
    fn forge_spec_references_args_files() {
        let dir = tempdir().unwrap();
        let version_dir = dir
            .path()
            .join("libraries/net/minecraftforge/forge/1.20.1-47.2.0");
        fs::create_dir_all(&version_dir).unwrap();
        fs::write(version_dir.join("unix_args.txt"), "-cp ...").unwrap();
        fs::write(version_dir.join("win_args.txt"), "-cp ...").unwrap();
        fs::write(dir.path().join("user_jvm_args.txt"), "# comment\n-Xmx4G\n").unwrap();

        let inst = Installation::detect(dir.path());
        let spec = LaunchSpec::for_installation(&inst, 6144, None).unwrap();

        assert_eq!(spec.args[0], "@user_jvm_args.txt");
        assert!(spec.args[1].starts_with("@libraries/net/minecraftforge/forge/1.20.1-47.2.0/"));
        assert_eq!(spec.args[2], "nogui");

        let jvm_args = fs::read_to_string(dir.path().join("user_jvm_args.txt")).unwrap();
        assert!(jvm_args.contains("-Xmx6144M"));
        assert!(jvm_args.contains("# comment"));
        assert!(!jvm_args.contains("-Xmx4G"));
    }

    #[test]
    fn user_jvm_args_created_when_absent() {
        let dir = tempdir().unwrap();
        write_user_jvm_args(dir.path(), 2048).unwrap();
        let content = fs::read_to_string(dir.path().join("user_jvm_args.txt")).unwrap();
        assert_eq!(content, "-Xmx2048M\n");
    }

    #[test]
    fn missing_loader_artifacts_fail_with_process_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("fabric-server-launch.jar"), b"jar").unwrap();
        // Remove the launcher jar so the fabric branch has nothing to run.
        let inst = Installation::detect(dir.path());
        fs::remove_file(dir.path().join("fabric-server-launch.jar")).unwrap();

        assert!(LaunchSpec::for_installation(&inst, 2048, None).is_err());
    }
}
