use std::fs;
use std::path::Path;

/// Detect the Minecraft version an install directory targets.
///
/// Runs the same kind of short-circuiting evidence chain as loader
/// detection: saved manifests, the `libraries/` tree, auxiliary text files,
/// then the latest server log. Returns the version string verbatim.
pub fn detect_minecraft_version(dir: &Path) -> Option<String> {
    from_saved_manifest(dir)
        .or_else(|| from_library_tree(dir))
        .or_else(|| from_jar_names(dir))
        .or_else(|| from_aux_files(dir))
        .or_else(|| from_latest_log(dir))
}

/// Map a NeoForge loader version to the Minecraft version it targets.
///
/// NeoForge versions follow `MAJOR.MINOR.PATCH` where `MAJOR.MINOR` encode
/// the Minecraft minor/patch: `20.4.237` targets Minecraft `1.20.4`, and a
/// zero minor collapses (`21.0.8` targets `1.21`).
pub(crate) fn neoforge_to_minecraft(loader_version: &str) -> Option<String> {
    let mut parts = loader_version.split('.');
    let major = parts.next()?.parse::<u32>().ok()?;
    let minor = parts.next()?.parse::<u32>().ok()?;
    if minor == 0 {
        Some(format!("1.{}", major))
    } else {
        Some(format!("1.{}.{}", major, minor))
    }
}

fn from_saved_manifest(dir: &Path) -> Option<String> {
    if let Ok(content) = fs::read_to_string(dir.join("modrinth.index.json")) {
        if let Ok(doc) = serde_json::from_str::<serde_json::Value>(&content) {
            if let Some(v) = doc
                .get("dependencies")
                .and_then(|d| d.get("minecraft"))
                .and_then(|v| v.as_str())
            {
                return Some(v.to_string());
            }
        }
    }
    let content = fs::read_to_string(dir.join("manifest.json")).ok()?;
    let doc: serde_json::Value = serde_json::from_str(&content).ok()?;
    doc.get("minecraft")?
        .get("version")?
        .as_str()
        .map(|v| v.to_string())
}

fn from_library_tree(dir: &Path) -> Option<String> {
    // Forge version dirs embed the Minecraft version directly.
    if let Some(child) = first_subdir(&dir.join("libraries/net/minecraftforge/forge")) {
        if let Some((mc, _)) = child.rsplit_once('-') {
            return Some(mc.to_string());
        }
    }
    // NeoForge's version encodes it.
    if let Some(child) = first_subdir(&dir.join("libraries/net/neoforged/neoforge")) {
        return neoforge_to_minecraft(&child);
    }
    None
}

/// Forge jar names carry both versions: `forge-<mc>-<loader>.jar`.
fn from_jar_names(dir: &Path) -> Option<String> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.ends_with(".jar") || name.contains("installer") {
            continue;
        }
        if let Some(stem) = name.strip_prefix("forge-").and_then(|n| n.strip_suffix(".jar")) {
            if let Some((mc, _)) = stem.split_once('-') {
                if mc.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    return Some(mc.to_string());
                }
            }
        }
        if let Some(stem) = name
            .strip_prefix("neoforge-")
            .and_then(|n| n.strip_suffix(".jar"))
        {
            return neoforge_to_minecraft(stem);
        }
    }
    None
}

fn from_aux_files(dir: &Path) -> Option<String> {
    if let Ok(content) = fs::read_to_string(dir.join("variables.txt")) {
        for line in content.lines() {
            if let Some(value) = line.strip_prefix("MINECRAFT_VERSION=") {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    for script in ["run.sh", "run.bat", "startserver.sh", "startserver.bat"] {
        let Ok(content) = fs::read_to_string(dir.join(script)) else {
            continue;
        };
        // "@libraries/net/minecraftforge/forge/<mc>-<loader>/unix_args.txt"
        if let Some(idx) = content.find("minecraftforge/forge/") {
            let rest = &content[idx + "minecraftforge/forge/".len()..];
            if let Some(dir_name) = rest.split('/').next() {
                if let Some((mc, _)) = dir_name.rsplit_once('-') {
                    return Some(mc.to_string());
                }
            }
        }
        if let Some(idx) = content.find("neoforged/neoforge/") {
            let rest = &content[idx + "neoforged/neoforge/".len()..];
            if let Some(dir_name) = rest.split('/').next() {
                return neoforge_to_minecraft(dir_name);
            }
        }
    }
    None
}

fn from_latest_log(dir: &Path) -> Option<String> {
    let content = fs::read_to_string(dir.join("logs/latest.log")).ok()?;
    for line in content.lines().take(100) {
        let lower = line.to_lowercase();
        if let Some(idx) = lower.find("minecraft server version ") {
            let rest = &line[idx + "minecraft server version ".len()..];
            if let Some(v) = rest.split_whitespace().next() {
                return Some(v.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '.')
                    .to_string());
            }
        }
        if let Some(idx) = lower.find("loading minecraft ") {
            let rest = &line[idx + "loading minecraft ".len()..];
            if let Some(v) = rest.split_whitespace().next() {
                return Some(v.to_string());
            }
        }
    }
    None
}

fn first_subdir(path: &Path) -> Option<String> {
    let entries = fs::read_dir(path).ok()?;
    for entry in entries.flatten() {
        if entry.file_type().ok()?.is_dir() {
            return Some(entry.file_name().to_string_lossy().to_string());
        }
    }
    None
}
