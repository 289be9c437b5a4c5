use super::LoaderKind;
use std::fs;
use std::path::Path;

/// Detect the installed mod loader and its version for `dir`.
///
/// The chain short-circuits on the first step that yields a named family:
///
/// 1. A saved modpack manifest in the install root
/// 2. Loader directories under `libraries/`
/// 3. Loader jar filenames in the install root
/// 4. Auxiliary text files (`variables.txt`, run scripts)
/// 5. The first ~100 lines of `logs/latest.log`
///
/// Every step is best-effort; unreadable files are skipped, never an error.
/// A directory with no loader evidence is `Vanilla` when it at least holds a
/// recognizable server jar, `Unknown` otherwise.
pub fn detect_loader(dir: &Path) -> (LoaderKind, Option<String>) {
    let steps: [fn(&Path) -> Option<(LoaderKind, Option<String>)>; 5] = [
        from_saved_manifest,
        from_library_tree,
        from_jar_names,
        from_aux_files,
        from_latest_log,
    ];
    for step in steps {
        if let Some(found) = step(dir) {
            return found;
        }
    }
    if has_vanilla_jar(dir) {
        (LoaderKind::Vanilla, None)
    } else {
        (LoaderKind::Unknown, None)
    }
}

fn has_vanilla_jar(dir: &Path) -> bool {
    if dir.join("server.jar").is_file() {
        return true;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        name.starts_with("minecraft_server") && name.ends_with(".jar")
    })
}

fn from_saved_manifest(dir: &Path) -> Option<(LoaderKind, Option<String>)> {
    // Modrinth index: dependencies map keyed by loader id.
    if let Some(doc) = read_json(&dir.join("modrinth.index.json")) {
        let deps = doc.get("dependencies")?.as_object()?;
        for (key, kind) in [
            ("neoforge", LoaderKind::NeoForge),
            ("forge", LoaderKind::Forge),
            ("fabric-loader", LoaderKind::Fabric),
            ("quilt-loader", LoaderKind::Quilt),
        ] {
            if let Some(version) = deps.get(key).and_then(|v| v.as_str()) {
                return Some((kind, Some(version.to_string())));
            }
        }
        return None;
    }

    // CurseForge manifest: minecraft.modLoaders[].id like "forge-47.2.0".
    let doc = read_json(&dir.join("manifest.json"))?;
    let loaders = doc.get("minecraft")?.get("modLoaders")?.as_array()?;
    let id = loaders.first()?.get("id")?.as_str()?;
    let kind = LoaderKind::from_loader_id(id);
    if kind == LoaderKind::Unknown {
        return None;
    }
    let version = id.rsplit_once('-').map(|(_, v)| v.to_string());
    Some((kind, version))
}

fn from_library_tree(dir: &Path) -> Option<(LoaderKind, Option<String>)> {
    // Forge version dirs are named "<mc>-<loader>".
    if let Some(child) = first_subdir(&dir.join("libraries/net/minecraftforge/forge")) {
        let version = child.rsplit_once('-').map(|(_, v)| v.to_string());
        return Some((LoaderKind::Forge, version));
    }
    if let Some(child) = first_subdir(&dir.join("libraries/net/neoforged/neoforge")) {
        return Some((LoaderKind::NeoForge, Some(child)));
    }
    if let Some(child) = first_subdir(&dir.join("libraries/net/fabricmc/fabric-loader")) {
        return Some((LoaderKind::Fabric, Some(child)));
    }
    if let Some(child) = first_subdir(&dir.join("libraries/org/quiltmc/quilt-loader")) {
        return Some((LoaderKind::Quilt, Some(child)));
    }
    None
}

fn from_jar_names(dir: &Path) -> Option<(LoaderKind, Option<String>)> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.ends_with(".jar") || name.contains("installer") {
            continue;
        }
        if name == "fabric-server-launch.jar" || name == "fabric-server-launcher.jar" {
            return Some((LoaderKind::Fabric, None));
        }
        if name.starts_with("quilt-server") {
            return Some((LoaderKind::Quilt, None));
        }
        if name.starts_with("neoforge-") {
            let version = jar_version(&name, "neoforge-");
            return Some((LoaderKind::NeoForge, version));
        }
        if name.starts_with("forge-") {
            let version = jar_version(&name, "forge-");
            return Some((LoaderKind::Forge, version));
        }
    }
    None
}

fn from_aux_files(dir: &Path) -> Option<(LoaderKind, Option<String>)> {
    // ServerPackCreator-style packs ship a variables.txt.
    if let Ok(content) = fs::read_to_string(dir.join("variables.txt")) {
        let mut kind = None;
        let mut version = None;
        for line in content.lines() {
            if let Some(value) = line.strip_prefix("MODLOADER=") {
                kind = Some(LoaderKind::from_loader_id(value.trim()));
            } else if let Some(value) = line.strip_prefix("MODLOADER_VERSION=") {
                version = Some(value.trim().to_string());
            }
        }
        if let Some(kind) = kind.filter(|k| *k != LoaderKind::Unknown) {
            return Some((kind, version));
        }
    }

    // Forge-family run scripts reference the loader's args file by path.
    for script in ["run.sh", "run.bat", "startserver.sh", "startserver.bat"] {
        let Ok(content) = fs::read_to_string(dir.join(script)) else {
            continue;
        };
        if content.contains("neoforged/neoforge") {
            return Some((LoaderKind::NeoForge, args_path_version(&content)));
        }
        if content.contains("minecraftforge/forge") {
            let version = args_path_version(&content)
                .and_then(|v| v.rsplit_once('-').map(|(_, lv)| lv.to_string()));
            return Some((LoaderKind::Forge, version));
        }
        if content.contains("fabric-server-launch") {
            return Some((LoaderKind::Fabric, None));
        }
    }
    None
}

fn from_latest_log(dir: &Path) -> Option<(LoaderKind, Option<String>)> {
    let content = fs::read_to_string(dir.join("logs/latest.log")).ok()?;
    for line in content.lines().take(100) {
        let lower = line.to_lowercase();
        if lower.contains("neoforge") {
            return Some((LoaderKind::NeoForge, None));
        }
        if lower.contains("forge mod loader") || lower.contains("fml") {
            return Some((LoaderKind::Forge, None));
        }
        if lower.contains("fabric loader") {
            let version = lower
                .split("fabric loader ")
                .nth(1)
                .and_then(|rest| rest.split_whitespace().next())
                .map(|v| v.to_string());
            return Some((LoaderKind::Fabric, version));
        }
        if lower.contains("quilt loader") {
            return Some((LoaderKind::Quilt, None));
        }
    }
    None
}

fn read_json(path: &Path) -> Option<serde_json::Value> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// First child directory name under `path`, if any.
fn first_subdir(path: &Path) -> Option<String> {
    let entries = fs::read_dir(path).ok()?;
    for entry in entries.flatten() {
        if entry.file_type().ok()?.is_dir() {
            return Some(entry.file_name().to_string_lossy().to_string());
        }
    }
    None
}

/// Loader version from a jar name like `forge-1.20.1-47.2.0-shim.jar`.
fn jar_version(name: &str, prefix: &str) -> Option<String> {
    let stem = name.strip_prefix(prefix)?.strip_suffix(".jar")?;
    let stem = stem.trim_end_matches("-shim").trim_end_matches("-universal");
    match stem.rsplit_once('-') {
        Some((_, last)) if last.chars().next().is_some_and(|c| c.is_ascii_digit()) => {
            Some(last.to_string())
        }
        _ => Some(stem.to_string()),
    }
}

/// Version directory component from an `@libraries/.../<ver>/unix_args.txt`
/// reference inside a run script.
fn args_path_version(script: &str) -> Option<String> {
    let idx = script.find("_args.txt")?;
    let head = &script[..idx];
    let tail = head.rsplit('/').nth(1)?;
    Some(tail.to_string())
}
