use crate::detect::LoaderKind;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Which manifest schema a pack shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Modrinth,
    CurseForge,
}

impl ManifestKind {
    /// Canonical file name of this manifest inside a pack archive (and,
    /// after installation, inside the install root).
    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestKind::Modrinth => "modrinth.index.json",
            ManifestKind::CurseForge => "manifest.json",
        }
    }
}

/// A modpack manifest as found in a pack archive, in either of the two
/// supported schemas.
///
/// The two formats are structurally disjoint (Modrinth has a required
/// `dependencies` map, CurseForge a required `minecraft` object), so an
/// untagged deserialization picks the right arm.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ManifestDocument {
    Modrinth(ModrinthIndex),
    CurseForge(CurseForgeManifest),
}

/// Modrinth `.mrpack` index.
#[derive(Debug, Deserialize)]
pub struct ModrinthIndex {
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub files: Vec<ModrinthFile>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModrinthFile {
    pub path: String,
    #[serde(default)]
    pub downloads: Vec<String>,
    #[serde(default)]
    pub env: Option<ModrinthEnv>,
}

#[derive(Debug, Deserialize)]
pub struct ModrinthEnv {
    #[serde(default)]
    pub server: Option<String>,
}

/// CurseForge pack manifest.
#[derive(Debug, Deserialize)]
pub struct CurseForgeManifest {
    pub minecraft: CurseForgeMinecraft,
    #[serde(default)]
    pub files: Vec<CurseForgeFileRef>,
    #[serde(default)]
    pub overrides: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CurseForgeMinecraft {
    pub version: String,
    #[serde(rename = "modLoaders", default)]
    pub mod_loaders: Vec<CurseForgeModLoader>,
}

#[derive(Debug, Deserialize)]
pub struct CurseForgeModLoader {
    pub id: String,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Deserialize)]
pub struct CurseForgeFileRef {
    #[serde(rename = "projectID")]
    pub project_id: u64,
    #[serde(rename = "fileID")]
    pub file_id: u64,
}

/// One mod the pipeline must obtain.
#[derive(Debug, Clone)]
pub enum ModRef {
    /// Direct download URLs and a destination path relative to the
    /// install root (Modrinth).
    Direct { path: String, urls: Vec<String> },
    /// A catalog reference needing a metadata lookup first (CurseForge).
    Lookup { project_id: u64, file_id: u64 },
}

/// Both manifest schemas, reduced to the facts the pipeline needs.
#[derive(Debug)]
pub struct ResolvedManifest {
    pub kind: ManifestKind,
    pub name: Option<String>,
    pub minecraft_version: String,
    pub loader: LoaderKind,
    pub loader_version: Option<String>,
    pub mods: Vec<ModRef>,
    /// Directory inside the pack archive whose contents are merged into
    /// the install root.
    pub overrides_dir: String,
}

impl ManifestDocument {
    /// Parse a manifest from its JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::Manifest(format!("Unrecognized manifest format: {}", e)))
    }

    /// Locate and parse a manifest inside an extracted pack directory.
    ///
    /// Looks in `dir` itself, then one level of subdirectories (archives
    /// often wrap their content in a single top-level folder). Returns the
    /// manifest path alongside the document so the pipeline can persist
    /// the file and resolve the overrides directory next to it.
    pub fn find_in_dir(dir: &Path) -> Result<(PathBuf, Self)> {
        let mut roots = vec![dir.to_path_buf()];
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                if entry.path().is_dir() {
                    roots.push(entry.path());
                }
            }
        }
        for root in roots {
            for name in ["modrinth.index.json", "manifest.json"] {
                let candidate = root.join(name);
                if candidate.is_file() {
                    let text = fs::read_to_string(&candidate)
                        .map_err(|e| Error::from_io("reading manifest", e))?;
                    return Ok((candidate, Self::from_json(&text)?));
                }
            }
        }
        Err(Error::Manifest(
            "No modrinth.index.json or manifest.json found in pack archive".to_string(),
        ))
    }

    /// Reduce either schema to a [`ResolvedManifest`].
    ///
    /// Fails before any download work if the manifest names no Minecraft
    /// version or no recognizable loader.
    pub fn normalize(self) -> Result<ResolvedManifest> {
        match self {
            ManifestDocument::Modrinth(index) => normalize_modrinth(index),
            ManifestDocument::CurseForge(manifest) => normalize_curseforge(manifest),
        }
    }
}

fn normalize_modrinth(index: ModrinthIndex) -> Result<ResolvedManifest> {
    let minecraft_version = index
        .dependencies
        .get("minecraft")
        .cloned()
        .ok_or_else(|| Error::Manifest("Manifest names no Minecraft version".to_string()))?;

    // NeoForge before Forge: dependency keys are exact here, but keep the
    // same precedence the id-matching path uses.
    let mut loader = LoaderKind::Unknown;
    let mut loader_version = None;
    for (key, kind) in [
        ("neoforge", LoaderKind::NeoForge),
        ("forge", LoaderKind::Forge),
        ("fabric-loader", LoaderKind::Fabric),
        ("quilt-loader", LoaderKind::Quilt),
    ] {
        if let Some(version) = index.dependencies.get(key) {
            loader = kind;
            loader_version = Some(version.clone());
            break;
        }
    }
    if loader == LoaderKind::Unknown {
        return Err(Error::Manifest(
            "Manifest names no supported mod loader".to_string(),
        ));
    }

    let mods = index
        .files
        .into_iter()
        .filter(|file| {
            // Server-unsupported entries are client resources; skip them.
            file.env
                .as_ref()
                .and_then(|env| env.server.as_deref())
                .map(|server| server != "unsupported")
                .unwrap_or(true)
        })
        .map(|file| ModRef::Direct {
            path: file.path,
            urls: file.downloads,
        })
        .collect();

    Ok(ResolvedManifest {
        kind: ManifestKind::Modrinth,
        name: index.name,
        minecraft_version,
        loader,
        loader_version,
        mods,
        overrides_dir: "overrides".to_string(),
    })
}

fn normalize_curseforge(manifest: CurseForgeManifest) -> Result<ResolvedManifest> {
    if manifest.minecraft.version.is_empty() {
        return Err(Error::Manifest(
            "Manifest names no Minecraft version".to_string(),
        ));
    }

    let loader_ref = manifest
        .minecraft
        .mod_loaders
        .iter()
        .find(|l| l.primary)
        .or_else(|| manifest.minecraft.mod_loaders.first())
        .ok_or_else(|| Error::Manifest("Manifest names no supported mod loader".to_string()))?;

    let loader = LoaderKind::from_loader_id(&loader_ref.id);
    if loader == LoaderKind::Unknown {
        return Err(Error::Manifest(format!(
            "Unrecognized mod loader id '{}'",
            loader_ref.id
        )));
    }
    let loader_version = loader_ref.id.rsplit_once('-').map(|(_, v)| v.to_string());

    let mods = manifest
        .files
        .into_iter()
        .map(|file| ModRef::Lookup {
            project_id: file.project_id,
            file_id: file.file_id,
        })
        .collect();

    Ok(ResolvedManifest {
        kind: ManifestKind::CurseForge,
        name: manifest.name,
        minecraft_version: manifest.minecraft.version,
        loader,
        loader_version,
        mods,
        overrides_dir: manifest
            .overrides
            .unwrap_or_else(|| "overrides".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODRINTH: &str = r#"{
        "formatVersion": 1,
        "name": "Example Pack",
        "dependencies": {"minecraft": "1.20.1", "fabric-loader": "0.15.11"},
        "files": [
            {"path": "mods/fabric-api.jar", "downloads": ["https://cdn.example/fabric-api.jar"]},
            {"path": "mods/sodium.jar", "downloads": ["https://cdn.example/sodium.jar"],
             "env": {"client": "required", "server": "unsupported"}}
        ]
    }"#;

    const CURSEFORGE: &str = r#"{
        "minecraft": {"version": "1.20.1", "modLoaders": [{"id": "neoforge-20.4.237", "primary": true}]},
        "manifestType": "minecraftModpack",
        "name": "Example Pack",
        "files": [{"projectID": 238222, "fileID": 4712864, "required": true}],
        "overrides": "overrides"
    }"#;

    #[test]
    fn modrinth_manifest_normalizes() {
        let resolved = ManifestDocument::from_json(MODRINTH)
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(resolved.kind, ManifestKind::Modrinth);
        assert_eq!(resolved.minecraft_version, "1.20.1");
        assert_eq!(resolved.loader, LoaderKind::Fabric);
        assert_eq!(resolved.loader_version.as_deref(), Some("0.15.11"));
        // The server-unsupported entry is dropped.
        assert_eq!(resolved.mods.len(), 1);
    }

    #[test]
    fn curseforge_manifest_normalizes_with_neoforge_precedence() {
        let resolved = ManifestDocument::from_json(CURSEFORGE)
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(resolved.kind, ManifestKind::CurseForge);
        assert_eq!(resolved.loader, LoaderKind::NeoForge);
        assert_eq!(resolved.loader_version.as_deref(), Some("20.4.237"));
        assert!(matches!(
            resolved.mods[0],
            ModRef::Lookup {
                project_id: 238222,
                file_id: 4712864
            }
        ));
    }

    #[test]
    fn manifest_without_loader_is_rejected() {
        let doc = ManifestDocument::from_json(
            r#"{"dependencies": {"minecraft": "1.20.1"}, "files": []}"#,
        )
        .unwrap();
        assert!(matches!(doc.normalize(), Err(Error::Manifest(_))));
    }

    #[test]
    fn manifest_without_minecraft_version_is_rejected() {
        let doc = ManifestDocument::from_json(
            r#"{"dependencies": {"fabric-loader": "0.15.11"}, "files": []}"#,
        )
        .unwrap();
        assert!(matches!(doc.normalize(), Err(Error::Manifest(_))));
    }

    #[test]
    fn garbage_is_rejected_before_normalization() {
        assert!(ManifestDocument::from_json(r#"{"hello": "world"}"#).is_err());
    }
}
