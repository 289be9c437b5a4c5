//! End-to-end modpack installation tests.
//!
//! Pack archives and mod files are served by an in-process HTTP mock; the
//! collaborator ports are hand-rolled fakes.

use async_trait::async_trait;
use craft_runner::detect::LoaderKind;
use craft_runner::modpack::ModpackInstaller;
use craft_runner::server::LogSink;
use craft_runner::sources::{
    LoaderMetadata, LoaderMetadataSource, ModFileMetadata, ModFileMetadataSource, RuntimeResolver,
};
use craft_runner::{Error, Result};
use httpmock::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

struct FakeRuntime {
    java: Option<PathBuf>,
}

#[async_trait]
impl RuntimeResolver for FakeRuntime {
    async fn java_for(&self, _minecraft_version: &str) -> Result<Option<PathBuf>> {
        Ok(self.java.clone())
    }
}

struct FakeLoaderMeta {
    download_url: String,
}

#[async_trait]
impl LoaderMetadataSource for FakeLoaderMeta {
    async fn resolve(
        &self,
        _kind: LoaderKind,
        _minecraft_version: &str,
        loader_version: Option<&str>,
    ) -> Result<LoaderMetadata> {
        Ok(LoaderMetadata {
            version: loader_version.unwrap_or("0.15.11").to_string(),
            download_url: self.download_url.clone(),
        })
    }
}

struct FakeModFiles {
    base_url: String,
}

#[async_trait]
impl ModFileMetadataSource for FakeModFiles {
    async fn file_metadata(&self, project_id: u64, file_id: u64) -> Result<ModFileMetadata> {
        Ok(ModFileMetadata {
            file_name: format!("mod-{}-{}.jar", project_id, file_id),
            download_url: format!("{}/files/{}/{}", self.base_url, project_id, file_id),
        })
    }
}

fn null_sink() -> LogSink {
    Arc::new(|_| {})
}

fn build_pack_zip(manifest_name: &str, manifest: &str, extra_files: &[(&str, &str)]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(manifest_name, options).unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
        for (path, content) in extra_files {
            zip.start_file(*path, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

#[tokio::test]
async fn installs_a_modrinth_pack_end_to_end() {
    let server = MockServer::start_async().await;
    let manifest = format!(
        r#"{{
            "formatVersion": 1,
            "name": "Test Pack",
            "dependencies": {{"minecraft": "1.20.1", "fabric-loader": "0.15.11"}},
            "files": [
                {{"path": "mods/fabric-api.jar", "downloads": ["{0}/cdn/fabric-api.jar"]}},
                {{"path": "mods/create.jar", "downloads": ["{0}/cdn/create.jar"]}}
            ]
        }}"#,
        server.base_url()
    );
    let pack = build_pack_zip(
        "modrinth.index.json",
        &manifest,
        &[("overrides/config/common.toml", "render_distance = 8")],
    );

    server
        .mock_async(|when, then| {
            when.method(GET).path("/pack.mrpack");
            then.status(200).body(pack.clone());
        })
        .await;
    for jar in ["fabric-api.jar", "create.jar"] {
        server
            .mock_async(move |when, then| {
                when.method(GET).path(format!("/cdn/{jar}"));
                then.status(200).body(b"jar bytes");
            })
            .await;
    }
    server
        .mock_async(|when, then| {
            when.method(GET).path("/loader/fabric-server-launch.jar");
            then.status(200).body(b"launcher bytes");
        })
        .await;

    let install_dir = tempdir().unwrap();
    let runtime = FakeRuntime {
        java: Some(PathBuf::from("/usr/bin/java")),
    };
    let loader_meta = FakeLoaderMeta {
        download_url: server.url("/loader/fabric-server-launch.jar"),
    };
    let mod_files = FakeModFiles {
        base_url: server.base_url(),
    };

    let report = ModpackInstaller::new(&runtime, &loader_meta, &mod_files)
        .install(&server.url("/pack.mrpack"), install_dir.path(), null_sink())
        .await
        .unwrap();

    assert_eq!(report.name.as_deref(), Some("Test Pack"));
    assert_eq!(report.minecraft_version, "1.20.1");
    assert_eq!(report.loader, LoaderKind::Fabric);
    assert_eq!(report.mods_downloaded, 2);
    assert!(report.mods_failed.is_empty());

    let root = install_dir.path();
    assert!(root.join("mods/fabric-api.jar").is_file());
    assert!(root.join("mods/create.jar").is_file());
    assert!(root.join("fabric-server-launch.jar").is_file());
    assert_eq!(
        std::fs::read_to_string(root.join("config/common.toml")).unwrap(),
        "render_distance = 8"
    );
    // The manifest is persisted so later detection can read it.
    assert!(root.join("modrinth.index.json").is_file());
    // First start should not need a generation-only run.
    assert!(std::fs::read_to_string(root.join("eula.txt"))
        .unwrap()
        .contains("eula=true"));
    assert!(root.join("server.properties").is_file());
}

#[tokio::test]
async fn individual_mod_failures_are_skipped_not_fatal() {
    let server = MockServer::start_async().await;
    let files: Vec<String> = (1..=10)
        .map(|i| format!(r#"{{"projectID": {i}, "fileID": {}, "required": true}}"#, i * 10))
        .collect();
    let manifest = format!(
        r#"{{
            "minecraft": {{"version": "1.20.1", "modLoaders": [{{"id": "fabric-0.15.11", "primary": true}}]}},
            "manifestType": "minecraftModpack",
            "name": "Flaky Pack",
            "files": [{}],
            "overrides": "overrides"
        }}"#,
        files.join(",")
    );
    let pack = build_pack_zip("manifest.json", &manifest, &[]);

    server
        .mock_async(|when, then| {
            when.method(GET).path("/pack.zip");
            then.status(200).body(pack.clone());
        })
        .await;
    // Eight of the ten references resolve; two are gone from the CDN.
    for i in 1..=10 {
        server
            .mock_async(move |when, then| {
                when.method(GET).path(format!("/files/{i}/{}", i * 10));
                if i <= 8 {
                    then.status(200).body(b"good jar");
                } else {
                    then.status(404);
                }
            })
            .await;
    }
    server
        .mock_async(|when, then| {
            when.method(GET).path("/loader/fabric-server-launch.jar");
            then.status(200).body(b"launcher bytes");
        })
        .await;

    let install_dir = tempdir().unwrap();
    let runtime = FakeRuntime {
        java: Some(PathBuf::from("/usr/bin/java")),
    };
    let loader_meta = FakeLoaderMeta {
        download_url: server.url("/loader/fabric-server-launch.jar"),
    };
    let mod_files = FakeModFiles {
        base_url: server.base_url(),
    };

    let report = ModpackInstaller::new(&runtime, &loader_meta, &mod_files)
        .install(&server.url("/pack.zip"), install_dir.path(), null_sink())
        .await
        .unwrap();

    assert_eq!(report.mods_downloaded, 8);
    assert_eq!(
        report.mods_failed,
        vec!["mod-9-90.jar".to_string(), "mod-10-100.jar".to_string()]
    );
    assert!(install_dir.path().join("mods/mod-1-10.jar").is_file());
    assert!(install_dir.path().join("mods/mod-8-80.jar").is_file());
    // Failures did not stop the later stages.
    assert!(install_dir.path().join("manifest.json").is_file());
    assert!(install_dir.path().join("fabric-server-launch.jar").is_file());
}

#[tokio::test]
async fn incomplete_manifest_aborts_before_any_download() {
    let server = MockServer::start_async().await;
    // No loader named: must fail at normalization, before mods or loader.
    let manifest = r#"{
        "formatVersion": 1,
        "dependencies": {"minecraft": "1.20.1"},
        "files": [{"path": "mods/x.jar", "downloads": ["http://127.0.0.1:9/x.jar"]}]
    }"#;
    let pack = build_pack_zip("modrinth.index.json", manifest, &[]);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pack.mrpack");
            then.status(200).body(pack.clone());
        })
        .await;

    let install_dir = tempdir().unwrap();
    let runtime = FakeRuntime {
        java: Some(PathBuf::from("/usr/bin/java")),
    };
    let loader_meta = FakeLoaderMeta {
        download_url: String::new(),
    };
    let mod_files = FakeModFiles {
        base_url: server.base_url(),
    };

    let err = ModpackInstaller::new(&runtime, &loader_meta, &mod_files)
        .install(&server.url("/pack.mrpack"), install_dir.path(), null_sink())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Manifest(_)));
    assert!(!install_dir.path().join("mods").exists());
}

#[tokio::test]
async fn missing_runtime_aborts_before_mod_downloads() {
    let server = MockServer::start_async().await;
    let manifest = format!(
        r#"{{
            "formatVersion": 1,
            "dependencies": {{"minecraft": "1.20.1", "fabric-loader": "0.15.11"}},
            "files": [{{"path": "mods/x.jar", "downloads": ["{}/cdn/x.jar"]}}]
        }}"#,
        server.base_url()
    );
    let pack = build_pack_zip("modrinth.index.json", &manifest, &[]);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pack.mrpack");
            then.status(200).body(pack.clone());
        })
        .await;
    let jar_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/cdn/x.jar");
            then.status(200).body(b"jar");
        })
        .await;

    let install_dir = tempdir().unwrap();
    let runtime = FakeRuntime { java: None };
    let loader_meta = FakeLoaderMeta {
        download_url: String::new(),
    };
    let mod_files = FakeModFiles {
        base_url: server.base_url(),
    };

    let err = ModpackInstaller::new(&runtime, &loader_meta, &mod_files)
        .install(&server.url("/pack.mrpack"), install_dir.path(), null_sink())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingRuntime(_)));
    assert_eq!(jar_mock.hits_async().await, 0);
}
