//! First-run sequencer integration tests.
//!
//! A shell script stands in for the java runtime: on its first run it
//! generates `eula.txt` the way a real server does, on its second run
//! `server.properties`, then it idles until terminated.
#![cfg(unix)]

use craft_runner::config::{Eula, ServerProperties};
use craft_runner::detect::Installation;
use craft_runner::provision::FirstRunSequencer;
use craft_runner::server::LogSink;
use craft_runner::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

const FAKE_SERVER: &str = r#"#!/bin/sh
if [ ! -f eula.txt ]; then
    printf '#By changing the setting below to TRUE you agree to the EULA.\neula=false\n' > eula.txt
elif [ ! -f server.properties ]; then
    {
        printf '#Minecraft server properties\n'
        printf 'server-port=25565\ndifficulty=easy\ngamemode=survival\n'
        printf 'level-name=world\nmotd=A Minecraft Server\nmax-players=20\n'
        printf 'view-distance=10\nsimulation-distance=10\nonline-mode=true\n'
        printf 'pvp=true\nspawn-protection=16\nallow-nether=true\n'
        printf 'enable-command-block=false\nwhite-list=false\nhardcore=false\n'
        printf 'spawn-monsters=true\nspawn-animals=true\nspawn-npcs=true\n'
        printf 'generate-structures=true\nallow-flight=false\nforce-gamemode=false\n'
        printf 'enable-query=false\nenable-rcon=false\nenable-status=true\n'
        printf 'sync-chunk-writes=true\nop-permission-level=4\n'
        printf 'network-compression-threshold=256\nmax-tick-time=60000\n'
        printf 'prevent-proxy-connections=false\nrate-limit=0\nserver-ip=\n'
    } > server.properties
fi
sleep 30
"#;

fn write_fake_java(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("fake-java");
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn null_sink() -> LogSink {
    Arc::new(|_| {})
}

#[tokio::test]
async fn bootstraps_eula_and_properties_in_two_phases() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("server.jar"), b"jar").unwrap();
    let java = write_fake_java(dir.path(), FAKE_SERVER);

    let installation = Installation::detect(dir.path());
    FirstRunSequencer::new()
        .java(java)
        .run(&installation, null_sink())
        .await
        .unwrap();

    assert!(Eula::in_dir(dir.path()).is_accepted().unwrap());
    let props = ServerProperties::in_dir(dir.path());
    assert_eq!(props.get("online-mode").unwrap().as_deref(), Some("false"));
    assert_eq!(props.get("difficulty").unwrap().as_deref(), Some("normal"));
    // The server's own keys survive the upserts.
    assert_eq!(props.get("motd").unwrap().as_deref(), Some("A Minecraft Server"));
}

#[tokio::test]
async fn rerun_skips_completed_phases() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("server.jar"), b"jar").unwrap();
    let java = write_fake_java(dir.path(), FAKE_SERVER);

    let installation = Installation::detect(dir.path());
    let sequencer = FirstRunSequencer::new().java(java);
    sequencer.run(&installation, null_sink()).await.unwrap();

    // Second run finds both artifacts in place and must not regress them.
    let before = fs::read_to_string(dir.path().join("eula.txt")).unwrap();
    sequencer.run(&installation, null_sink()).await.unwrap();
    let after = fs::read_to_string(dir.path().join("eula.txt")).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn phase_timeout_aborts_with_diagnostic() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("server.jar"), b"jar").unwrap();
    // A server that never writes anything.
    let java = write_fake_java(dir.path(), "#!/bin/sh\nsleep 60\n");

    let installation = Installation::detect(dir.path());
    let err = FirstRunSequencer::new()
        .java(java)
        .run(&installation, null_sink())
        .await
        .unwrap_err();

    match err {
        Error::Timeout(msg) => assert!(msg.contains("eula.txt")),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(!dir.path().join("eula.txt").exists());
}

#[tokio::test]
async fn truncated_eula_fails_validation() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("server.jar"), b"jar").unwrap();
    // Writes an eula.txt that is too short to be a finished file.
    let java = write_fake_java(
        dir.path(),
        "#!/bin/sh\nif [ ! -f eula.txt ]; then printf 'eula=false\\n' > eula.txt; fi\nsleep 30\n",
    );

    let installation = Installation::detect(dir.path());
    let err = FirstRunSequencer::new()
        .java(java)
        .run(&installation, null_sink())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
