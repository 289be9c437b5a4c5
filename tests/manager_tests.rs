//! Facade-level lifecycle tests: an unprovisioned installation is
//! bootstrapped automatically on first start, then runs and stops cleanly.
#![cfg(unix)]

use craft_runner::{Error, ServerManager, ServerStatus};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// Stands in for a java server: generates eula.txt on the first run,
/// server.properties on the second, and on later runs behaves like a
/// running server with a console.
const FAKE_SERVER: &str = r#"#!/bin/sh
if [ ! -f eula.txt ]; then
    printf '#By changing the setting below to TRUE you agree to the EULA.\neula=false\n' > eula.txt
    sleep 30
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
    sleep 30
else
    echo 'Done (1.234s)! For help, type "help"'
    while read line; do
        [ "$line" = "stop" ] && exit 0
    done
fi
"#;

fn write_fake_java(dir: &Path) -> PathBuf {
    let path = dir.join("fake-java");
    fs::write(&path, FAKE_SERVER).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

async fn wait_for_line(lines: &Arc<Mutex<Vec<String>>>, needle: &str) {
    for _ in 0..400 {
        if lines.lock().unwrap().iter().any(|l| l.contains(needle)) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("line '{}' never arrived; got {:?}", needle, lines.lock().unwrap());
}

#[tokio::test]
async fn first_start_provisions_then_runs_until_stopped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("server.jar"), b"jar").unwrap();
    let java = write_fake_java(dir.path());

    let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let lines = lines.clone();
        Arc::new(move |line: &str| lines.lock().unwrap().push(line.to_string()))
    };

    let mut manager = ServerManager::new(dir.path()).java(java).sink(sink);
    assert_eq!(manager.status(), ServerStatus::Idle);

    manager.start(None, None).await.unwrap();
    assert_eq!(manager.status(), ServerStatus::Running);
    wait_for_line(&lines, "Done").await;

    // Provisioning happened on the way.
    assert!(fs::read_to_string(dir.path().join("eula.txt"))
        .unwrap()
        .contains("eula=true"));
    assert!(dir.path().join("server.properties").exists());

    manager.send_command("say hello").await.unwrap();
    manager.stop().await.unwrap();
    assert_eq!(manager.status(), ServerStatus::Idle);

    // Second start skips provisioning and is immediately console-ready.
    manager.start(Some(2048), None).await.unwrap();
    wait_for_line(&lines, "Done").await;
    manager.stop().await.unwrap();
}

#[tokio::test]
async fn stop_without_start_is_not_running() {
    let dir = tempdir().unwrap();
    let mut manager = ServerManager::new(dir.path());
    assert!(matches!(manager.stop().await, Err(Error::NotRunning)));
}
