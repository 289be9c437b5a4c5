use crate::detect::LoaderKind;
use crate::download::download_to_file;
use crate::error::{Error, Result};
use crate::server::{LaunchSpec, LogSink, ServerProcess};
use crate::sources::LoaderMetadata;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Installer runs that take longer than this are presumed hung.
const INSTALLER_TIMEOUT: Duration = Duration::from_secs(300);

/// Download and run a Forge-family installer jar.
///
/// The installer is executed headless with `--installServer` in the install
/// directory. Success is judged by artifacts rather than exit code alone: a
/// generated run script, a populated `libraries/` directory, or an
/// "installed successfully" line in the output all count. On success the
/// installer jar and its log are removed; on failure the captured output is
/// surfaced verbatim in the error.
pub(super) async fn install(
    client: &reqwest::Client,
    dir: &Path,
    kind: LoaderKind,
    meta: &LoaderMetadata,
    java: Option<&Path>,
    sink: &LogSink,
) -> Result<()> {
    let installer_name = format!("{}-installer.jar", kind);
    let installer_path = dir.join(&installer_name);

    sink(&format!(
        "[loader] downloading {} installer {}",
        kind, meta.version
    ));
    download_to_file(client, &meta.download_url, &installer_path).await?;

    sink(&format!("[loader] running {} installer", kind));
    let captured: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let capture_sink: LogSink = {
        let captured = captured.clone();
        let sink = sink.clone();
        Arc::new(move |line: &str| {
            if let Ok(mut lines) = captured.lock() {
                lines.push(line.to_string());
            }
            sink(line);
        })
    };

    let spec = LaunchSpec::installer(dir, &installer_name, java);
    let mut process = ServerProcess::new();
    let exit = tokio::time::timeout(INSTALLER_TIMEOUT, process.run_to_exit(&spec, capture_sink))
        .await;
    let exit = match exit {
        Ok(result) => result?,
        Err(_) => {
            let _ = process.terminate().await;
            return Err(Error::Timeout(format!(
                "{} installer did not finish within {} seconds",
                kind,
                INSTALLER_TIMEOUT.as_secs()
            )));
        }
    };

    let output = captured.lock().map(|l| l.join("\n")).unwrap_or_default();
    if !installation_succeeded(dir, kind, &output) {
        return Err(Error::Process(format!(
            "{} installer failed (exit code {}):\n{}",
            kind, exit, output
        )));
    }

    // The installer's work files have no value after success.
    let _ = std::fs::remove_file(&installer_path);
    let _ = std::fs::remove_file(dir.join(format!("{}.log", installer_name)));
    tracing::info!(%kind, version = %meta.version, "loader installed");
    sink(&format!("[loader] {} {} installed", kind, meta.version));
    Ok(())
}

/// Modpack overrides can pre-seed a `libraries/` tree before the installer
/// runs, so a bare directory check is not evidence; only the loader's own
/// vendor path under it counts.
fn installation_succeeded(dir: &Path, kind: LoaderKind, output: &str) -> bool {
    let vendor_path = match kind {
        LoaderKind::NeoForge => "libraries/net/neoforged",
        _ => "libraries/net/minecraftforge",
    };
    dir.join("run.sh").is_file()
        || dir.join("run.bat").is_file()
        || dir.join(vendor_path).is_dir()
        || output.to_lowercase().contains("installed successfully")
}
