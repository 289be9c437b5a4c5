use crate::detect::LoaderKind;
use crate::download::download_to_file;
use crate::error::Result;
use crate::server::LogSink;
use crate::sources::LoaderMetadata;
use std::path::Path;

/// Download a Fabric-family server-launcher jar into the install root.
///
/// Fabric's meta service serves a complete launcher for a
/// `{minecraft}/{loader}/{installer}` triplet (`/server/jar`), so no
/// installer process is involved; the jar lands next to the server files
/// under the name the launch path expects.
pub(super) async fn install(
    client: &reqwest::Client,
    dir: &Path,
    kind: LoaderKind,
    meta: &LoaderMetadata,
    sink: &LogSink,
) -> Result<()> {
    let jar_name = match kind {
        LoaderKind::Quilt => "quilt-server-launch.jar",
        _ => "fabric-server-launch.jar",
    };

    sink(&format!(
        "[loader] downloading {} server launcher {}",
        kind, meta.version
    ));
    download_to_file(client, &meta.download_url, &dir.join(jar_name)).await?;
    tracing::info!(%kind, version = %meta.version, jar = jar_name, "loader launcher downloaded");
    sink(&format!("[loader] {} {} ready", kind, meta.version));
    Ok(())
}
