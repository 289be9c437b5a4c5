//! Streaming HTTP downloads with bounded retries.

use crate::error::{Error, Result};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Download `url` to `dest`, streaming chunks to disk.
///
/// Transient failures are retried up to three times with a short backoff.
/// Permission errors writing `dest` are never retried. When the response
/// carries a `Content-Length`, a body more than 5% short of it is treated
/// as a failed attempt.
#[tracing::instrument(skip(client))]
pub async fn download_to_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let mut last_error = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match try_download(client, url, dest).await {
            Ok(()) => {
                tracing::debug!(attempt, "download complete");
                return Ok(());
            }
            Err(err @ Error::Permission(_)) => return Err(err),
            Err(err) => {
                tracing::warn!(attempt, error = %err, "download attempt failed");
                last_error = Some(err);
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
            }
        }
    }
    Err(last_error.unwrap_or_else(|| Error::Download(format!("Failed to download {}", url))))
}

async fn try_download(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Download(format!("Request to {} failed: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::Download(format!(
            "HTTP {} for {}",
            response.status(),
            url
        )));
    }

    let expected = response.content_length();
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::from_io("creating download target", e))?;

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Download(format!("Stream from {} failed: {}", url, e)))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::from_io("writing download target", e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| Error::from_io("flushing download target", e))?;

    if let Some(expected) = expected {
        if expected > 0 && (written as f64) < (expected as f64) * 0.95 {
            return Err(Error::Download(format!(
                "Truncated download from {}: got {} of {} bytes",
                url, written, expected
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn downloads_body_to_file() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/mods/example.jar");
                then.status(200).body(b"jar bytes");
            })
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("example.jar");
        let client = reqwest::Client::new();
        download_to_file(&client, &server.url("/mods/example.jar"), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"jar bytes");
    }

    #[tokio::test]
    async fn http_error_is_reported_as_download_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.jar");
                then.status(404);
            })
            .await;

        let dir = tempdir().unwrap();
        let client = reqwest::Client::new();
        let result = download_to_file(
            &client,
            &server.url("/missing.jar"),
            &dir.path().join("missing.jar"),
        )
        .await;

        assert!(matches!(result, Err(Error::Download(_))));
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/flaky.jar");
                then.status(500);
            })
            .await;

        let dir = tempdir().unwrap();
        let client = reqwest::Client::new();
        let result = download_to_file(
            &client,
            &server.url("/flaky.jar"),
            &dir.path().join("flaky.jar"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(mock.hits_async().await, 3);
    }
}
