use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Waits for a filesystem artifact to appear.
///
/// Abstracted behind a trait so the polling implementation can be swapped
/// for native file-event watching (or an instant fake in tests) without
/// touching the sequencer.
#[async_trait]
pub trait ArtifactWatcher: Send + Sync {
    /// Wait until `path` exists or `timeout` elapses. True when it
    /// appeared in time.
    async fn wait_for(&self, path: &Path, timeout: Duration) -> bool;
}

/// Polling watcher checking for the artifact on a fixed tick.
pub struct PollWatcher {
    tick: Duration,
}

impl PollWatcher {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }
}

impl Default for PollWatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl ArtifactWatcher for PollWatcher {
    async fn wait_for(&self, path: &Path, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if path.exists() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.tick).await;
        }
    }
}
