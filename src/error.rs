/// Error handling module for craft-runner.
///
/// This module defines the error types used throughout the library.
/// Stage-level operations return these errors with a human-readable
/// diagnostic instead of unwinding across component boundaries, so
/// orchestrators (the provisioning sequencer, the modpack pipeline)
/// can decide whether to continue, skip, or abort.
///
/// # Example
///
/// ```
/// use craft_runner::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::MissingRuntime(path)) => println!("Java runtime not found at '{}'", path),
///         Err(Error::Timeout(msg)) => println!("Operation timed out: {}", msg),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the craft-runner library.
///
/// Each variant carries context to let callers distinguish the failure
/// classes that matter to them: a missing Java runtime is recoverable by
/// installing one, a validation failure means a generated artifact is
/// unusable, a download failure inside a mod batch is skippable.
#[derive(Error, Debug)]
pub enum Error {
    /// The runtime executable (typically `java`) could not be located or
    /// executed at all.
    ///
    /// This error occurs when:
    /// - The configured executable path does not exist
    /// - The spawn fails with a not-found error from the OS
    #[error("Runtime executable not found: {0}")]
    MissingRuntime(String),

    /// Error when starting a server process for reasons other than a
    /// missing runtime.
    ///
    /// This error occurs when:
    /// - The process fails to spawn (permissions, resources)
    /// - A required launch artifact (jar, args file) is absent
    #[error("Server process error: {0}")]
    Process(String),

    /// Error in communication with a running process.
    ///
    /// This error occurs when:
    /// - A write to the process's stdin fails
    /// - The stdin pipe is gone while the process is nominally running
    ///
    /// Communication errors are non-fatal to the controller; they degrade
    /// to "command not delivered".
    #[error("Communication error: {0}")]
    Communication(String),

    /// Operation exceeded its time bound.
    ///
    /// This error occurs when:
    /// - A bootstrap phase never produces its target artifact
    /// - A loader installer runs past its limit
    ///
    /// The underlying process is forcibly terminated before this is
    /// returned; the operation never hangs indefinitely.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A generated artifact exists but failed size/content checks.
    ///
    /// This error occurs when:
    /// - `eula.txt` is too small or lacks the `eula=` token
    /// - `server.properties` is missing required keys
    ///
    /// Treated as equivalent to the artifact not having been generated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A modpack manifest is malformed or incomplete.
    ///
    /// This error occurs when:
    /// - Neither manifest schema matches the document
    /// - The manifest names no Minecraft version or no loader
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// A network download failed after retries.
    #[error("Download error: {0}")]
    Download(String),

    /// Writing into a protected directory was denied.
    ///
    /// Reported distinctly from generic I/O errors and never retried
    /// automatically.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// The server process is already running.
    #[error("Already running")]
    AlreadyRunning,

    /// The server process is not running.
    #[error("Not running")]
    NotRunning,

    /// Filesystem or other I/O failure not covered above.
    #[error("I/O error: {0}")]
    Io(String),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Classify a `std::io::Error` from a filesystem operation, keeping
    /// permission failures distinct per the error-handling policy.
    pub(crate) fn from_io(context: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Error::Permission(format!("{}: {}", context, err))
        } else {
            Error::Io(format!("{}: {}", context, err))
        }
    }
}

/// Result type for craft-runner operations.
///
/// Convenience alias for `std::result::Result` with this crate's `Error`.
pub type Result<T> = std::result::Result<T, Error>;
