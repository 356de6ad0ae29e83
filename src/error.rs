/// Crate-level error types for fatal qmlref failures.
///
/// Problems found in QML sources are never errors; they become
/// [`crate::types::Diagnostic`]s. These variants abort the run.
use std::path::PathBuf;

/// Every variant names the path or reason that stopped the run, so the
/// message printed to stderr is actionable on its own.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of the report failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The conventional `src` directory does not exist under the project root.
    #[error("Source directory not found: {}", path.display())]
    SourceRootNotFound {
        /// Path that was expected to hold the QML sources.
        path: PathBuf,
    },

    /// TOML deserialization of `.qmlref.toml` failed.
    #[error("invalid {}: {source}", path.display())]
    TomlDe {
        /// Config file that failed to parse.
        path: PathBuf,
        /// The wrapped TOML deserialization error.
        source: toml::de::Error,
    },

    /// The filesystem watcher could not be created or attached.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}
