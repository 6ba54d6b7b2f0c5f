//! Error types for the package metadata generator.
//!
//! Failures of the synthesis itself are carried as [`MetadataError`]; the
//! variants added here cover reading the generator's own inputs.

use camino::Utf8PathBuf;
use outpost_metadata::MetadataError;
use thiserror::Error;

/// Errors that can occur while generating package metadata.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Synthesis failed: malformed configuration, invalid task label,
    /// missing shield dependency, or a failed build introspection.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The configuration file could not be read.
    #[error("failed to read configuration {path}")]
    ConfigRead {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The device tree export could not be read or parsed.
    #[error("invalid device tree export {path}: {reason}")]
    DeviceTree {
        /// Path of the device tree export.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A required command-line option was not supplied.
    #[error("missing required option {option} for the {build_system} build system")]
    MissingOption {
        /// The missing option, e.g. `--build-root`.
        option: &'static str,
        /// The selected build system.
        build_system: &'static str,
    },

    /// An I/O operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failed to write to stdout.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`GeneratorError`].
pub type Result<T> = std::result::Result<T, GeneratorError>;
