//! Error types for package metadata synthesis.
//!
//! Every failure is fatal: the variants below name the invariant that was
//! violated so the top-level invocation can report it and exit without
//! producing a partial descriptor.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while normalising configuration, building the task
/// descriptor, assembling the package document, or writing it out.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A configuration line has no `=` separating key and value.
    #[error("malformed configuration line {line}: `{content}` has no key/value separator")]
    MalformedConfigLine {
        /// One-based line number within the configuration source.
        line: usize,
        /// The offending line, trimmed.
        content: String,
    },

    /// A JSON configuration export is not a flat object of scalar values.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the structural problem.
        reason: String,
    },

    /// The `label` task field is absent or is not a hexadecimal integer.
    #[error("missing or invalid task label: {reason}")]
    MissingOrInvalidLabel {
        /// Why the label was rejected.
        reason: String,
    },

    /// A runtime dependency the package cannot ship without was not found.
    #[error("{dependency} dependency not found")]
    MissingMandatoryDependency {
        /// Name of the unresolved dependency.
        dependency: &'static str,
    },

    /// An external collaborator (build introspection) failed or produced
    /// output that could not be understood.
    #[error("{collaborator} failed: {reason}")]
    CollaboratorFailure {
        /// The collaborator that failed, e.g. `meson introspect`.
        collaborator: String,
        /// Description of the failure.
        reason: String,
    },

    /// The descriptor could not be rendered as JSON.
    #[error("failed to serialise package metadata")]
    Serialization(#[source] serde_json::Error),

    /// Writing the descriptor to its destination failed.
    #[error("failed to write package metadata to {path}")]
    WriteFailed {
        /// Destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`MetadataError`].
pub type Result<T> = std::result::Result<T, MetadataError>;
