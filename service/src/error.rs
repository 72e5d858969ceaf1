//! Error types for the cargo vendor source service.
//!
//! Every stage returns [`Result`]; the binary maps any error to exit status 1
//! after logging it. [`ServiceError::kind`] groups the variants so the
//! dispatcher can report which part of the run failed.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing the vendored dependency archive.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested vendoring strategy is not implemented.
    #[error("unknown strategy {name}; supported strategies: vendor")]
    UnknownStrategy {
        /// Strategy name given on the command line.
        name: String,
    },

    /// The requested compression codec is not supported by the archive layer.
    #[error("unsupported compression {name}; supported codecs: tar, gz, xz, zst, bz2")]
    UnsupportedCompression {
        /// Codec name given on the command line.
        name: String,
    },

    /// No output directory was given.
    #[error("no output directory given; pass --outdir")]
    MissingOutdir,

    /// Autodetection found no `*.spec` file in the working directory.
    #[error("no spec file found in {dir}")]
    NoSpecFile {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// No `Cargo.toml` was found below the searched directory.
    #[error("no Cargo.toml found below {dir}")]
    NoManifest {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// The source is neither an archive with the configured extension nor a
    /// directory containing a manifest.
    #[error("unsupported archive format: {path}")]
    UnsupportedArchiveFormat {
        /// The rejected source path.
        path: PathBuf,
    },

    /// An archive entry attempts to escape the extraction directory.
    #[error("path traversal detected in archive entry: {path}")]
    PathTraversal {
        /// The offending entry path.
        path: String,
    },

    /// The external vendoring command exited unsuccessfully.
    #[error("cargo vendor failed in {project_root}: {reason}")]
    VendorFailed {
        /// Project root the command ran in.
        project_root: PathBuf,
        /// Captured output or exit status description.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Walking a directory tree failed.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A file pattern could not be compiled.
    #[error("invalid file pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Broad classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid flags detected before any work starts.
    Configuration,
    /// Spec file, archive, or manifest discovery failed.
    Discovery,
    /// The external vendoring command failed.
    ExternalCommand,
    /// Filesystem or archive I/O failed.
    Io,
}

impl ServiceError {
    /// Returns the broad category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownStrategy { .. }
            | Self::UnsupportedCompression { .. }
            | Self::MissingOutdir => ErrorKind::Configuration,
            Self::NoSpecFile { .. }
            | Self::NoManifest { .. }
            | Self::UnsupportedArchiveFormat { .. }
            | Self::PathTraversal { .. } => ErrorKind::Discovery,
            Self::VendorFailed { .. } => ErrorKind::ExternalCommand,
            Self::Io(_) | Self::Walk(_) | Self::Glob(_) => ErrorKind::Io,
            #[cfg(any(test, feature = "test-support"))]
            Self::StubMismatch { .. } => ErrorKind::ExternalCommand,
        }
    }

    /// Returns the process exit status for this error.
    ///
    /// Every failure currently exits with status 1.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type alias using [`ServiceError`].
pub type Result<T> = std::result::Result<T, ServiceError>;
