//! Error types for the sync engine and its object store boundary.

use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("source directory does not exist: {}", .path.display())]
    SourceMissing { path: PathBuf },

    #[error("failed to clear {}: {source}", .path.display())]
    DestinationClearFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create {}: {source}", .path.display())]
    DestinationCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open archive {}: {source}", .path.display())]
    ArchiveOpenFailed {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to write archive {}: {source}", .path.display())]
    ArchiveWriteFailed {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive entry escapes the slot directory: {name}")]
    UnsafeEntry { name: String },

    #[error("{op} {bucket}/{object} failed: {source}")]
    RemoteTransferFailed {
        op: &'static str,
        bucket: String,
        object: String,
        #[source]
        source: StoreError,
    },

    #[error("field {field:?} not found in {}", .path.display())]
    FieldNotFound { path: PathBuf, field: String },

    #[error("player id is empty; set it before syncing")]
    EmptyPlayerId,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }

    /// Wraps an archive write failure; plain I/O errors are carried as zip I/O errors.
    pub(crate) fn archive_write(
        path: impl Into<PathBuf>,
        source: impl Into<zip::result::ZipError>,
    ) -> Self {
        Self::ArchiveWriteFailed { path: path.into(), source: source.into() }
    }
}

/// Failures reported by an [`crate::store::ObjectStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("invalid object name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by a remote client (auth, network, service errors).
    /// [`crate::store::LocalStore`] never produces it.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Step of a backup or restore pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Archive,
    Upload,
    Download,
    Extract,
    List,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Archive => "archive",
            Stage::Upload => "upload",
            Stage::Download => "download",
            Stage::Extract => "extract",
            Stage::List => "list",
        })
    }
}

/// A pipeline failure tagged with the stage it happened in.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: SyncError,
}

impl PipelineError {
    pub(crate) fn at(stage: Stage) -> impl FnOnce(SyncError) -> Self {
        move |source| Self { stage, source }
    }
}
