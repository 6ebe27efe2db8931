use std::path::PathBuf;
use thiserror::Error;

/// Blob store errors.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Neither the filename nor the content yields a storage extension
    #[error("unknown file type")]
    UnknownFileType,

    /// Sniffed content is outside the image family
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("file exceeds the {limit} byte upload limit")]
    FileTooLarge { limit: u64 },

    /// Reading the upload body failed
    #[error("failed to read upload: {0}")]
    Read(#[source] std::io::Error),

    /// Writing under the storage root failed
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The storage root is missing, not a directory or not writable
    #[error("storage root unavailable: {0}")]
    RootUnavailable(String),

    /// Every candidate name in the collision sequence is taken
    #[error("no free file name for {base}{ext} after {attempts} attempts")]
    NamesExhausted {
        base: String,
        ext: String,
        attempts: u32,
    },

    /// A public reference does not map to a file under the storage root
    #[error("invalid blob reference: {0}")]
    InvalidReference(String),
}

impl BlobError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// True for failures of the storage medium rather than of the upload.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Write { .. } | Self::RootUnavailable(_) | Self::NamesExhausted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BlobError>;
