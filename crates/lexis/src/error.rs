//! Request-level errors.
//!
//! Every failure carries an [`ErrorKind`] and a human-readable message. The
//! kind decides the machine code and the status a handler layer should answer
//! with; the message is safe to show to the caller.

use lexis_blob::BlobError;
use lexis_db::DbError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    UnknownLanguage,
    UnknownPack,
    DuplicateKey,
    UnsupportedContentType,
    ContentTooLarge,
    StorageUnavailable,
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::UnknownLanguage => "UNKNOWN_LANGUAGE",
            ErrorKind::UnknownPack => "UNKNOWN_PACK",
            ErrorKind::DuplicateKey => "DUPLICATE_KEY",
            ErrorKind::UnsupportedContentType => "UNSUPPORTED_CONTENT_TYPE",
            ErrorKind::ContentTooLarge => "CONTENT_TOO_LARGE",
            ErrorKind::StorageUnavailable => "STORAGE_UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::InvalidInput | ErrorKind::UnknownLanguage => 400,
            ErrorKind::UnknownPack => 404,
            ErrorKind::DuplicateKey => 409,
            ErrorKind::ContentTooLarge => 413,
            ErrorKind::UnsupportedContentType => 415,
            ErrorKind::Internal => 500,
            ErrorKind::StorageUnavailable => 503,
        }
    }

    /// Only backend unavailability is worth retrying unchanged.
    pub fn is_retryable(self) -> bool {
        self == ErrorKind::StorageUnavailable
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error returned by every [`crate::Lexis`] operation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LexisError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

pub type Result<T> = std::result::Result<T, LexisError>;

impl LexisError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Lists every missing field at once.
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::invalid_input(format!("missing required field(s): {}", fields.join(", ")))
    }

    pub fn unknown_language(id: &str) -> Self {
        Self::new(
            ErrorKind::UnknownLanguage,
            format!("unsupported language id: {:?}", id),
        )
    }

    pub fn unknown_pack(id: &str) -> Self {
        Self::new(ErrorKind::UnknownPack, format!("unknown pack id: {:?}", id))
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateKey, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageUnavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn to_failure(&self) -> Failure {
        Failure {
            error: self.message.clone(),
            code: self.kind.code(),
        }
    }
}

impl From<DbError> for LexisError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            return Self::unavailable("storage is temporarily unavailable").with_source(err);
        }
        let message = err.to_string();
        let kind = match &err {
            DbError::Duplicate(_) => ErrorKind::DuplicateKey,
            DbError::NotFound(_) => ErrorKind::UnknownPack,
            DbError::InvalidKey(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Internal,
        };
        Self::new(kind, message).with_source(err)
    }
}

impl From<BlobError> for LexisError {
    fn from(err: BlobError) -> Self {
        if err.is_unavailable() {
            return Self::unavailable("failed to save file").with_source(err);
        }
        let (kind, message) = match &err {
            BlobError::UnknownFileType => (
                ErrorKind::UnsupportedContentType,
                "file type could not be determined".to_string(),
            ),
            BlobError::UnsupportedContentType(mime) => (
                ErrorKind::UnsupportedContentType,
                format!("unsupported file type: {}", mime),
            ),
            BlobError::FileTooLarge { limit } => (
                ErrorKind::ContentTooLarge,
                format!("file too large; max {} bytes", limit),
            ),
            BlobError::Read(_) => (
                ErrorKind::InvalidInput,
                "could not read uploaded file".to_string(),
            ),
            BlobError::InvalidReference(_) => (ErrorKind::InvalidInput, err.to_string()),
            _ => (ErrorKind::Internal, err.to_string()),
        };
        Self::new(kind, message).with_source(err)
    }
}

/// Serializable `{error, code}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub error: String,
    pub code: &'static str,
}

impl From<&LexisError> for Failure {
    fn from(err: &LexisError) -> Self {
        err.to_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::DuplicateKey.http_status(), 409);
        assert_eq!(ErrorKind::UnsupportedContentType.http_status(), 415);
        assert_eq!(ErrorKind::ContentTooLarge.http_status(), 413);
        assert_eq!(ErrorKind::StorageUnavailable.http_status(), 503);
        assert_eq!(ErrorKind::UnknownPack.code(), "UNKNOWN_PACK");
    }

    #[test]
    fn test_db_errors_map_to_kinds() {
        let dup: LexisError = DbError::duplicate("pack u1:1:kitchen already exists").into();
        assert_eq!(dup.kind(), ErrorKind::DuplicateKey);
        assert!(!dup.is_retryable());

        let timeout: LexisError = DbError::Timeout {
            operation: "list packs",
            after: Duration::from_secs(10),
        }
        .into();
        assert_eq!(timeout.kind(), ErrorKind::StorageUnavailable);
        assert!(timeout.is_retryable());
    }

    #[test]
    fn test_blob_errors_map_to_kinds() {
        let too_large: LexisError = BlobError::FileTooLarge { limit: 10 }.into();
        assert_eq!(too_large.kind(), ErrorKind::ContentTooLarge);

        let unknown: LexisError = BlobError::UnknownFileType.into();
        assert_eq!(unknown.kind(), ErrorKind::UnsupportedContentType);
        assert_eq!(unknown.message(), "file type could not be determined");
    }

    #[test]
    fn test_failure_envelope() {
        let err = LexisError::missing_fields(&["name", "lang_id"]);
        let json = serde_json::to_value(err.to_failure()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "missing required field(s): name, lang_id",
                "code": "INVALID_INPUT"
            })
        );
    }
}
