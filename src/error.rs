//! Error types for the urifs filesystem abstraction.

use std::path::PathBuf;

/// Filesystem error type with contextual variants.
///
/// Every backend normalizes its failures into these variants, so callers never
/// branch on provider-specific error types. The four variants that matter for
/// control flow are [`InvalidArgument`](FsError::InvalidArgument),
/// [`NotFound`](FsError::NotFound), [`PermissionDenied`](FsError::PermissionDenied)
/// and [`Transient`](FsError::Transient).
///
/// # Examples
///
/// ```rust
/// use urifs::FsError;
///
/// let err = FsError::NotFound { path: "gs://bucket/missing".into() };
/// assert_eq!(err.to_string(), "not found: gs://bucket/missing");
/// assert!(!err.is_transient());
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Qualification
    /// Path failed qualification: wrong or missing scheme, or malformed structure.
    ///
    /// Always detected locally, before any I/O. Never worth retrying.
    #[error("invalid argument: {path}: {reason}")]
    InvalidArgument {
        /// The rejected input.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    // Path/Object Errors
    /// Addressed object does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// Path already exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a file but found something else.
    #[error("not a file: {path}")]
    NotAFile {
        /// The path that is not a file.
        path: String,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: String,
    },

    // Permission/Access Errors
    /// The backend refused access.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The path where permission was denied.
        path: String,
        /// The operation that was denied.
        operation: &'static str,
    },

    // Retryable Errors
    /// Backend I/O or network failure, throttling, or timeout.
    ///
    /// Callers (or [`RetryLayer`](crate::RetryLayer)) may retry these.
    #[error("{operation}: transient failure for {path}: {message}")]
    Transient {
        /// The path involved in the operation.
        path: String,
        /// The operation that failed.
        operation: &'static str,
        /// Backend diagnostic text.
        message: String,
    },

    // Data Errors
    /// Invalid data encountered.
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The path with invalid data.
        path: String,
        /// Details about the invalid data.
        details: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    // Backend/Operation Errors
    /// Operation is not supported by this backend.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// Permanent backend error that fits no other variant.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The local path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Returns `true` if the failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, FsError::Transient { .. })
    }

    /// Returns `true` for [`FsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }

    /// Convert an I/O error, attaching the qualified path and operation.
    pub(crate) fn from_io(error: std::io::Error, path: &str, operation: &'static str) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => FsError::NotFound { path: path.into() },
            ErrorKind::PermissionDenied => FsError::PermissionDenied {
                path: path.into(),
                operation,
            },
            ErrorKind::AlreadyExists => FsError::AlreadyExists {
                path: path.into(),
                operation,
            },
            ErrorKind::NotADirectory => FsError::NotADirectory { path: path.into() },
            ErrorKind::IsADirectory => FsError::NotAFile { path: path.into() },
            kind if is_transient_kind(kind) => FsError::Transient {
                path: path.into(),
                operation,
                message: error.to_string(),
            },
            _ => FsError::Io {
                operation,
                path: PathBuf::from(path),
                source: error,
            },
        }
    }
}

fn is_transient_kind(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind;

    matches!(
        kind,
        ErrorKind::TimedOut
            | ErrorKind::Interrupted
            | ErrorKind::WouldBlock
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionRefused
            | ErrorKind::BrokenPipe
    )
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        FsError::from_io(error, "", "io")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_not_found_display() {
        let err = FsError::NotFound {
            path: "gs://bucket/missing".into(),
        };
        assert_eq!(err.to_string(), "not found: gs://bucket/missing");
    }

    #[test]
    fn fs_error_invalid_argument_display() {
        let err = FsError::InvalidArgument {
            path: "not-gs://bucket/path".into(),
            reason: "foreign scheme 'not-gs'".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid argument: not-gs://bucket/path: foreign scheme 'not-gs'"
        );
    }

    #[test]
    fn fs_error_transient_keeps_backend_text() {
        let err = FsError::Transient {
            path: "gs://b/k".into(),
            operation: "etag",
            message: "503 backend unavailable".into(),
        };
        assert!(err.to_string().contains("503 backend unavailable"));
        assert!(err.is_transient());
    }

    #[test]
    fn fs_error_from_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let fs_err = FsError::from_io(io_err, "file:///x", "etag");
        assert!(matches!(fs_err, FsError::NotFound { ref path } if path == "file:///x"));
        assert!(fs_err.is_not_found());
    }

    #[test]
    fn fs_error_from_io_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::PermissionDenied { .. }));
    }

    #[test]
    fn fs_error_from_io_timed_out_is_transient() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow disk");
        let fs_err = FsError::from_io(io_err, "file:///x", "read");
        assert!(fs_err.is_transient());
    }

    #[test]
    fn fs_error_from_io_other() {
        let io_err = std::io::Error::other("test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::Io { .. }));
        assert!(!fs_err.is_transient());
    }
}
