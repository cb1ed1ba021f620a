//! Metadata and read operations.

use std::io::Read;

use crate::{ETag, FsError, FsQualify, Metadata};

/// Metadata and read operations for a backend.
///
/// All methods use `&self` (interior mutability). Backends manage their own synchronization.
///
/// Metadata operations may block on network or disk I/O. Backend failures are
/// normalized into [`FsError`]; retryable ones surface as
/// [`FsError::Transient`].
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: FsQualify {
    /// Current version token of the object at `path`.
    ///
    /// Performs a metadata lookup only; content is never fetched. Repeating
    /// the call on an unchanged object yields an equal tag.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the path does not qualify
    /// - [`FsError::NotFound`] if the object does not exist
    /// - [`FsError::NotAFile`] if the path names a directory
    /// - [`FsError::PermissionDenied`] if access is refused
    /// - [`FsError::Transient`] for retryable backend failures
    fn etag(&self, path: &str) -> Result<ETag, FsError>;

    /// Check if a file or directory exists at `path`.
    ///
    /// Returns `Ok(false)` for absence. Only returns an error for failed
    /// qualification or unexpected backend failures.
    fn exists(&self, path: &str) -> Result<bool, FsError>;

    /// Get metadata for `path`.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the path does not qualify
    /// - [`FsError::NotFound`] if nothing exists at the path
    fn metadata(&self, path: &str) -> Result<Metadata, FsError>;

    /// Read entire file contents as bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Open a file for reading, returning a boxed reader.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_read_is_object_safe() {
        fn _check(_: &dyn FsRead) {}
    }

    #[test]
    fn fs_read_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FsRead>() {
            _assert_send_sync::<T>();
        }
    }
}
