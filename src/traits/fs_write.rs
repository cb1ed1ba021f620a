//! Write operations.

use std::io::Write;

use crate::{FsError, FsQualify};

/// Write operations for a backend.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: FsQualify {
    /// Write data to a file, creating or replacing it.
    ///
    /// Missing parent directories are created where the backend has them.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the path does not qualify
    /// - [`FsError::NotAFile`] if the path is a directory
    /// - [`FsError::PermissionDenied`] if write access is denied
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError>;

    /// Open a file for writing, returning a boxed writer.
    ///
    /// Content becomes visible once the writer is flushed. A writer dropped
    /// without flushing commits on drop; failures at that point can only be
    /// logged.
    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError>;

    /// Remove a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::NotAFile`] if the path is a directory (use
    ///   [`FsDir::remove_dir_all`](super::FsDir::remove_dir_all))
    fn remove_file(&self, path: &str) -> Result<(), FsError>;

    /// Copy a file. Both paths must qualify for this backend.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source file does not exist
    /// - [`FsError::NotAFile`] if the source is a directory
    fn copy(&self, from: &str, to: &str) -> Result<(), FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_write_is_object_safe() {
        fn _check(_: &dyn FsWrite) {}
    }
}
