//! Directory operations.

use crate::{DirEntry, FsError, FsQualify};

/// Directory operations for a backend.
///
/// Object stores have no real directories: a "directory" is any key prefix
/// ending in `/` under which at least one object exists.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
pub trait FsDir: FsQualify {
    /// List the immediate children of a directory.
    ///
    /// The outer `Result` indicates whether the directory could be listed;
    /// each item's `Result` indicates whether that entry could be read.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    /// - [`FsError::NotADirectory`] if the path is a file
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError>;

    /// Create a directory and any missing parents.
    ///
    /// Idempotent. A no-op on backends without directories.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if a component of the path is a file
    fn create_dir(&self, path: &str) -> Result<(), FsError>;

    /// Remove a directory and all its contents recursively.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing exists under the path
    /// - [`FsError::NotADirectory`] if the path is a file
    fn remove_dir_all(&self, path: &str) -> Result<(), FsError>;
}

/// Iterator over directory entries.
///
/// - Outer `Result` (from [`FsDir::read_dir`]) = "can I list this directory?"
/// - Inner `Result` (per item) = "can I read this entry?"
///
/// # Example
///
/// ```rust
/// use urifs::{FileSystem, FsError};
///
/// fn list_names<B: FileSystem>(fs: &B, dir: &str) -> Result<Vec<String>, FsError> {
///     let mut names = Vec::new();
///     for entry in fs.read_dir(dir)? {
///         names.push(entry?.name);
///     }
///     Ok(names)
/// }
/// ```
pub struct ReadDirIter(Box<dyn Iterator<Item = Result<DirEntry, FsError>> + Send + 'static>);

impl ReadDirIter {
    /// Create from any compatible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<DirEntry, FsError>> + Send + 'static,
    {
        Self(Box::new(iter))
    }

    /// Create from a pre-collected vector.
    pub fn from_vec(entries: Vec<Result<DirEntry, FsError>>) -> Self {
        Self(Box::new(entries.into_iter()))
    }

    /// Collect all entries, short-circuiting on first error.
    pub fn collect_all(self) -> Result<Vec<DirEntry>, FsError> {
        self.collect()
    }
}

impl std::fmt::Debug for ReadDirIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadDirIter").finish_non_exhaustive()
    }
}

impl Iterator for ReadDirIter {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}
