//! # Filesystem Traits
//!
//! The capability contract every backend satisfies.
//!
//! ## Components
//!
//! ```text
//! FsQualify ─┬─ FsRead  ─┐
//!            ├─ FsWrite ─┼─▶ FileSystem
//!            └─ FsDir   ─┘
//! ```
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`FsQualify`] | `scheme`, `make_qualified`, `supports_scheme` |
//! | [`FsRead`] | `etag`, `exists`, `metadata`, `read`, `open_read` |
//! | [`FsWrite`] | `write`, `open_write`, `remove_file`, `copy` |
//! | [`FsDir`] | `read_dir`, `create_dir`, `remove_dir_all` |
//!
//! ## Qualification First
//!
//! Every path-accepting operation qualifies its input before touching the
//! storage medium. Malformed or foreign input fails with
//! [`FsError::InvalidArgument`](crate::FsError::InvalidArgument) and no I/O
//! happens.
//!
//! ## Blanket Implementation
//!
//! Implement the four component traits and [`FileSystem`] comes for free:
//!
//! ```rust
//! use urifs::{FileSystem, MemoryFs};
//!
//! fn use_fs<B: FileSystem>(_backend: &B) {}
//! use_fs(&MemoryFs::new());
//! ```
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Backends keep their
//! mutable state (clients, caches, maps) behind interior mutability.
//!
//! ## Object Safety
//!
//! All traits are object-safe:
//!
//! ```rust
//! use urifs::FileSystem;
//!
//! fn tag_of(fs: &dyn FileSystem, path: &str) -> Option<String> {
//!     fs.etag(path).ok().map(|t| t.to_string())
//! }
//! ```

mod fs_dir;
mod fs_qualify;
mod fs_read;
mod fs_write;

pub use fs_dir::{FsDir, ReadDirIter};
pub use fs_qualify::FsQualify;
pub use fs_read::FsRead;
pub use fs_write::FsWrite;

/// The filesystem capability: qualification, metadata, content and directories.
///
/// This is the handle application code holds. It is bound to exactly one
/// backend and one scheme for its whole lifetime.
///
/// # Example
///
/// ```rust
/// use urifs::{FileSystem, FsError, MemoryFs};
///
/// fn checkpoint<B: FileSystem>(fs: &B, path: &str, data: &[u8]) -> Result<String, FsError> {
///     let path = fs.make_qualified(path)?;
///     fs.write(path.as_str(), data)?;
///     Ok(fs.etag(path.as_str())?.to_string())
/// }
///
/// let fs = MemoryFs::new();
/// assert!(checkpoint(&fs, "memory://bucket/ckpt", b"state").is_ok());
/// assert!(checkpoint(&fs, "bucket/ckpt", b"state").is_err());
/// ```
pub trait FileSystem: FsRead + FsWrite + FsDir {}

// Blanket implementation - any type implementing all components gets FileSystem
impl<T: FsRead + FsWrite + FsDir> FileSystem for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_system_is_object_safe() {
        fn _check(_: &dyn FileSystem) {}
    }

    #[test]
    fn boxed_file_system_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn FileSystem>();
    }
}
