//! # Extension Traits
//!
//! Convenience methods for filesystem backends.
//!
//! ## Overview
//!
//! [`FsExt`] provides commonly-needed utility methods that aren't part of
//! the core contract. They are default methods with a blanket
//! implementation, so any [`FileSystem`] (including `dyn FileSystem`) gets
//! them for free.
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`is_file`](FsExt::is_file) | Check if path is a file |
//! | [`is_dir`](FsExt::is_dir) | Check if path is a directory |
//! | [`file_size`](FsExt::file_size) | Size in bytes |
//! | [`read_to_string`](FsExt::read_to_string) | Read and decode UTF-8 |
//! | [`has_changed`](FsExt::has_changed) | Compare the current [`ETag`] against a known one |
//! | [`read_if_changed`](FsExt::read_if_changed) | Fetch content only when its [`ETag`] moved |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, [`FsExtJson`] adds `read_json` and
//! `write_json`.

use crate::{ETag, FileSystem, FsError};

/// Extension methods for any filesystem backend.
///
/// # Example
///
/// ```rust
/// use urifs::{FsExt, FsWrite, MemoryFs};
///
/// let fs = MemoryFs::new();
/// fs.write("memory://bucket/config", b"v1").unwrap();
///
/// let (tag, data) = fs.read_if_changed("memory://bucket/config", None).unwrap().unwrap();
/// assert_eq!(data, b"v1");
/// assert!(fs.read_if_changed("memory://bucket/config", Some(&tag)).unwrap().is_none());
/// ```
pub trait FsExt: FileSystem {
    /// Check if the path points to a file.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_file(&self, path: &str) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a directory.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_dir(&self, path: &str) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_dir()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get the size of a file in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if the path doesn't exist.
    fn file_size(&self, path: &str) -> Result<u64, FsError> {
        Ok(self.metadata(path)?.size)
    }

    /// Read entire file contents as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidData`] if the content is not valid UTF-8
    /// - Anything [`read`](crate::FsRead::read) returns
    fn read_to_string(&self, path: &str) -> Result<String, FsError> {
        let data = self.read(path)?;
        String::from_utf8(data).map_err(|e| FsError::InvalidData {
            path: path.to_owned(),
            details: e.to_string(),
        })
    }

    /// Whether the object's current [`ETag`] differs from `known`.
    ///
    /// A single metadata lookup; content is not fetched.
    fn has_changed(&self, path: &str, known: &ETag) -> Result<bool, FsError> {
        Ok(self.etag(path)? != *known)
    }

    /// Read the object only if its [`ETag`] differs from `known`.
    ///
    /// Returns `Ok(None)` when the tag is unchanged, otherwise the tag that
    /// was observed before reading together with the content. A concurrent
    /// writer may land between the two calls; the returned tag is then older
    /// than the content, which makes the next poll read again rather than
    /// miss an update.
    fn read_if_changed(
        &self,
        path: &str,
        known: Option<&ETag>,
    ) -> Result<Option<(ETag, Vec<u8>)>, FsError> {
        let current = self.etag(path)?;
        if known == Some(&current) {
            return Ok(None);
        }
        let data = self.read(path)?;
        Ok(Some((current, data)))
    }
}

// Blanket implementation - any FileSystem backend gets FsExt for free
impl<B: FileSystem + ?Sized> FsExt for B {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    /// JSON serialization extension methods.
    ///
    /// Available when the `serde` feature is enabled.
    pub trait FsExtJson: FileSystem {
        /// Read a file and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - `FsError::NotFound`: File doesn't exist
        /// - `FsError::InvalidData`: File isn't valid UTF-8
        /// - `FsError::Deserialization`: JSON parsing failed
        fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FsError> {
            let data = self.read_to_string(path)?;
            serde_json::from_str(&data).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize a value and write it as pretty-printed JSON.
        ///
        /// # Errors
        ///
        /// - `FsError::Serialization`: JSON serialization failed
        /// - Other `FsError` variants from the underlying `write()` call
        fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<(), FsError> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.write(path, json.as_bytes())
        }
    }

    // Blanket implementation
    impl<B: FileSystem + ?Sized> FsExtJson for B {}
}

#[cfg(feature = "serde")]
pub use json::FsExtJson;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FsDir, FsRead, FsWrite, MemoryFs};

    fn fs() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.write("memory://b/file.txt", b"hello").unwrap();
        fs.create_dir("memory://b/dir").unwrap();
        fs
    }

    #[test]
    fn is_file_and_is_dir() {
        let fs = fs();
        assert!(fs.is_file("memory://b/file.txt").unwrap());
        assert!(!fs.is_dir("memory://b/file.txt").unwrap());
        assert!(fs.is_dir("memory://b/dir").unwrap());
        assert!(!fs.is_file("memory://b/dir").unwrap());
    }

    #[test]
    fn missing_paths_are_neither() {
        let fs = fs();
        assert!(!fs.is_file("memory://b/missing").unwrap());
        assert!(!fs.is_dir("memory://b/missing").unwrap());
    }

    #[test]
    fn unqualified_paths_still_error() {
        let fs = fs();
        assert!(matches!(
            fs.is_file("b/file.txt"),
            Err(FsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn file_size_returns_size() {
        let fs = fs();
        assert_eq!(fs.file_size("memory://b/file.txt").unwrap(), 5);
        assert!(fs.file_size("memory://b/missing").unwrap_err().is_not_found());
    }

    #[test]
    fn read_to_string_rejects_invalid_utf8() {
        let fs = fs();
        assert_eq!(fs.read_to_string("memory://b/file.txt").unwrap(), "hello");
        fs.write("memory://b/bin", &[0xff, 0xfe]).unwrap();
        assert!(matches!(
            fs.read_to_string("memory://b/bin"),
            Err(FsError::InvalidData { .. })
        ));
    }

    #[test]
    fn change_detection_follows_etag() {
        let fs = fs();
        let tag = fs.etag("memory://b/file.txt").unwrap();
        assert!(!fs.has_changed("memory://b/file.txt", &tag).unwrap());
        assert!(fs.read_if_changed("memory://b/file.txt", Some(&tag)).unwrap().is_none());

        fs.write("memory://b/file.txt", b"bye").unwrap();
        assert!(fs.has_changed("memory://b/file.txt", &tag).unwrap());
        let (new_tag, data) = fs
            .read_if_changed("memory://b/file.txt", Some(&tag))
            .unwrap()
            .unwrap();
        assert_ne!(new_tag, tag);
        assert_eq!(data, b"bye");
    }

    #[test]
    fn fs_ext_available_on_dyn_fs() {
        let backend = fs();
        let fs: &dyn FileSystem = &backend;
        assert!(fs.is_file("memory://b/file.txt").unwrap());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        let fs = fs();
        let value = serde_json::json!({ "name": "checkpoint", "step": 3 });
        fs.write_json("memory://b/state.json", &value).unwrap();
        let back: serde_json::Value = fs.read_json("memory://b/state.json").unwrap();
        assert_eq!(back, value);

        assert!(matches!(
            fs.read_json::<serde_json::Value>("memory://b/file.txt"),
            Err(FsError::Deserialization(_))
        ));
    }
}
