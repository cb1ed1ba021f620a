//! Core types for the urifs filesystem abstraction.

use std::fmt;
use std::time::SystemTime;

/// Opaque, backend-defined version token for an object.
///
/// Never empty. Two equal tags for the same path mean the backend guarantees
/// identical content; different tags mean the object changed. Tags from
/// different backends are not comparable.
///
/// ```rust
/// use urifs::ETag;
///
/// assert!(ETag::new("").is_none());
/// let tag = ETag::new("\"1700000000123456\"").unwrap();
/// assert_eq!(tag.as_str(), "\"1700000000123456\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct ETag(String);

impl ETag {
    /// Wrap a backend token, returning `None` when it is empty.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        (!token.is_empty()).then_some(Self(token))
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ETag> for String {
    fn from(tag: ETag) -> Self {
        tag.0
    }
}

impl TryFrom<String> for ETag {
    type Error = crate::FsError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        ETag::new(token).ok_or_else(|| crate::FsError::Deserialization("empty etag".into()))
    }
}

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// Regular file or object.
    File,
    /// Directory, or a key prefix on object stores.
    Directory,
}

/// Metadata for a filesystem entry (the result of a "stat").
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Qualified path the metadata describes.
    pub path: String,
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, when the backend reports one.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: Option<SystemTime>,
    /// Version token; present for files.
    pub etag: Option<ETag>,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Metadata for a directory with no size, time or version.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_type: FileType::Directory,
            size: 0,
            modified: None,
            etag: None,
        }
    }
}

/// A directory entry returned from `read_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry (last path segment only).
    pub name: String,
    /// Full qualified path to the entry.
    pub path: String,
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
}

/// Serde support for `Option<SystemTime>` (when serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time.map(|t| {
            let duration = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
            (duration.as_secs(), duration.subsec_nanos())
        })
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parts: Option<(u64, u32)> = Deserialize::deserialize(deserializer)?;
        Ok(parts.map(|(secs, nanos)| UNIX_EPOCH + Duration::new(secs, nanos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_rejects_empty() {
        assert!(ETag::new("").is_none());
        assert!(ETag::new(String::new()).is_none());
    }

    #[test]
    fn etag_equality_is_by_token() {
        assert_eq!(ETag::new("abc"), ETag::new("abc"));
        assert_ne!(ETag::new("abc"), ETag::new("abd"));
    }

    #[test]
    fn etag_try_from_empty_fails() {
        assert!(ETag::try_from(String::new()).is_err());
        assert_eq!(ETag::try_from("x".to_string()).unwrap().to_string(), "x");
    }

    #[test]
    fn metadata_predicates() {
        let dir = Metadata::directory("gs://b/d");
        assert!(dir.is_dir());
        assert!(!dir.is_file());
        assert_eq!(dir.size, 0);
        assert!(dir.etag.is_none());
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ETag>();
        assert_send_sync::<FileType>();
        assert_send_sync::<Metadata>();
        assert_send_sync::<DirEntry>();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn metadata_json_round_trip() {
        let meta = Metadata {
            path: "gs://b/a".into(),
            file_type: FileType::File,
            size: 3,
            modified: Some(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(5)),
            etag: ETag::new("CJD="),
        };
        let json = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
