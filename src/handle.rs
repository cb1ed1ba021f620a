//! # Backend Selection
//!
//! [`FileSystemHandle`] is the closed set of backends shipped with the crate,
//! chosen once at construction from a [`BackendConfig`]. It implements the
//! full [`FileSystem`](crate::FileSystem) contract by delegating to the
//! selected backend, so callers hold one concrete type regardless of where
//! their data lives.
//!
//! ```rust
//! use urifs::{BackendConfig, FileSystemHandle, FsRead, FsWrite};
//!
//! let fs = FileSystemHandle::from_config(&BackendConfig::Memory { scheme: None }, None).unwrap();
//! fs.write("memory://bucket/a", b"x").unwrap();
//! assert_eq!(fs.backend_name(), "memory");
//! assert!(fs.exists("memory://bucket/a").unwrap());
//! ```

use std::io::{Read, Write};
use std::time::Duration;

use tracing::info;

use crate::{
    Addressing, ClientFactory, ClientOptions, Credentials, ETag, FsDir, FsError, FsQualify,
    FsRead, FsWrite, LocalFs, MemoryFs, Metadata, ObjectStoreFs, QualifiedPath, ReadDirIter,
    Scheme,
};

/// Which backend to build, and how.
///
/// With the `serde` feature this deserializes from tagged configuration:
///
/// ```json
/// { "backend": "object_store", "scheme": "gs://", "timeout_secs": 30 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "backend", rename_all = "snake_case"))]
pub enum BackendConfig {
    /// Local disk under `file://`.
    Local,
    /// In-process store.
    Memory {
        /// Scheme token such as `"mem2://"`. Defaults to `memory://`.
        #[cfg_attr(feature = "serde", serde(default))]
        scheme: Option<String>,
    },
    /// Cloud object store reached through a [`ClientFactory`].
    ObjectStore {
        /// Scheme token such as `"gs://"`.
        scheme: String,
        /// Explicit credentials; ambient discovery when absent.
        #[cfg_attr(feature = "serde", serde(default))]
        credentials: Option<Credentials>,
        /// Per-request transport timeout in seconds.
        #[cfg_attr(feature = "serde", serde(default))]
        timeout_secs: Option<u64>,
    },
}

/// One of the built-in backends, selected at construction.
pub enum FileSystemHandle {
    /// See [`LocalFs`].
    Local(LocalFs),
    /// See [`ObjectStoreFs`].
    ObjectStore(ObjectStoreFs),
    /// See [`MemoryFs`].
    Memory(MemoryFs),
}

impl FileSystemHandle {
    /// Build the backend described by `config`.
    ///
    /// `factory` is only consulted for [`BackendConfig::ObjectStore`].
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] for a malformed scheme token
    /// - [`FsError::NotSupported`] for an object store without a factory
    /// - Whatever the factory returns
    pub fn from_config(
        config: &BackendConfig,
        factory: Option<&ClientFactory>,
    ) -> Result<Self, FsError> {
        let handle = match config {
            BackendConfig::Local => Self::Local(LocalFs::new()),
            BackendConfig::Memory { scheme: None } => Self::Memory(MemoryFs::new()),
            BackendConfig::Memory {
                scheme: Some(token),
            } => Self::Memory(MemoryFs::with_scheme(Scheme::new(
                token.as_str(),
                Addressing::Bucketed,
            )?)?),
            BackendConfig::ObjectStore {
                scheme,
                credentials,
                timeout_secs,
            } => {
                let factory = factory.ok_or(FsError::NotSupported {
                    operation: "object store without a client factory",
                })?;
                let scheme = Scheme::new(scheme.as_str(), Addressing::Bucketed)?;
                let options = ClientOptions {
                    credentials: credentials.clone(),
                    timeout: timeout_secs.map(Duration::from_secs),
                };
                Self::ObjectStore(ObjectStoreFs::connect(scheme, &options, factory)?)
            }
        };
        info!(
            backend = handle.backend_name(),
            scheme = %handle.scheme(),
            "filesystem ready"
        );
        Ok(handle)
    }

    /// Short name of the selected backend.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::ObjectStore(_) => "object_store",
            Self::Memory(_) => "memory",
        }
    }
}

impl From<LocalFs> for FileSystemHandle {
    fn from(fs: LocalFs) -> Self {
        Self::Local(fs)
    }
}

impl From<ObjectStoreFs> for FileSystemHandle {
    fn from(fs: ObjectStoreFs) -> Self {
        Self::ObjectStore(fs)
    }
}

impl From<MemoryFs> for FileSystemHandle {
    fn from(fs: MemoryFs) -> Self {
        Self::Memory(fs)
    }
}

macro_rules! delegate {
    ($self:ident, $fs:ident => $call:expr) => {
        match $self {
            FileSystemHandle::Local($fs) => $call,
            FileSystemHandle::ObjectStore($fs) => $call,
            FileSystemHandle::Memory($fs) => $call,
        }
    };
}

impl FsQualify for FileSystemHandle {
    fn scheme(&self) -> &Scheme {
        delegate!(self, fs => fs.scheme())
    }

    fn make_qualified(&self, path: &str) -> Result<QualifiedPath, FsError> {
        delegate!(self, fs => fs.make_qualified(path))
    }

    fn supports_scheme(&self, name: &str) -> bool {
        delegate!(self, fs => fs.supports_scheme(name))
    }
}

impl FsRead for FileSystemHandle {
    fn etag(&self, path: &str) -> Result<ETag, FsError> {
        delegate!(self, fs => fs.etag(path))
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        delegate!(self, fs => fs.exists(path))
    }

    fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
        delegate!(self, fs => fs.metadata(path))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        delegate!(self, fs => fs.read(path))
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError> {
        delegate!(self, fs => fs.open_read(path))
    }
}

impl FsWrite for FileSystemHandle {
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        delegate!(self, fs => fs.write(path, data))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError> {
        delegate!(self, fs => fs.open_write(path))
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        delegate!(self, fs => fs.remove_file(path))
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        delegate!(self, fs => fs.copy(from, to))
    }
}

impl FsDir for FileSystemHandle {
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
        delegate!(self, fs => fs.read_dir(path))
    }

    fn create_dir(&self, path: &str) -> Result<(), FsError> {
        delegate!(self, fs => fs.create_dir(path))
    }

    fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
        delegate!(self, fs => fs.remove_dir_all(path))
    }
}
