//! Structured logging wrapper.

use std::io::{Read, Write};
use std::time::Instant;

use tracing::{debug, warn};

use crate::{
    ETag, FileSystem, FsDir, FsError, FsQualify, FsRead, FsWrite, Layer, Metadata, QualifiedPath,
    ReadDirIter, Scheme,
};

/// Layer that logs every operation of the wrapped backend.
///
/// Successes are logged at `debug`, failures at `warn`, each with the
/// operation name, the path as given, and the elapsed time.
#[derive(Debug, Clone)]
pub struct TracingLayer {
    name: &'static str,
}

impl TracingLayer {
    /// Tag every event with `name` so several wrapped backends can be told apart.
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new("urifs")
    }
}

impl<B: FileSystem> Layer<B> for TracingLayer {
    type Backend = Traced<B>;

    fn layer(self, backend: B) -> Self::Backend {
        Traced {
            inner: backend,
            name: self.name,
        }
    }
}

/// Backend wrapper produced by [`TracingLayer`].
pub struct Traced<B> {
    inner: B,
    name: &'static str,
}

impl<B> Traced<B> {
    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn log<T>(
        &self,
        operation: &'static str,
        path: &str,
        call: impl FnOnce() -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let start = Instant::now();
        let result = call();
        let elapsed = start.elapsed();
        match &result {
            Ok(_) => debug!(fs = self.name, operation, path, ?elapsed, "ok"),
            Err(error) => warn!(fs = self.name, operation, path, ?elapsed, %error, "failed"),
        }
        result
    }
}

impl<B: FsQualify> FsQualify for Traced<B> {
    fn scheme(&self) -> &Scheme {
        self.inner.scheme()
    }

    fn make_qualified(&self, path: &str) -> Result<QualifiedPath, FsError> {
        self.log("make_qualified", path, || self.inner.make_qualified(path))
    }

    fn supports_scheme(&self, name: &str) -> bool {
        self.inner.supports_scheme(name)
    }
}

impl<B: FsRead> FsRead for Traced<B> {
    fn etag(&self, path: &str) -> Result<ETag, FsError> {
        self.log("etag", path, || self.inner.etag(path))
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        self.log("exists", path, || self.inner.exists(path))
    }

    fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
        self.log("metadata", path, || self.inner.metadata(path))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.log("read", path, || self.inner.read(path))
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError> {
        self.log("open_read", path, || self.inner.open_read(path))
    }
}

impl<B: FsWrite> FsWrite for Traced<B> {
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        self.log("write", path, || self.inner.write(path, data))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError> {
        self.log("open_write", path, || self.inner.open_write(path))
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        self.log("remove_file", path, || self.inner.remove_file(path))
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.log("copy", from, || self.inner.copy(from, to))
    }
}

impl<B: FsDir> FsDir for Traced<B> {
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
        self.log("read_dir", path, || self.inner.read_dir(path))
    }

    fn create_dir(&self, path: &str) -> Result<(), FsError> {
        self.log("create_dir", path, || self.inner.create_dir(path))
    }

    fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
        self.log("remove_dir_all", path, || self.inner.remove_dir_all(path))
    }
}
