//! Retry wrapper for transient backend failures.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::{
    ETag, FileSystem, FsDir, FsError, FsQualify, FsRead, FsWrite, Layer, Metadata, QualifiedPath,
    ReadDirIter, Scheme,
};

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled after every failure.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Layer that adds retries to a backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryLayer {
    policy: RetryPolicy,
}

impl RetryLayer {
    /// Retry according to `policy`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl<B: FileSystem> Layer<B> for RetryLayer {
    type Backend = Retry<B>;

    fn layer(self, backend: B) -> Self::Backend {
        Retry {
            inner: backend,
            policy: self.policy,
        }
    }
}

/// Backend wrapper that retries operations failing with
/// [`FsError::Transient`]. Every other error, including failed
/// qualification, is returned on the first attempt.
///
/// Streaming operations retry only the open; data already handed out by a
/// reader or writer is not replayed.
pub struct Retry<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B> Retry<B> {
    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn run<T>(
        &self,
        operation: &'static str,
        path: &str,
        mut call: impl FnMut() -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    debug!(operation, path, attempt, ?delay, %error, "retrying transient failure");
                    thread::sleep(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl<B: FsQualify> FsQualify for Retry<B> {
    fn scheme(&self) -> &Scheme {
        self.inner.scheme()
    }

    fn make_qualified(&self, path: &str) -> Result<QualifiedPath, FsError> {
        self.inner.make_qualified(path)
    }

    fn supports_scheme(&self, name: &str) -> bool {
        self.inner.supports_scheme(name)
    }
}

impl<B: FsRead> FsRead for Retry<B> {
    fn etag(&self, path: &str) -> Result<ETag, FsError> {
        self.run("etag", path, || self.inner.etag(path))
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        self.run("exists", path, || self.inner.exists(path))
    }

    fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
        self.run("metadata", path, || self.inner.metadata(path))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.run("read", path, || self.inner.read(path))
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError> {
        self.run("open_read", path, || self.inner.open_read(path))
    }
}

impl<B: FsWrite> FsWrite for Retry<B> {
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        self.run("write", path, || self.inner.write(path, data))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError> {
        self.run("open_write", path, || self.inner.open_write(path))
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        self.run("remove_file", path, || self.inner.remove_file(path))
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.run("copy", from, || self.inner.copy(from, to))
    }
}

impl<B: FsDir> FsDir for Retry<B> {
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
        self.run("read_dir", path, || self.inner.read_dir(path))
    }

    fn create_dir(&self, path: &str) -> Result<(), FsError> {
        self.run("create_dir", path, || self.inner.create_dir(path))
    }

    fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
        self.run("remove_dir_all", path, || self.inner.remove_dir_all(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryObjectStore, LayerExt, ObjectStoreClient, ObjectStoreFs};
    use std::sync::Arc;

    fn quick() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    fn flaky() -> (Arc<InMemoryObjectStore>, Retry<ObjectStoreFs>) {
        let store = Arc::new(InMemoryObjectStore::new().with_bucket("b"));
        store.put("b", "a", b"x").unwrap();
        let fs = ObjectStoreFs::new(Scheme::GCS, store.clone())
            .unwrap()
            .layer(RetryLayer::new(quick()));
        (store, fs)
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[test]
    fn transient_failures_are_retried() {
        let (store, fs) = flaky();
        let before = store.request_count();
        store.fail_next(2);
        assert!(fs.etag("gs://b/a").is_ok());
        assert_eq!(store.request_count() - before, 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let (store, fs) = flaky();
        store.fail_next(5);
        assert!(fs.etag("gs://b/a").unwrap_err().is_transient());
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        let (store, fs) = flaky();
        let before = store.request_count();
        assert!(fs.etag("gs://b/missing").unwrap_err().is_not_found());
        // head, then one listing to rule out a directory
        assert_eq!(store.request_count() - before, 2);
    }

    #[test]
    fn qualification_failures_are_not_retried() {
        let (store, fs) = flaky();
        let before = store.request_count();
        assert!(matches!(
            fs.etag("not-gs://b/a"),
            Err(FsError::InvalidArgument { .. })
        ));
        assert_eq!(store.request_count(), before);
    }
}
