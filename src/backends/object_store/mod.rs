//! # Object Store Backend
//!
//! Adapts any [`ObjectStoreClient`] (cloud blob storage) to the
//! [`FileSystem`](crate::FileSystem) contract.
//!
//! ## Responsibility
//! - Qualify every path against the configured bucketed scheme before any request
//! - Emulate directories as key prefixes ending in `/`
//! - Populate [`ETag`] from the provider's etag, falling back to its generation
//! - Translate provider status codes into [`FsError`]
//!
//! ## Construction
//!
//! ```rust
//! use std::sync::Arc;
//! use urifs::{ClientOptions, FsRead, FsWrite, InMemoryObjectStore, ObjectStoreFs, Scheme};
//!
//! let fs = ObjectStoreFs::connect(Scheme::GCS, &ClientOptions::default(), &|_options| {
//!     Ok(Arc::new(InMemoryObjectStore::new().with_bucket("bucket")))
//! })
//! .unwrap();
//!
//! fs.write("gs://bucket/a", b"data").unwrap();
//! assert!(!fs.etag("gs://bucket/a").unwrap().as_str().is_empty());
//! ```

mod client;
mod memory;

pub use client::{
    ClientError, ClientFactory, ClientOptions, Credentials, Listing, ObjectMeta,
    ObjectStoreClient,
};
pub use memory::InMemoryObjectStore;

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    Addressing, DirEntry, ETag, FileType, FsDir, FsError, FsQualify, FsRead, FsWrite, Metadata,
    QualifiedPath, ReadDirIter, Scheme,
};

/// Filesystem over a cloud object store.
///
/// Owns its client and calls [`ObjectStoreClient::shutdown`] once the
/// backend and every writer it opened are dropped. Each backend assumes sole
/// use of its client, so a [`ClientFactory`] should build a fresh one per
/// call. Safe to share across threads.
pub struct ObjectStoreFs {
    scheme: Scheme,
    client: Arc<ClientLease>,
}

/// Shared ownership of a client; the last holder shuts it down.
struct ClientLease {
    scheme: Scheme,
    client: Arc<dyn ObjectStoreClient>,
}

impl std::ops::Deref for ClientLease {
    type Target = dyn ObjectStoreClient;

    fn deref(&self) -> &Self::Target {
        self.client.as_ref()
    }
}

impl Drop for ClientLease {
    fn drop(&mut self) {
        debug!(scheme = %self.scheme, "object store: releasing client");
        self.client.shutdown();
    }
}

impl ObjectStoreFs {
    /// Wrap an already-constructed client.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if `scheme` is not bucketed
    pub fn new(scheme: Scheme, client: Arc<dyn ObjectStoreClient>) -> Result<Self, FsError> {
        if scheme.addressing() != Addressing::Bucketed {
            return Err(FsError::InvalidArgument {
                path: scheme.token().to_owned(),
                reason: "object stores need a bucketed scheme".into(),
            });
        }
        Ok(Self {
            client: Arc::new(ClientLease {
                scheme: scheme.clone(),
                client,
            }),
            scheme,
        })
    }

    /// Build the client through `factory` and wrap it.
    ///
    /// # Errors
    ///
    /// - Whatever the factory returns
    /// - [`FsError::InvalidArgument`] if `scheme` is not bucketed
    pub fn connect(
        scheme: Scheme,
        options: &ClientOptions,
        factory: &ClientFactory,
    ) -> Result<Self, FsError> {
        debug!(
            scheme = %scheme,
            explicit_credentials = options.credentials.is_some(),
            timeout = ?options.timeout,
            "object store: creating client"
        );
        let client = factory(options)?;
        Self::new(scheme, client)
    }

    /// The underlying client.
    pub fn client(&self) -> &dyn ObjectStoreClient {
        &**self.client
    }

    fn qualify(&self, path: &str) -> Result<QualifiedPath, FsError> {
        self.make_qualified(path)
    }

    /// Whether any object lives under `key/`.
    fn has_prefix(&self, path: &str, q: &QualifiedPath) -> Result<bool, FsError> {
        let listing = self
            .client
            .list(q.bucket(), &dir_prefix(q.key()), true)
            .map_err(|e| e.into_fs_error(path, "list"))?;
        Ok(!listing.objects.is_empty())
    }

    /// Classify a 404 on `key`: a prefix with children is a directory.
    fn missing_object(&self, path: &str, q: &QualifiedPath) -> FsError {
        match self.has_prefix(path, q) {
            Ok(true) => FsError::NotAFile { path: path.into() },
            Ok(false) => FsError::NotFound { path: path.into() },
            Err(e) => e,
        }
    }

    /// Key of an object to look up. A directory-form path (bucket root or
    /// `/`-terminated key) is `NotAFile` if anything lives there, otherwise
    /// `NotFound`.
    fn object_key<'a>(&self, path: &str, q: &'a QualifiedPath) -> Result<&'a str, FsError> {
        let key = q.key();
        if key.is_empty() || key.ends_with('/') {
            return Err(self.directory_form(path, q));
        }
        Ok(key)
    }

    /// Key of an object to create; directory-form paths cannot hold content.
    fn writable_key<'a>(&self, path: &str, q: &'a QualifiedPath) -> Result<&'a str, FsError> {
        let key = q.key();
        if key.is_empty() || key.ends_with('/') {
            return Err(FsError::NotAFile { path: path.into() });
        }
        Ok(key)
    }

    fn directory_form(&self, path: &str, q: &QualifiedPath) -> FsError {
        let key = q.key().trim_end_matches('/');
        if key.is_empty() {
            return match self.client.list(q.bucket(), "", false) {
                Ok(_) => FsError::NotAFile { path: path.into() },
                Err(e) => e.into_fs_error(path, "list"),
            };
        }
        match self.client.head(q.bucket(), key) {
            Ok(_) => FsError::NotAFile { path: path.into() },
            Err(e) if e.is_not_found() => self.missing_object(path, q),
            Err(e) => e.into_fs_error(path, "head"),
        }
    }

    fn entry_path(&self, bucket: &str, key: &str) -> String {
        format!("{}{bucket}/{key}", self.scheme.token())
    }
}

/// `key` as a directory prefix: empty for the bucket root, otherwise ending in `/`.
fn dir_prefix(key: &str) -> String {
    let trimmed = key.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

fn object_etag(path: &str, meta: &ObjectMeta) -> Result<ETag, FsError> {
    meta.etag
        .clone()
        .and_then(ETag::new)
        .or_else(|| meta.generation.and_then(|g| ETag::new(g.to_string())))
        .ok_or_else(|| FsError::Backend(format!("object store returned no version for {path}")))
}

impl FsQualify for ObjectStoreFs {
    fn scheme(&self) -> &Scheme {
        &self.scheme
    }
}

impl FsRead for ObjectStoreFs {
    fn etag(&self, path: &str) -> Result<ETag, FsError> {
        let q = self.qualify(path)?;
        let key = self.object_key(path, &q)?;
        debug!(path, "object store: head for etag");
        match self.client.head(q.bucket(), key) {
            Ok(meta) => object_etag(path, &meta),
            Err(e) if e.is_not_found() => Err(self.missing_object(path, &q)),
            Err(e) => Err(e.into_fs_error(path, "etag")),
        }
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        let q = self.qualify(path)?;
        if q.key().trim_end_matches('/').is_empty() {
            return match self.client.list(q.bucket(), "", false) {
                Ok(_) => Ok(true),
                Err(e) if e.is_not_found() => Ok(false),
                Err(e) => Err(e.into_fs_error(path, "exists")),
            };
        }
        if !q.key().ends_with('/') {
            match self.client.head(q.bucket(), q.key()) {
                Ok(_) => return Ok(true),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into_fs_error(path, "exists")),
            }
        }
        match self.has_prefix(path, &q) {
            Err(FsError::NotFound { .. }) => Ok(false),
            other => other,
        }
    }

    fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
        let q = self.qualify(path)?;
        if q.key().trim_end_matches('/').is_empty() {
            self.client
                .list(q.bucket(), "", false)
                .map_err(|e| e.into_fs_error(path, "metadata"))?;
            return Ok(Metadata::directory(q.into_string()));
        }
        if !q.key().ends_with('/') {
            match self.client.head(q.bucket(), q.key()) {
                Ok(meta) => {
                    return Ok(Metadata {
                        etag: Some(object_etag(path, &meta)?),
                        path: q.into_string(),
                        file_type: FileType::File,
                        size: meta.size,
                        modified: meta.updated,
                    });
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into_fs_error(path, "metadata")),
            }
        }
        if self.has_prefix(path, &q)? {
            Ok(Metadata::directory(q.into_string()))
        } else {
            Err(FsError::NotFound { path: path.into() })
        }
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let q = self.qualify(path)?;
        let key = self.object_key(path, &q)?;
        match self.client.get(q.bucket(), key) {
            Ok(data) => Ok(data),
            Err(e) if e.is_not_found() => Err(self.missing_object(path, &q)),
            Err(e) => Err(e.into_fs_error(path, "read")),
        }
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError> {
        Ok(Box::new(Cursor::new(self.read(path)?)))
    }
}

impl FsWrite for ObjectStoreFs {
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let q = self.qualify(path)?;
        let key = self.writable_key(path, &q)?;
        let meta = self
            .client
            .put(q.bucket(), key, data)
            .map_err(|e| e.into_fs_error(path, "write"))?;
        debug!(path, size = meta.size, generation = ?meta.generation, "object store: put");
        Ok(())
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError> {
        let q = self.qualify(path)?;
        let key = self.writable_key(path, &q)?.to_owned();
        Ok(Box::new(ObjectWriter {
            client: Arc::clone(&self.client),
            path: path.to_owned(),
            bucket: q.bucket().to_owned(),
            key,
            buf: Vec::new(),
            dirty: true,
        }))
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        let q = self.qualify(path)?;
        let key = self.object_key(path, &q)?;
        match self.client.delete(q.bucket(), key) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(self.missing_object(path, &q)),
            Err(e) => Err(e.into_fs_error(path, "remove_file")),
        }
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        let src = self.qualify(from)?;
        let dst = self.qualify(to)?;
        let src_key = self.object_key(from, &src)?;
        let dst_key = self.writable_key(to, &dst)?;
        match self.client.copy(src.bucket(), src_key, dst.bucket(), dst_key) {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Err(self.missing_object(from, &src)),
            Err(e) => Err(e.into_fs_error(from, "copy")),
        }
    }
}

impl FsDir for ObjectStoreFs {
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
        let q = self.qualify(path)?;
        let prefix = dir_prefix(q.key());
        let listing = self
            .client
            .list(q.bucket(), &prefix, false)
            .map_err(|e| e.into_fs_error(path, "read_dir"))?;

        if listing.objects.is_empty() && listing.prefixes.is_empty() && !prefix.is_empty() {
            return match self.client.head(q.bucket(), q.key().trim_end_matches('/')) {
                Ok(_) => Err(FsError::NotADirectory { path: path.into() }),
                Err(e) if e.is_not_found() => Err(FsError::NotFound { path: path.into() }),
                Err(e) => Err(e.into_fs_error(path, "read_dir")),
            };
        }

        let bucket = q.bucket();
        let files = listing
            .objects
            .iter()
            // A zero-length placeholder named after the prefix marks the directory itself.
            .filter(|obj| obj.key != prefix)
            .map(|obj| {
                Ok::<_, FsError>(DirEntry {
                    name: obj.key[prefix.len()..].to_owned(),
                    path: self.entry_path(bucket, &obj.key),
                    file_type: FileType::File,
                    size: obj.size,
                })
            });
        let dirs = listing.prefixes.iter().map(|sub| {
            Ok(DirEntry {
                name: sub[prefix.len()..].trim_end_matches('/').to_owned(),
                path: self.entry_path(bucket, sub.trim_end_matches('/')),
                file_type: FileType::Directory,
                size: 0,
            })
        });
        Ok(ReadDirIter::from_vec(files.chain(dirs).collect()))
    }

    fn create_dir(&self, path: &str) -> Result<(), FsError> {
        self.qualify(path)?;
        debug!(path, "object store: create_dir is a no-op");
        Ok(())
    }

    fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
        let q = self.qualify(path)?;
        let listing = self
            .client
            .list(q.bucket(), &dir_prefix(q.key()), true)
            .map_err(|e| e.into_fs_error(path, "remove_dir_all"))?;

        if listing.objects.is_empty() {
            if q.key().trim_end_matches('/').is_empty() {
                return Err(FsError::NotFound { path: path.into() });
            }
            return match self.client.head(q.bucket(), q.key().trim_end_matches('/')) {
                Ok(_) => Err(FsError::NotADirectory { path: path.into() }),
                Err(e) if e.is_not_found() => Err(FsError::NotFound { path: path.into() }),
                Err(e) => Err(e.into_fs_error(path, "remove_dir_all")),
            };
        }

        for obj in &listing.objects {
            match self.client.delete(q.bucket(), &obj.key) {
                Ok(()) => {}
                // Deleted concurrently; the outcome is the same.
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    let failed = self.entry_path(q.bucket(), &obj.key);
                    return Err(e.into_fs_error(&failed, "remove_dir_all"));
                }
            }
        }
        debug!(path, removed = listing.objects.len(), "object store: removed tree");
        Ok(())
    }
}

/// Buffers writes and uploads the whole buffer on flush, or on drop if
/// anything is pending.
struct ObjectWriter {
    client: Arc<ClientLease>,
    path: String,
    bucket: String,
    key: String,
    buf: Vec<u8>,
    dirty: bool,
}

impl ObjectWriter {
    fn upload(&mut self) -> Result<(), FsError> {
        if self.dirty {
            self.client
                .put(&self.bucket, &self.key, &self.buf)
                .map_err(|e| e.into_fs_error(&self.path, "open_write"))?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl Write for ObjectWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.dirty = true;
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.upload().map_err(std::io::Error::other)
    }
}

impl Drop for ObjectWriter {
    fn drop(&mut self) {
        if let Err(error) = self.upload() {
            warn!(path = %self.path, %error, "object store: dropped writer failed to upload");
        }
    }
}
