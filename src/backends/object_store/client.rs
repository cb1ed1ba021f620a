//! The seam between [`ObjectStoreFs`](super::ObjectStoreFs) and a provider SDK.
//!
//! A concrete network client (GCS, S3, Azure, ...) lives outside this crate
//! and implements [`ObjectStoreClient`]. It is built by an injected
//! [`ClientFactory`] from [`ClientOptions`], which is where explicit
//! credentials and the transport timeout are threaded through. Ambient
//! credential discovery is the factory's concern; the adapter never reads
//! the environment.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::FsError;

/// Opaque credential blob, such as the contents of a service-account key file.
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Credentials(String);

impl Credentials {
    /// Wrap a credential blob.
    pub fn new(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    /// The raw blob, for handing to a provider SDK.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// Options handed to a [`ClientFactory`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Explicit credentials. When `None`, the factory uses ambient discovery.
    pub credentials: Option<Credentials>,
    /// Per-request timeout enforced by the transport.
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    /// Use explicit credentials instead of ambient discovery.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the per-request transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Builds a client from options. Called once, when a backend is constructed.
pub type ClientFactory =
    dyn Fn(&ClientOptions) -> Result<Arc<dyn ObjectStoreClient>, FsError> + Send + Sync;

/// Provider-native object metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object key within its bucket.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Provider etag, if the provider reports one.
    pub etag: Option<String>,
    /// Provider generation or version number, if any.
    pub generation: Option<i64>,
    /// Last update time.
    pub updated: Option<SystemTime>,
}

/// Result of a listing under a key prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Objects whose keys start with the prefix.
    pub objects: Vec<ObjectMeta>,
    /// For non-recursive listings, the distinct "subdirectory" prefixes
    /// (each ending in `/`) directly under the requested prefix.
    pub prefixes: Vec<String>,
}

/// Failure reported by a provider client.
///
/// `status` carries the provider's HTTP-style code. `None` means the request
/// never got a response (connection failure, timeout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    /// Provider status code, if a response was received.
    pub status: Option<u16>,
    /// Provider diagnostic text.
    pub message: String,
}

impl ClientError {
    /// An error response with a status code.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// A transport failure with no response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Whether this is a "not found" response.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Normalize into the crate's error taxonomy.
    pub fn into_fs_error(self, path: &str, operation: &'static str) -> FsError {
        match self.status {
            Some(400) => FsError::InvalidArgument {
                path: path.into(),
                reason: self.message,
            },
            Some(401 | 403) => FsError::PermissionDenied {
                path: path.into(),
                operation,
            },
            Some(404) => FsError::NotFound { path: path.into() },
            None | Some(408 | 429 | 500..=599) => FsError::Transient {
                path: path.into(),
                operation,
                message: self.to_string(),
            },
            Some(_) => FsError::Backend(format!("{operation} {path}: {self}")),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{status}: {}", self.message),
            None => write!(f, "transport: {}", self.message),
        }
    }
}

impl std::error::Error for ClientError {}

/// Blocking operations a provider SDK must offer.
///
/// Implementations must be safe for concurrent use once constructed.
pub trait ObjectStoreClient: Send + Sync {
    /// Fetch object metadata without content.
    fn head(&self, bucket: &str, key: &str) -> Result<ObjectMeta, ClientError>;

    /// Fetch object content.
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ClientError>;

    /// Create or replace an object.
    fn put(&self, bucket: &str, key: &str, data: &[u8]) -> Result<ObjectMeta, ClientError>;

    /// Delete an object.
    fn delete(&self, bucket: &str, key: &str) -> Result<(), ClientError>;

    /// List objects under `prefix`. Non-recursive listings group deeper keys
    /// into [`Listing::prefixes`] at the next `/`.
    fn list(&self, bucket: &str, prefix: &str, recursive: bool) -> Result<Listing, ClientError>;

    /// Server-side copy. The default downloads and re-uploads.
    fn copy(
        &self,
        bucket: &str,
        from: &str,
        to_bucket: &str,
        to: &str,
    ) -> Result<ObjectMeta, ClientError> {
        let data = self.get(bucket, from)?;
        self.put(to_bucket, to, &data)
    }

    /// Release connections and credential caches. Called when the owning
    /// backend is dropped.
    fn shutdown(&self) {}
}
