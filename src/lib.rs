//! # urifs
//!
//! A pluggable filesystem abstraction keyed by URI-like paths.
//!
//! Application code holds one [`FileSystem`] handle bound to one backend and
//! one scheme (`gs://`, `s3://`, `file://`, `memory://`, or a custom one) and
//! addresses objects with full paths such as `gs://bucket/ckpt/step-10`. Every
//! backend satisfies the same contract: identical qualification rules,
//! existence and metadata queries, and an [`ETag`] version token for change
//! detection and optimistic concurrency.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use urifs::{FileSystem, FsError, FsExt, FsQualify, FsWrite, MemoryFs};
//!
//! // Generic function that works with any backend
//! fn refresh<B: FileSystem>(fs: &B, path: &str, seen: Option<&urifs::ETag>) -> Result<(), FsError> {
//!     let path = fs.make_qualified(path)?;
//!     if let Some((tag, data)) = fs.read_if_changed(path.as_str(), seen)? {
//!         println!("{path} is now {tag} ({} bytes)", data.len());
//!     }
//!     Ok(())
//! }
//!
//! let fs = MemoryFs::new();
//! fs.write("memory://bucket/config.json", b"{}").unwrap();
//! refresh(&fs, "memory://bucket/config.json", None).unwrap();
//!
//! // Foreign or unscoped input never reaches the storage medium
//! assert!(fs.make_qualified("not-memory://bucket/config.json").is_err());
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FileSystem`] | The capability contract every backend satisfies |
//! | [`Scheme`] | A scheme token and its addressing rules; qualifies paths |
//! | [`QualifiedPath`] | Proof that a path carries the backend's scheme |
//! | [`ETag`] | Opaque, non-empty version token of one object |
//! | [`FsError`] | Normalized error taxonomy |
//! | [`Metadata`] | Size, type, modification time and tag of one path |
//! | [`DirEntry`] | Single directory listing entry |
//!
//! ---
//!
//! ## Backends
//!
//! | Backend | Scheme | Storage |
//! |---------|--------|---------|
//! | [`LocalFs`] | `file://` | Local disk |
//! | [`MemoryFs`] | `memory://` or custom | Process memory |
//! | [`ObjectStoreFs`] | `gs://`, `s3://` or custom | Any [`ObjectStoreClient`] |
//!
//! [`FileSystemHandle`] wraps the three in a closed enum selected once from
//! a [`BackendConfig`].
//!
//! ---
//!
//! ## Trait Hierarchy
//!
//! ```text
//! FsQualify ─┬─ FsRead  ─┐
//!            ├─ FsWrite ─┼─▶ FileSystem
//!            └─ FsDir   ─┘
//! ```
//!
//! [`FileSystem`] has a **blanket implementation**. Implement the component
//! traits and you get the composite for free, plus [`FsExt`] and
//! [`LayerExt`].
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, FsError>`. Callers branch on four
//! variants:
//!
//! | Variant | Meaning | Retry? |
//! |---------|---------|--------|
//! | [`FsError::InvalidArgument`] | Path failed qualification | Never |
//! | [`FsError::NotFound`] | Object absent | No |
//! | [`FsError::PermissionDenied`] | Backend refused access | No |
//! | [`FsError::Transient`] | I/O, network, throttling | Yes, see [`RetryLayer`] |
//!
//! ```rust
//! use urifs::FsError;
//!
//! let err = FsError::PermissionDenied {
//!     path: "gs://bucket/secret".into(),
//!     operation: "etag",
//! };
//! assert_eq!(err.to_string(), "etag: permission denied: gs://bucket/secret");
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self`; backends keep
//! their state behind interior mutability. Share a backend across threads
//! with `Arc<B>`.
//!
//! ---
//!
//! ## Logging
//!
//! Backends emit `tracing` events at `debug` for I/O they perform and at
//! `warn` for failures they cannot return (a writer dropped with an
//! unflushed upload). Wrap a backend in [`TracingLayer`] to log every
//! operation with its outcome and latency.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`Metadata`], [`DirEntry`], [`ETag`], [`BackendConfig`]; adds `FsExtJson` |

// Private modules
mod backends;
mod error;
mod ext;
mod handle;
mod layer;
mod middleware;
mod path;
mod traits;
mod types;

pub mod conformance;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - qualification
pub use path::{Addressing, QualifiedPath, Scheme, Unqualified};

// Public re-exports - core types
pub use types::{DirEntry, ETag, FileType, Metadata};

// Public re-exports - traits
pub use traits::{FileSystem, FsDir, FsQualify, FsRead, FsWrite, ReadDirIter};

// Public re-exports - backends
pub use backends::{
    ClientError, ClientFactory, ClientOptions, Credentials, InMemoryObjectStore, Listing,
    LocalFs, MemoryFs, ObjectMeta, ObjectStoreClient, ObjectStoreFs,
};
pub use handle::{BackendConfig, FileSystemHandle};

// Public re-exports - infrastructure
pub use ext::FsExt;
pub use layer::{Layer, LayerExt};
pub use middleware::{Retry, RetryLayer, RetryPolicy, Traced, TracingLayer};

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::FsExtJson;
