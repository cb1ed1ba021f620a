//! The conformance battery, run against every built-in backend.
//!
//! Each backend is exercised directly, through the [`FileSystemHandle`] that
//! configuration-driven callers hold, and behind the shipped middleware to
//! prove wrappers keep the contract.

use std::sync::Arc;

use tempfile::TempDir;
use urifs::conformance::{self, Fixture};
use urifs::*;
use yare::parameterized;

#[derive(Clone, Copy)]
enum Kind {
    Memory,
    Local,
    ObjectStore,
}

#[derive(Clone, Copy)]
enum Access {
    Direct,
    Handle,
    Layered,
}

fn object_store_client() -> Arc<dyn ObjectStoreClient> {
    Arc::new(InMemoryObjectStore::new().with_bucket("bucket"))
}

/// Backend under test, its fixture, and the scratch directory that must
/// outlive a local backend.
fn backend(kind: Kind) -> (FileSystemHandle, Fixture, Option<TempDir>) {
    match kind {
        Kind::Memory => (
            MemoryFs::new().into(),
            Fixture::new("memory://bucket/conformance"),
            None,
        ),
        Kind::Local => {
            let scratch = tempfile::tempdir().unwrap();
            let fs = LocalFs::new();
            let root = fs.qualify_local(scratch.path()).unwrap().into_string();
            (fs.into(), Fixture::new(root), Some(scratch))
        }
        Kind::ObjectStore => (
            ObjectStoreFs::new(Scheme::GCS, object_store_client())
                .unwrap()
                .into(),
            Fixture::new("gs://bucket/conformance"),
            None,
        ),
    }
}

#[parameterized(
    memory_direct = { Kind::Memory, Access::Direct },
    memory_handle = { Kind::Memory, Access::Handle },
    memory_layered = { Kind::Memory, Access::Layered },
    local_direct = { Kind::Local, Access::Direct },
    local_handle = { Kind::Local, Access::Handle },
    local_layered = { Kind::Local, Access::Layered },
    object_store_direct = { Kind::ObjectStore, Access::Direct },
    object_store_handle = { Kind::ObjectStore, Access::Handle },
    object_store_layered = { Kind::ObjectStore, Access::Layered },
)]
fn full_battery(kind: Kind, access: Access) {
    let (handle, fixture, _scratch) = backend(kind);
    match access {
        Access::Direct => match &handle {
            FileSystemHandle::Local(fs) => conformance::run(fs, &fixture),
            FileSystemHandle::ObjectStore(fs) => conformance::run(fs, &fixture),
            FileSystemHandle::Memory(fs) => conformance::run(fs, &fixture),
        },
        Access::Handle => conformance::run(&handle, &fixture),
        Access::Layered => {
            let wrapped = handle
                .layer(RetryLayer::default())
                .layer(TracingLayer::new("conformance"));
            conformance::run(&wrapped, &fixture);
        }
    }
}

#[test]
fn gcs_scheme_scenario() {
    let fs = ObjectStoreFs::new(Scheme::GCS, object_store_client()).unwrap();
    assert_eq!(
        fs.make_qualified("gs://bucket/path").unwrap(),
        "gs://bucket/path"
    );
    assert!(matches!(
        fs.make_qualified("not-gs://bucket/path"),
        Err(FsError::InvalidArgument { .. })
    ));
}

#[test]
fn custom_memory_scheme_passes() {
    let scheme = Scheme::new("scratch://", Addressing::Bucketed).unwrap();
    let fs = MemoryFs::with_scheme(scheme).unwrap();
    conformance::run(&fs, &Fixture::new("scratch://b/conformance"));
}

#[test]
fn s3_object_store_passes() {
    let fs = ObjectStoreFs::new(Scheme::S3, object_store_client()).unwrap();
    conformance::run(&fs, &Fixture::new("s3://bucket/deep/conformance"));
}
