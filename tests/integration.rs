//! Integration tests across modules.
//!
//! These tests verify that:
//! 1. Generic code written against `FileSystem` works with every backend
//! 2. Provider failures surface as the documented error taxonomy
//! 3. Middleware composes with configuration-built handles
//! 4. Backends are safe to share across threads

use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use urifs::*;

// =============================================================================
// Helpers
// =============================================================================

fn gcs() -> (Arc<InMemoryObjectStore>, ObjectStoreFs) {
    let store = Arc::new(InMemoryObjectStore::new().with_bucket("bucket"));
    let fs = ObjectStoreFs::new(Scheme::GCS, store.clone()).unwrap();
    (store, fs)
}

/// Checkpoint-style caller: writes, then remembers the version it wrote.
fn save<B: FileSystem + ?Sized>(fs: &B, path: &str, data: &[u8]) -> Result<ETag, FsError> {
    let path = fs.make_qualified(path)?;
    fs.write(path.as_str(), data)?;
    fs.etag(path.as_str())
}

// =============================================================================
// Generic callers
// =============================================================================

#[test]
fn generic_caller_works_on_every_backend() {
    let scratch = tempfile::tempdir().unwrap();
    let local = LocalFs::new();
    let local_root = local.qualify_local(scratch.path()).unwrap();
    let (_store, gcs) = gcs();
    let memory = MemoryFs::new();

    let backends: [(&dyn FileSystem, String); 3] = [
        (&local, local_root.join("ckpt").into_string()),
        (&gcs, "gs://bucket/ckpt".to_owned()),
        (&memory, "memory://bucket/ckpt".to_owned()),
    ];
    for (fs, path) in backends {
        let tag = save(fs, &path, b"weights").unwrap();
        assert!(!fs.has_changed(&path, &tag).unwrap(), "{path}");
        assert_eq!(fs.read_to_string(&path).unwrap(), "weights");
    }
}

#[test]
fn read_if_changed_polls_an_object_store() {
    let (_store, fs) = gcs();
    fs.write("gs://bucket/config", b"v1").unwrap();

    let (tag, data) = fs.read_if_changed("gs://bucket/config", None).unwrap().unwrap();
    assert_eq!(data, b"v1");
    assert!(fs.read_if_changed("gs://bucket/config", Some(&tag)).unwrap().is_none());

    fs.write("gs://bucket/config", b"v2").unwrap();
    let (next, data) = fs
        .read_if_changed("gs://bucket/config", Some(&tag))
        .unwrap()
        .unwrap();
    assert_ne!(next, tag);
    assert_eq!(data, b"v2");
}

#[test]
fn streaming_round_trip_through_dyn() {
    let (_store, gcs) = gcs();
    let fs: &dyn FileSystem = &gcs;
    {
        let mut w = fs.open_write("gs://bucket/log").unwrap();
        writeln!(w, "line one").unwrap();
        writeln!(w, "line two").unwrap();
    }
    let mut text = String::new();
    fs.open_read("gs://bucket/log")
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, "line one\nline two\n");
}

// =============================================================================
// Error taxonomy
// =============================================================================

#[test]
fn provider_failures_map_to_taxonomy() {
    let (store, fs) = gcs();
    fs.write("gs://bucket/a", b"x").unwrap();

    assert!(matches!(
        fs.etag("not-gs://bucket/a"),
        Err(FsError::InvalidArgument { .. })
    ));
    assert!(matches!(
        fs.etag("gs://bucket/nope"),
        Err(FsError::NotFound { .. })
    ));

    store.fail_next(1);
    let err = fs.etag("gs://bucket/a").unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("503"), "{err}");

    store.deny("bucket");
    assert!(matches!(
        fs.read("gs://bucket/a"),
        Err(FsError::PermissionDenied { .. })
    ));
}

#[test]
fn qualification_error_names_the_reason() {
    let fs = MemoryFs::new();
    let err = fs.make_qualified("gs://bucket/a").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("gs://bucket/a"), "{text}");
    assert!(text.contains("foreign scheme 'gs'"), "{text}");

    assert!(matches!(
        Scheme::MEMORY.classify("gs://bucket/a"),
        Err(Unqualified::ForeignScheme(name)) if name == "gs"
    ));
    assert_eq!(
        Scheme::MEMORY.classify("bucket/a").unwrap_err(),
        Unqualified::NoScheme
    );
}

// =============================================================================
// Middleware and configuration
// =============================================================================

#[test]
fn retry_layer_hides_transient_failures_from_handle() {
    let store = Arc::new(InMemoryObjectStore::new().with_bucket("bucket"));
    let client = store.clone();
    let factory = move |_: &ClientOptions| -> Result<Arc<dyn ObjectStoreClient>, FsError> {
        Ok(client.clone())
    };
    let config = BackendConfig::ObjectStore {
        scheme: "gs://".into(),
        credentials: None,
        timeout_secs: Some(5),
    };

    let fs = FileSystemHandle::from_config(&config, Some(&factory))
        .unwrap()
        .layer(RetryLayer::new(RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }))
        .layer(TracingLayer::new("integration"));

    fs.write("gs://bucket/a", b"x").unwrap();
    store.fail_next(3);
    assert_eq!(fs.read("gs://bucket/a").unwrap(), b"x");

    store.fail_next(10);
    assert!(fs.read("gs://bucket/a").unwrap_err().is_transient());
}

#[test]
fn dropping_handle_releases_client() {
    let store = Arc::new(InMemoryObjectStore::new().with_bucket("bucket"));
    let client = store.clone();
    let factory = move |_: &ClientOptions| -> Result<Arc<dyn ObjectStoreClient>, FsError> {
        Ok(client.clone())
    };
    let config = BackendConfig::ObjectStore {
        scheme: "s3://".into(),
        credentials: Some(Credentials::new("secret")),
        timeout_secs: None,
    };
    let fs = FileSystemHandle::from_config(&config, Some(&factory)).unwrap();
    assert!(!store.is_shut_down());
    drop(fs);
    assert!(store.is_shut_down());
}

#[test]
fn credentials_are_redacted() {
    let options = ClientOptions::default().with_credentials(Credentials::new("private-key"));
    assert!(!format!("{options:?}").contains("private-key"));
}

// =============================================================================
// Thread safety
// =============================================================================

#[test]
fn backends_are_shareable_across_threads() {
    let (_store, gcs) = gcs();
    let backends: [Arc<dyn FileSystem>; 2] = [Arc::new(MemoryFs::new()), Arc::new(gcs)];
    let roots = ["memory://bucket", "gs://bucket"];

    for (fs, root) in backends.into_iter().zip(roots) {
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let fs = Arc::clone(&fs);
                let path = format!("{root}/t/{i}");
                thread::spawn(move || {
                    for round in 0..20u32 {
                        fs.write(&path, &round.to_le_bytes()).unwrap();
                        assert!(!fs.etag(&path).unwrap().as_str().is_empty());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let entries = fs
            .read_dir(&format!("{root}/t"))
            .unwrap()
            .collect_all()
            .unwrap();
        assert_eq!(entries.len(), 8, "{root}");
    }
}

#[test]
fn concurrent_writers_leave_a_consistent_etag() {
    let fs = Arc::new(MemoryFs::new());
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || fs.write("memory://bucket/shared", &[i]).unwrap())
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let meta = fs.metadata("memory://bucket/shared").unwrap();
    assert_eq!(meta.etag, Some(fs.etag("memory://bucket/shared").unwrap()));
}
