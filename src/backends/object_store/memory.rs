//! In-process [`ObjectStoreClient`] used as a test double for cloud stores.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::time::SystemTime;

use parking_lot::RwLock;

use super::client::{ClientError, Listing, ObjectMeta, ObjectStoreClient};

/// Flat bucket/key store speaking the [`ObjectStoreClient`] protocol.
///
/// Behaves like a cloud object store: buckets must exist, every put gets a
/// new generation, and failures come back as status codes. Test hooks inject
/// permission and transient failures and count requests.
///
/// ```rust
/// use urifs::{InMemoryObjectStore, ObjectStoreClient};
///
/// let store = InMemoryObjectStore::new().with_bucket("b");
/// let meta = store.put("b", "k", b"v").unwrap();
/// assert_eq!(store.head("b", "k").unwrap().etag, meta.etag);
/// assert_eq!(store.head("other", "k").unwrap_err().status, Some(404));
/// ```
#[derive(Default)]
pub struct InMemoryObjectStore {
    buckets: RwLock<BTreeMap<String, BTreeMap<String, StoredObject>>>,
    denied: RwLock<BTreeSet<String>>,
    generation: AtomicI64,
    pending_failures: AtomicU32,
    requests: AtomicU64,
    shut_down: AtomicBool,
}

struct StoredObject {
    data: Vec<u8>,
    generation: i64,
    updated: SystemTime,
}

impl StoredObject {
    fn meta(&self, key: &str) -> ObjectMeta {
        ObjectMeta {
            key: key.to_owned(),
            size: self.data.len() as u64,
            etag: Some(format!("\"{:016x}\"", self.generation)),
            generation: Some(self.generation),
            updated: Some(self.updated),
        }
    }
}

impl InMemoryObjectStore {
    /// Create a store with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`create_bucket`](Self::create_bucket).
    pub fn with_bucket(self, name: &str) -> Self {
        self.create_bucket(name);
        self
    }

    /// Create an empty bucket if it does not exist.
    pub fn create_bucket(&self, name: &str) {
        self.buckets.write().entry(name.to_owned()).or_default();
    }

    /// Answer every request against `bucket` with 403.
    pub fn deny(&self, bucket: &str) {
        self.denied.write().insert(bucket.to_owned());
    }

    /// Answer the next `count` requests with 503.
    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of requests received so far, including failed ones.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Whether [`ObjectStoreClient::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn admit(&self, bucket: &str) -> Result<(), ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ClientError::status(503, "service unavailable"));
        }
        if self.denied.read().contains(bucket) {
            return Err(ClientError::status(403, format!("access to bucket {bucket} denied")));
        }
        Ok(())
    }

    fn next_generation(&self) -> i64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn no_bucket(bucket: &str) -> ClientError {
    ClientError::status(404, format!("bucket {bucket} not found"))
}

fn no_object(bucket: &str, key: &str) -> ClientError {
    ClientError::status(404, format!("object {bucket}/{key} not found"))
}

impl ObjectStoreClient for InMemoryObjectStore {
    fn head(&self, bucket: &str, key: &str) -> Result<ObjectMeta, ClientError> {
        self.admit(bucket)?;
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(|| no_bucket(bucket))?;
        objects
            .get(key)
            .map(|obj| obj.meta(key))
            .ok_or_else(|| no_object(bucket, key))
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ClientError> {
        self.admit(bucket)?;
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(|| no_bucket(bucket))?;
        objects
            .get(key)
            .map(|obj| obj.data.clone())
            .ok_or_else(|| no_object(bucket, key))
    }

    fn put(&self, bucket: &str, key: &str, data: &[u8]) -> Result<ObjectMeta, ClientError> {
        self.admit(bucket)?;
        let mut buckets = self.buckets.write();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_bucket(bucket))?;
        let obj = StoredObject {
            data: data.to_vec(),
            generation: self.next_generation(),
            updated: SystemTime::now(),
        };
        let meta = obj.meta(key);
        objects.insert(key.to_owned(), obj);
        Ok(meta)
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<(), ClientError> {
        self.admit(bucket)?;
        let mut buckets = self.buckets.write();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_bucket(bucket))?;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| no_object(bucket, key))
    }

    fn list(&self, bucket: &str, prefix: &str, recursive: bool) -> Result<Listing, ClientError> {
        self.admit(bucket)?;
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(|| no_bucket(bucket))?;

        let mut listing = Listing::default();
        let mut prefixes = BTreeSet::new();
        let under_prefix = objects
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix));
        for (key, obj) in under_prefix {
            let rest = &key[prefix.len()..];
            match rest.find('/') {
                Some(slash) if !recursive => {
                    prefixes.insert(format!("{prefix}{}", &rest[..=slash]));
                }
                _ => listing.objects.push(obj.meta(key)),
            }
        }
        listing.prefixes = prefixes.into_iter().collect();
        Ok(listing)
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}
