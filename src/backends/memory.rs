//! In-memory backend.
//!
//! A hierarchical store kept entirely in process memory, addressed as
//! `memory://<bucket>/<key>`. Useful as a fast double for code written
//! against [`FileSystem`](crate::FileSystem) and as the always-available
//! subject of the conformance suite.
//!
//! Buckets need no creation: every bucket root is an (initially empty)
//! directory. Parent directories are created implicitly by writes.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{
    Addressing, DirEntry, ETag, FileType, FsDir, FsError, FsQualify, FsRead, FsWrite, Metadata,
    QualifiedPath, ReadDirIter, Scheme,
};

/// In-memory filesystem.
///
/// Every successful write bumps a store-wide generation counter, and the
/// object's [`ETag`] is its generation. Rewriting identical bytes therefore
/// still yields a new tag, like a cloud object generation number.
///
/// ```rust
/// use urifs::{FsRead, FsWrite, MemoryFs};
///
/// let fs = MemoryFs::new();
/// fs.write("memory://bucket/a", b"one").unwrap();
/// let before = fs.etag("memory://bucket/a").unwrap();
/// fs.write("memory://bucket/a", b"one").unwrap();
/// assert_ne!(before, fs.etag("memory://bucket/a").unwrap());
/// ```
pub struct MemoryFs {
    scheme: Scheme,
    state: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
    /// File contents keyed by `<bucket>/<key>`.
    files: BTreeMap<String, StoredFile>,
    /// Directories created explicitly or as parents of a write.
    dirs: BTreeSet<String>,
    generation: u64,
}

struct StoredFile {
    data: Vec<u8>,
    generation: u64,
    modified: SystemTime,
}

impl MemoryFs {
    /// Create an empty store under [`Scheme::MEMORY`].
    pub fn new() -> Self {
        Self {
            scheme: Scheme::MEMORY,
            state: Arc::default(),
        }
    }

    /// Create an empty store answering to a custom bucketed scheme.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if `scheme` is not bucketed
    pub fn with_scheme(scheme: Scheme) -> Result<Self, FsError> {
        if scheme.addressing() != Addressing::Bucketed {
            return Err(FsError::InvalidArgument {
                path: scheme.token().to_owned(),
                reason: "in-memory backend needs a bucketed scheme".into(),
            });
        }
        Ok(Self {
            scheme,
            state: Arc::default(),
        })
    }

    fn qualify(&self, path: &str) -> Result<QualifiedPath, FsError> {
        self.make_qualified(path)
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage key of a qualified path: `<bucket>/<key>` without trailing `/`.
fn location(path: &QualifiedPath) -> &str {
    path.location().trim_end_matches('/')
}

/// Every proper ancestor of `loc`, starting at the bucket root.
fn ancestors(loc: &str) -> impl Iterator<Item = &str> {
    loc.match_indices('/').map(move |(i, _)| &loc[..i])
}

fn is_bucket_root(loc: &str) -> bool {
    !loc.contains('/')
}

/// A `/`-terminated path (or a bare bucket) can only name a directory.
fn names_directory(path: &QualifiedPath) -> bool {
    path.location().ends_with('/') || is_bucket_root(path.location())
}

/// Storage key for a file write; directory-form paths cannot hold content.
fn file_location<'a>(path: &str, q: &'a QualifiedPath) -> Result<&'a str, FsError> {
    if names_directory(q) {
        return Err(FsError::NotAFile { path: path.into() });
    }
    Ok(location(q))
}

impl State {
    fn has_children(&self, loc: &str) -> bool {
        let prefix = format!("{loc}/");
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
            || self
                .dirs
                .range(prefix.clone()..)
                .next()
                .is_some_and(|k| k.starts_with(&prefix))
    }

    fn is_dir(&self, loc: &str) -> bool {
        is_bucket_root(loc) || self.dirs.contains(loc) || self.has_children(loc)
    }

    /// Ensure `loc` and all its ancestors can be directories, then record them.
    fn make_dirs(&mut self, path: &str, loc: &str) -> Result<(), FsError> {
        if ancestors(loc)
            .chain(std::iter::once(loc))
            .any(|dir| self.files.contains_key(dir))
        {
            return Err(FsError::NotADirectory { path: path.into() });
        }
        for dir in ancestors(loc).chain(std::iter::once(loc)) {
            self.dirs.insert(dir.to_owned());
        }
        Ok(())
    }

    fn put(&mut self, path: &str, loc: &str, data: Vec<u8>) -> Result<(), FsError> {
        if self.is_dir(loc) {
            return Err(FsError::NotAFile { path: path.into() });
        }
        if let Some(parent) = ancestors(loc).last() {
            self.make_dirs(path, parent)?;
        }
        self.generation += 1;
        self.files.insert(
            loc.to_owned(),
            StoredFile {
                data,
                generation: self.generation,
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn file(&self, path: &str, q: &QualifiedPath) -> Result<&StoredFile, FsError> {
        let loc = location(q);
        match self.files.get(loc) {
            Some(_) if names_directory(q) => Err(FsError::NotAFile { path: path.into() }),
            Some(file) => Ok(file),
            None if self.is_dir(loc) => Err(FsError::NotAFile { path: path.into() }),
            None => Err(FsError::NotFound { path: path.into() }),
        }
    }
}

impl FsQualify for MemoryFs {
    fn scheme(&self) -> &Scheme {
        &self.scheme
    }
}

impl FsRead for MemoryFs {
    fn etag(&self, path: &str) -> Result<ETag, FsError> {
        let q = self.qualify(path)?;
        let state = self.state.read();
        let file = state.file(path, &q)?;
        ETag::new(file.generation.to_string())
            .ok_or_else(|| FsError::Backend(format!("empty generation for {path}")))
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        let q = self.qualify(path)?;
        let loc = location(&q);
        let state = self.state.read();
        if names_directory(&q) {
            return Ok(state.is_dir(loc));
        }
        Ok(state.files.contains_key(loc) || state.is_dir(loc))
    }

    fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
        let q = self.qualify(path)?;
        let loc = location(&q);
        let state = self.state.read();
        if let Some(file) = state.files.get(loc).filter(|_| !names_directory(&q)) {
            return Ok(Metadata {
                path: q.into_string(),
                file_type: FileType::File,
                size: file.data.len() as u64,
                modified: Some(file.modified),
                etag: ETag::new(file.generation.to_string()),
            });
        }
        if state.is_dir(loc) {
            return Ok(Metadata::directory(q.into_string()));
        }
        Err(FsError::NotFound { path: path.into() })
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let q = self.qualify(path)?;
        let state = self.state.read();
        Ok(state.file(path, &q)?.data.clone())
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError> {
        Ok(Box::new(Cursor::new(self.read(path)?)))
    }
}

impl FsWrite for MemoryFs {
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let q = self.qualify(path)?;
        self.state.write().put(path, file_location(path, &q)?, data.to_vec())?;
        debug!(path, size = data.len(), "memory: wrote object");
        Ok(())
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError> {
        let q = self.qualify(path)?;
        let loc = file_location(path, &q)?.to_owned();
        // Truncate on open, like creating a local file.
        self.state.write().put(path, &loc, Vec::new())?;
        Ok(Box::new(MemoryWriter {
            state: Arc::clone(&self.state),
            path: path.to_owned(),
            loc,
            buf: Vec::new(),
            dirty: false,
        }))
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        let q = self.qualify(path)?;
        let mut state = self.state.write();
        state.file(path, &q)?;
        state.files.remove(location(&q));
        Ok(())
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        let src = self.qualify(from)?;
        let dst = self.qualify(to)?;
        let mut state = self.state.write();
        let data = state.file(from, &src)?.data.clone();
        state.put(to, file_location(to, &dst)?, data)
    }
}

impl FsDir for MemoryFs {
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
        let q = self.qualify(path)?;
        let loc = location(&q);
        let state = self.state.read();
        if state.files.contains_key(loc) {
            return Err(FsError::NotADirectory { path: path.into() });
        }
        if !state.is_dir(loc) {
            return Err(FsError::NotFound { path: path.into() });
        }

        let prefix = format!("{loc}/");
        let mut children: BTreeMap<&str, (FileType, u64)> = BTreeMap::new();
        let files = state
            .files
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, f)| (k.as_str(), f.data.len() as u64));
        let dirs = state
            .dirs
            .range(prefix.clone()..)
            .take_while(|k| k.starts_with(&prefix))
            .map(|k| (k.as_str(), 0));
        for (key, size) in files.chain(dirs) {
            let rest = &key[prefix.len()..];
            match rest.split_once('/') {
                Some((name, _)) => children.insert(name, (FileType::Directory, 0)),
                None if state.files.contains_key(key) => children.insert(rest, (FileType::File, size)),
                None => children.insert(rest, (FileType::Directory, 0)),
            };
        }

        let entries = children
            .into_iter()
            .map(|(name, (file_type, size))| {
                Ok(DirEntry {
                    name: name.to_owned(),
                    path: q.join(name).into_string(),
                    file_type,
                    size,
                })
            })
            .collect();
        Ok(ReadDirIter::from_vec(entries))
    }

    fn create_dir(&self, path: &str) -> Result<(), FsError> {
        let q = self.qualify(path)?;
        self.state.write().make_dirs(path, location(&q))
    }

    fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
        let q = self.qualify(path)?;
        let loc = location(&q);
        let prefix = format!("{loc}/");
        let mut state = self.state.write();
        if state.files.contains_key(loc) {
            return Err(FsError::NotADirectory { path: path.into() });
        }

        let before = state.files.len() + state.dirs.len();
        state.files.retain(|k, _| !k.starts_with(&prefix));
        state.dirs.retain(|k| k != loc && !k.starts_with(&prefix));
        if before == state.files.len() + state.dirs.len() {
            return Err(FsError::NotFound { path: path.into() });
        }
        debug!(path, "memory: removed tree");
        Ok(())
    }
}

/// Buffers writes and commits the whole buffer on flush or drop.
struct MemoryWriter {
    state: Arc<RwLock<State>>,
    path: String,
    loc: String,
    buf: Vec<u8>,
    dirty: bool,
}

impl MemoryWriter {
    fn commit(&mut self) -> Result<(), FsError> {
        if self.dirty {
            self.state
                .write()
                .put(&self.path, &self.loc, self.buf.clone())?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.dirty = true;
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.commit().map_err(std::io::Error::other)
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        if let Err(error) = self.commit() {
            warn!(path = %self.path, %error, "memory: dropped writer failed to commit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let fs = MemoryFs::new();
        fs.write("memory://b/dir/a", b"hello").unwrap();
        assert_eq!(fs.read("memory://b/dir/a").unwrap(), b"hello");
        assert!(fs.metadata("memory://b/dir").unwrap().is_dir());
    }

    #[test]
    fn etag_is_stable_until_write() {
        let fs = MemoryFs::new();
        fs.write("memory://b/a", b"1").unwrap();
        let first = fs.etag("memory://b/a").unwrap();
        assert_eq!(first, fs.etag("memory://b/a").unwrap());
        fs.write("memory://b/a", b"2").unwrap();
        assert_ne!(first, fs.etag("memory://b/a").unwrap());
    }

    #[test]
    fn etag_of_directory_is_not_a_file() {
        let fs = MemoryFs::new();
        fs.write("memory://b/dir/a", b"x").unwrap();
        assert!(matches!(
            fs.etag("memory://b/dir"),
            Err(FsError::NotAFile { .. })
        ));
    }

    #[test]
    fn write_under_a_file_fails() {
        let fs = MemoryFs::new();
        fs.write("memory://b/a", b"x").unwrap();
        assert!(matches!(
            fs.write("memory://b/a/b", b"y"),
            Err(FsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn bucket_root_cannot_be_written() {
        let fs = MemoryFs::new();
        assert!(matches!(
            fs.write("memory://b", b"x"),
            Err(FsError::NotAFile { .. })
        ));
    }

    #[test]
    fn trailing_slash_names_a_directory() {
        let fs = MemoryFs::new();
        fs.write("memory://b/a", b"x").unwrap();

        assert!(matches!(fs.etag("memory://b/a/"), Err(FsError::NotAFile { .. })));
        assert!(matches!(fs.read("memory://b/a/"), Err(FsError::NotAFile { .. })));
        assert!(matches!(fs.remove_file("memory://b/a/"), Err(FsError::NotAFile { .. })));
        assert!(!fs.exists("memory://b/a/").unwrap());
        assert!(fs.metadata("memory://b/a/").unwrap_err().is_not_found());
        assert!(fs.etag("memory://b/missing/").unwrap_err().is_not_found());

        assert!(matches!(
            fs.write("memory://b/new/", b"y"),
            Err(FsError::NotAFile { .. })
        ));
        assert!(matches!(
            fs.copy("memory://b/a", "memory://b/new/"),
            Err(FsError::NotAFile { .. })
        ));
        assert!(fs.open_write("memory://b/new/").is_err());
        assert!(!fs.exists("memory://b/new").unwrap());
        assert_eq!(fs.read("memory://b/a").unwrap(), b"x");
    }

    #[test]
    fn missing_child_of_a_file_is_not_found() {
        let fs = MemoryFs::new();
        fs.write("memory://b/a", b"x").unwrap();
        assert!(fs.etag("memory://b/a/child").unwrap_err().is_not_found());
        assert!(!fs.exists("memory://b/a/child").unwrap());
    }

    #[test]
    fn read_dir_lists_immediate_children() {
        let fs = MemoryFs::new();
        fs.write("memory://b/root/a", b"1").unwrap();
        fs.write("memory://b/root/sub/b", b"22").unwrap();
        fs.create_dir("memory://b/root/empty").unwrap();

        let entries = fs.read_dir("memory://b/root").unwrap().collect_all().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "empty", "sub"]);
        assert_eq!(entries[0].path, "memory://b/root/a");
        assert_eq!(entries[0].size, 1);
        assert_eq!(entries[2].file_type, FileType::Directory);
    }

    #[test]
    fn open_write_commits_on_flush_and_drop() {
        let fs = MemoryFs::new();
        let mut w = fs.open_write("memory://b/stream").unwrap();
        assert_eq!(fs.read("memory://b/stream").unwrap(), b"");
        w.write_all(b"abc").unwrap();
        w.flush().unwrap();
        assert_eq!(fs.read("memory://b/stream").unwrap(), b"abc");
        w.write_all(b"def").unwrap();
        drop(w);
        assert_eq!(fs.read("memory://b/stream").unwrap(), b"abcdef");
    }

    #[test]
    fn remove_dir_all_removes_nested() {
        let fs = MemoryFs::new();
        fs.write("memory://b/t/a", b"1").unwrap();
        fs.write("memory://b/t/x/y", b"2").unwrap();
        fs.remove_dir_all("memory://b/t").unwrap();
        assert!(!fs.exists("memory://b/t").unwrap());
        assert!(!fs.exists("memory://b/t/x/y").unwrap());
        assert!(fs.remove_dir_all("memory://b/t").unwrap_err().is_not_found());
    }

    #[test]
    fn custom_scheme_must_be_bucketed() {
        assert!(MemoryFs::with_scheme(Scheme::FILE).is_err());
        let fs = MemoryFs::with_scheme(Scheme::GCS).unwrap();
        fs.write("gs://b/a", b"x").unwrap();
        assert!(fs.make_qualified("memory://b/a").is_err());
    }
}
