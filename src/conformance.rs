//! # Conformance Battery
//!
//! Backend-agnostic behavioural checks that every [`FileSystem`] must pass.
//! Each check panics with a descriptive message on the first violation, so
//! it can be called directly from a `#[test]`.
//!
//! ```rust
//! use urifs::{MemoryFs, conformance};
//!
//! let fs = MemoryFs::new();
//! conformance::run(&fs, &conformance::Fixture::new("memory://bucket/conformance"));
//! ```
//!
//! Third-party backends can run the same battery against their own
//! implementation. The fixture root must be a qualified directory path that
//! nothing else writes to while the battery runs.

use std::io::{Read, Write};

use crate::{FileSystem, FileType, FsError, FsQualify};

const FILE_CONTENT: &[u8] = b"conformance fixture";
const NESTED_CONTENT: &[u8] = b"nested";

/// Known objects under a qualified root directory.
///
/// ```text
/// <root>/a        file
/// <root>/dir/b    file
/// ```
#[derive(Debug, Clone)]
pub struct Fixture {
    root: String,
}

impl Fixture {
    /// Fixture rooted at `root`, a qualified path without trailing `/`.
    pub fn new(root: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }
        Self { root }
    }

    /// The root directory.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// `<root>/a`, a known-existing file.
    pub fn file(&self) -> String {
        self.path("a")
    }

    /// `<root>/dir`, a known-existing directory.
    pub fn dir(&self) -> String {
        self.path("dir")
    }

    /// `<root>/dir/b`, a file inside [`dir`](Self::dir).
    pub fn nested(&self) -> String {
        self.path("dir/b")
    }

    /// `<root>/missing`, never created.
    pub fn missing(&self) -> String {
        self.path("missing")
    }

    /// `<root>/<rel>`.
    pub fn path(&self, rel: &str) -> String {
        format!("{}/{rel}", self.root)
    }

    /// (Re)create the fixture objects.
    ///
    /// # Errors
    ///
    /// Whatever the backend returns for the writes.
    pub fn install(&self, fs: &dyn FileSystem) -> Result<(), FsError> {
        fs.create_dir(&self.root)?;
        fs.write(&self.file(), FILE_CONTENT)?;
        fs.create_dir(&self.dir())?;
        fs.write(&self.nested(), NESTED_CONTENT)
    }
}

fn install(fs: &dyn FileSystem, fixture: &Fixture) {
    if let Err(e) = fixture.install(fs) {
        panic!("installing fixture under {}: {e}", fixture.root());
    }
}

fn expect_invalid<T: std::fmt::Debug>(result: Result<T, FsError>, what: &str, path: &str) {
    match result {
        Err(FsError::InvalidArgument { .. }) => {}
        other => panic!("{what}({path:?}): expected InvalidArgument, got {other:?}"),
    }
}

fn expect_not_found<T: std::fmt::Debug>(result: Result<T, FsError>, what: &str, path: &str) {
    match result {
        Err(FsError::NotFound { .. }) => {}
        other => panic!("{what}({path:?}): expected NotFound, got {other:?}"),
    }
}

fn expect_not_a_file<T: std::fmt::Debug>(result: Result<T, FsError>, what: &str, path: &str) {
    match result {
        Err(FsError::NotAFile { .. }) => {}
        other => panic!("{what}({path:?}): expected NotAFile, got {other:?}"),
    }
}

fn expect_absent(fs: &dyn FileSystem, path: &str) {
    assert!(
        !fs.exists(path)
            .unwrap_or_else(|e| panic!("exists({path:?}) failed: {e}")),
        "exists({path:?}) must be false"
    );
}

/// Run every check in order.
pub fn run(fs: &dyn FileSystem, fixture: &Fixture) {
    check_qualification_identity(fs, fixture);
    check_qualification_rejects_foreign_input(fs, fixture);
    check_unqualified_operations_fail(fs, fixture);
    check_etag(fs, fixture);
    check_missing_is_not_found(fs, fixture);
    check_path_shapes(fs, fixture);
    check_existence_and_metadata(fs, fixture);
    check_content_round_trip(fs, fixture);
    check_read_dir(fs, fixture);
    check_copy_and_remove(fs, fixture);
    check_create_dir(fs, fixture);
    check_remove_dir_all(fs, fixture);
}

/// Qualified paths come back from `make_qualified` unchanged, and qualifying
/// twice is the same as qualifying once.
pub fn check_qualification_identity(fs: &(impl FsQualify + ?Sized), fixture: &Fixture) {
    for path in [fixture.root().to_owned(), fixture.file(), fixture.nested()] {
        let once = fs
            .make_qualified(&path)
            .unwrap_or_else(|e| panic!("make_qualified({path:?}) failed: {e}"));
        assert_eq!(once, path.as_str(), "make_qualified must be the identity");
        let twice = fs
            .make_qualified(once.as_str())
            .unwrap_or_else(|e| panic!("re-qualifying {path:?} failed: {e}"));
        assert_eq!(once, twice, "make_qualified must be idempotent");
    }

    let name = fs.scheme().name().to_owned();
    assert!(fs.supports_scheme(&name), "backend must support its own scheme {name:?}");
    assert!(
        !fs.supports_scheme(&format!("not-{name}")),
        "supports_scheme must compare whole names"
    );
}

/// Input that does not start with the backend's scheme token is rejected
/// with `InvalidArgument`, including near misses.
pub fn check_qualification_rejects_foreign_input(
    fs: &(impl FsQualify + ?Sized),
    fixture: &Fixture,
) {
    let token = fs.scheme().token().to_owned();
    let file = fixture.file();
    let bare = file.strip_prefix(&token).unwrap_or(&file).to_owned();

    let rejected = [
        String::new(),
        bare.clone(),
        format!("not-{file}"),
        format!("x{file}"),
        format!("prefix/{file}"),
        format!("{}{bare}", token.to_uppercase()),
        format!("other://{bare}"),
        format!("{}{bare}", token.trim_end_matches('/')),
    ];
    for path in &rejected {
        expect_invalid(fs.make_qualified(path), "make_qualified", path);
    }
}

/// Every path-accepting operation qualifies first.
pub fn check_unqualified_operations_fail(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let near_miss = format!("not-{}", fixture.file());
    let p = near_miss.as_str();
    expect_invalid(fs.etag(p), "etag", p);
    expect_invalid(fs.exists(p), "exists", p);
    expect_invalid(fs.metadata(p), "metadata", p);
    expect_invalid(fs.read(p), "read", p);
    expect_invalid(fs.write(p, b"x"), "write", p);
    expect_invalid(fs.open_read(p).map(|_| ()), "open_read", p);
    expect_invalid(fs.open_write(p).map(|_| ()), "open_write", p);
    expect_invalid(fs.remove_file(p), "remove_file", p);
    expect_invalid(fs.copy(&fixture.file(), p), "copy", p);
    expect_invalid(fs.read_dir(p).map(|_| ()), "read_dir", p);
    expect_invalid(fs.create_dir(p), "create_dir", p);
    expect_invalid(fs.remove_dir_all(p), "remove_dir_all", p);
}

/// Fixture files have a non-empty, stable tag that moves on rewrite.
pub fn check_etag(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let file = fixture.file();

    let first = fs
        .etag(&file)
        .unwrap_or_else(|e| panic!("etag({file:?}) failed: {e}"));
    assert!(!first.as_str().is_empty(), "etag must be non-empty");
    let second = fs
        .etag(&file)
        .unwrap_or_else(|e| panic!("second etag({file:?}) failed: {e}"));
    assert_eq!(first, second, "etag must be stable without modification");

    // Different length, so even coarse timestamps produce a new tag.
    let mut changed = FILE_CONTENT.to_vec();
    changed.extend_from_slice(b" (rewritten)");
    fs.write(&file, &changed)
        .unwrap_or_else(|e| panic!("rewriting {file:?} failed: {e}"));
    let third = fs
        .etag(&file)
        .unwrap_or_else(|e| panic!("etag({file:?}) after rewrite failed: {e}"));
    assert_ne!(first, third, "etag must change when content is rewritten");

    match fs.etag(&fixture.dir()) {
        Err(FsError::NotAFile { .. }) => {}
        other => panic!("etag of a directory: expected NotAFile, got {other:?}"),
    }
}

/// Absent objects are `NotFound`, never a generic or transient failure.
pub fn check_missing_is_not_found(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let missing = fixture.missing();
    let m = missing.as_str();
    expect_not_found(fs.etag(m), "etag", m);
    expect_not_found(fs.metadata(m), "metadata", m);
    expect_not_found(fs.read(m), "read", m);
    expect_not_found(fs.open_read(m).map(|_| ()), "open_read", m);
    expect_not_found(fs.remove_file(m), "remove_file", m);
    expect_not_found(fs.read_dir(m).map(|_| ()), "read_dir", m);
    expect_not_found(fs.remove_dir_all(m), "remove_dir_all", m);
    assert!(
        !fs.exists(m).unwrap_or_else(|e| panic!("exists({m:?}) failed: {e}")),
        "exists must be false for a missing path"
    );
}

/// Paths that look plausible but name nothing.
///
/// A child of a file and a `/`-terminated missing path are `NotFound`. A
/// `/`-terminated path to a file names a directory that is not there: file
/// operations on it are `NotAFile` and `exists` is false.
pub fn check_path_shapes(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let beneath_file = format!("{}/child", fixture.file());
    let slashed_missing = format!("{}/", fixture.missing());
    for p in [beneath_file.as_str(), slashed_missing.as_str()] {
        expect_not_found(fs.etag(p), "etag", p);
        expect_not_found(fs.metadata(p), "metadata", p);
        expect_not_found(fs.read(p), "read", p);
        expect_not_found(fs.open_read(p).map(|_| ()), "open_read", p);
        expect_not_found(fs.remove_file(p), "remove_file", p);
        expect_absent(fs, p);
    }

    let slashed_file = format!("{}/", fixture.file());
    let p = slashed_file.as_str();
    expect_not_a_file(fs.etag(p), "etag", p);
    expect_not_a_file(fs.read(p), "read", p);
    expect_not_a_file(fs.open_read(p).map(|_| ()), "open_read", p);
    expect_not_a_file(fs.remove_file(p), "remove_file", p);
    expect_not_a_file(fs.copy(p, &fixture.path("copy")), "copy", p);
    expect_absent(fs, p);

    let slashed_new = fixture.path("new/");
    let p = slashed_new.as_str();
    expect_not_a_file(fs.write(p, b"x"), "write", p);
    expect_not_a_file(fs.open_write(p).map(|_| ()), "open_write", p);
    expect_not_a_file(fs.copy(&fixture.file(), p), "copy", p);
    expect_absent(fs, &fixture.path("new"));

    let slashed_dir = format!("{}/", fixture.dir());
    assert!(
        fs.exists(&slashed_dir)
            .unwrap_or_else(|e| panic!("exists({slashed_dir:?}) failed: {e}")),
        "exists({slashed_dir:?}) must be true"
    );
    assert_eq!(
        fs.read(&fixture.file())
            .unwrap_or_else(|e| panic!("read({:?}) failed: {e}", fixture.file())),
        FILE_CONTENT,
        "{:?} must be untouched",
        fixture.file()
    );
}

/// `exists` and `metadata` agree with each other and with the fixture.
pub fn check_existence_and_metadata(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let file = fixture.file();
    let dir = fixture.dir();

    for path in [&file, &dir, &fixture.nested()] {
        assert!(
            fs.exists(path).unwrap_or_else(|e| panic!("exists({path:?}) failed: {e}")),
            "exists({path:?}) must be true"
        );
    }

    let meta = fs
        .metadata(&file)
        .unwrap_or_else(|e| panic!("metadata({file:?}) failed: {e}"));
    assert!(meta.is_file(), "{file:?} must be a file");
    assert_eq!(meta.size, FILE_CONTENT.len() as u64, "size of {file:?}");
    assert_eq!(meta.path, file, "metadata path must be the qualified input");
    if let Some(tag) = &meta.etag {
        let direct = fs
            .etag(&file)
            .unwrap_or_else(|e| panic!("etag({file:?}) failed: {e}"));
        assert_eq!(*tag, direct, "metadata etag must match etag()");
    }

    let meta = fs
        .metadata(&dir)
        .unwrap_or_else(|e| panic!("metadata({dir:?}) failed: {e}"));
    assert!(meta.is_dir(), "{dir:?} must be a directory");
}

/// Whole-buffer and streaming reads and writes agree.
pub fn check_content_round_trip(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let file = fixture.file();
    assert_eq!(
        fs.read(&file).unwrap_or_else(|e| panic!("read({file:?}) failed: {e}")),
        FILE_CONTENT
    );

    let mut buf = Vec::new();
    fs.open_read(&file)
        .and_then(|mut r| r.read_to_end(&mut buf).map_err(FsError::from))
        .unwrap_or_else(|e| panic!("open_read({file:?}) failed: {e}"));
    assert_eq!(buf, FILE_CONTENT, "open_read must yield the stored bytes");

    let streamed = fixture.path("streamed");
    {
        let mut w = fs
            .open_write(&streamed)
            .unwrap_or_else(|e| panic!("open_write({streamed:?}) failed: {e}"));
        w.write_all(b"part one, ")
            .and_then(|()| w.write_all(b"part two"))
            .and_then(|()| w.flush())
            .unwrap_or_else(|e| panic!("streaming into {streamed:?} failed: {e}"));
    }
    assert_eq!(
        fs.read(&streamed)
            .unwrap_or_else(|e| panic!("read({streamed:?}) failed: {e}")),
        b"part one, part two"
    );
    fs.remove_file(&streamed)
        .unwrap_or_else(|e| panic!("remove_file({streamed:?}) failed: {e}"));
}

/// Listing the root yields exactly the fixture's direct children.
pub fn check_read_dir(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let mut entries = fs
        .read_dir(fixture.root())
        .and_then(|iter| iter.collect_all())
        .unwrap_or_else(|e| panic!("read_dir({:?}) failed: {e}", fixture.root()));
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let seen: Vec<_> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.path.as_str(), e.file_type))
        .collect();
    let (file, dir) = (fixture.file(), fixture.dir());
    assert_eq!(
        seen,
        [
            ("a", file.as_str(), FileType::File),
            ("dir", dir.as_str(), FileType::Directory),
        ],
        "read_dir must list direct children with qualified paths"
    );

    match fs.read_dir(&file) {
        Err(FsError::NotADirectory { .. }) => {}
        other => panic!("read_dir of a file: expected NotADirectory, got {:?}", other.map(|_| ())),
    }
}

/// Copy duplicates content; removing a file makes it absent.
pub fn check_copy_and_remove(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let (file, copy) = (fixture.file(), fixture.path("copy"));
    fs.copy(&file, &copy)
        .unwrap_or_else(|e| panic!("copy({file:?}, {copy:?}) failed: {e}"));
    assert_eq!(
        fs.read(&copy).unwrap_or_else(|e| panic!("read({copy:?}) failed: {e}")),
        FILE_CONTENT
    );
    expect_not_found(fs.copy(&fixture.missing(), &copy), "copy", &fixture.missing());

    fs.remove_file(&copy)
        .unwrap_or_else(|e| panic!("remove_file({copy:?}) failed: {e}"));
    assert!(
        !fs.exists(&copy).unwrap_or_else(|e| panic!("exists({copy:?}) failed: {e}")),
        "removed file must not exist"
    );
    expect_not_found(fs.etag(&copy), "etag", &copy);
}

/// `create_dir` is idempotent and makes the path writable beneath.
pub fn check_create_dir(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let dir = fixture.path("created/deeper");
    fs.create_dir(&dir)
        .unwrap_or_else(|e| panic!("create_dir({dir:?}) failed: {e}"));
    fs.create_dir(&dir)
        .unwrap_or_else(|e| panic!("repeated create_dir({dir:?}) failed: {e}"));
    fs.create_dir(&fixture.dir())
        .unwrap_or_else(|e| panic!("create_dir on an existing directory failed: {e}"));

    let inner = format!("{dir}/f");
    fs.write(&inner, b"x")
        .unwrap_or_else(|e| panic!("write({inner:?}) failed: {e}"));
    assert!(
        fs.metadata(&dir)
            .unwrap_or_else(|e| panic!("metadata({dir:?}) failed: {e}"))
            .is_dir(),
        "{dir:?} must be a directory"
    );
    fs.remove_dir_all(&fixture.path("created"))
        .unwrap_or_else(|e| panic!("cleaning up {dir:?} failed: {e}"));
}

/// Removing a tree removes everything under it and nothing beside it.
pub fn check_remove_dir_all(fs: &dyn FileSystem, fixture: &Fixture) {
    install(fs, fixture);
    let (dir, nested) = (fixture.dir(), fixture.nested());
    fs.remove_dir_all(&dir)
        .unwrap_or_else(|e| panic!("remove_dir_all({dir:?}) failed: {e}"));
    for path in [&dir, &nested] {
        assert!(
            !fs.exists(path).unwrap_or_else(|e| panic!("exists({path:?}) failed: {e}")),
            "{path:?} must be gone after remove_dir_all"
        );
    }
    assert!(
        fs.exists(&fixture.file())
            .unwrap_or_else(|e| panic!("exists({:?}) failed: {e}", fixture.file())),
        "siblings must survive remove_dir_all"
    );

    match fs.remove_dir_all(&fixture.file()) {
        Err(FsError::NotADirectory { .. }) => {}
        other => panic!("remove_dir_all of a file: expected NotADirectory, got {other:?}"),
    }
    install(fs, fixture);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryFs;

    #[test]
    fn fixture_paths() {
        let f = Fixture::new("memory://b/root/");
        assert_eq!(f.root(), "memory://b/root");
        assert_eq!(f.file(), "memory://b/root/a");
        assert_eq!(f.nested(), "memory://b/root/dir/b");
        assert_eq!(f.missing(), "memory://b/root/missing");
    }

    #[test]
    fn memory_backend_passes() {
        run(&MemoryFs::new(), &Fixture::new("memory://b/root"));
    }

    #[test]
    #[should_panic(expected = "expected NotAFile")]
    fn a_backend_ignoring_trailing_slashes_is_caught() {
        use crate::{ETag, FsDir, FsRead, FsWrite, Metadata, ReadDirIter, Scheme};

        struct Trimming(MemoryFs);

        impl FsQualify for Trimming {
            fn scheme(&self) -> &Scheme {
                self.0.scheme()
            }
        }

        impl FsRead for Trimming {
            fn etag(&self, path: &str) -> Result<ETag, FsError> {
                self.0.etag(path.trim_end_matches('/'))
            }

            fn exists(&self, path: &str) -> Result<bool, FsError> {
                self.0.exists(path)
            }

            fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
                self.0.metadata(path)
            }

            fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
                self.0.read(path)
            }

            fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError> {
                self.0.open_read(path)
            }
        }

        impl FsWrite for Trimming {
            fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
                self.0.write(path, data)
            }

            fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError> {
                self.0.open_write(path)
            }

            fn remove_file(&self, path: &str) -> Result<(), FsError> {
                self.0.remove_file(path)
            }

            fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
                self.0.copy(from, to)
            }
        }

        impl FsDir for Trimming {
            fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
                self.0.read_dir(path)
            }

            fn create_dir(&self, path: &str) -> Result<(), FsError> {
                self.0.create_dir(path)
            }

            fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
                self.0.remove_dir_all(path)
            }
        }

        check_path_shapes(&Trimming(MemoryFs::new()), &Fixture::new("memory://b/root"));
    }

    #[test]
    #[should_panic(expected = "expected InvalidArgument")]
    fn a_permissive_qualifier_is_caught() {
        struct Permissive(MemoryFs);

        impl FsQualify for Permissive {
            fn scheme(&self) -> &crate::Scheme {
                self.0.scheme()
            }

            fn make_qualified(&self, path: &str) -> Result<crate::QualifiedPath, FsError> {
                // Accepts anything containing the token, not just a prefix.
                let at = path.find("memory://").unwrap_or(0);
                self.0.make_qualified(&path[at..])
            }
        }

        check_qualification_rejects_foreign_input(
            &Permissive(MemoryFs::new()),
            &Fixture::new("memory://b/root"),
        );
    }
}
