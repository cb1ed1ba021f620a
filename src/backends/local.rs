//! Local disk backend, addressed as `file:///<absolute path>`.

use std::fs;
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::debug;

use crate::{
    DirEntry, ETag, FileType, FsDir, FsError, FsQualify, FsRead, FsWrite, Metadata,
    QualifiedPath, ReadDirIter, Scheme,
};

/// Filesystem backed by the local disk through `std::fs`.
///
/// The [`ETag`] of a file is derived from its inode (on Unix), modification
/// time in nanoseconds and length. It changes whenever the file is rewritten
/// or replaced.
///
/// ```rust
/// use urifs::{FsQualify, LocalFs};
///
/// let fs = LocalFs::new();
/// assert_eq!(fs.make_qualified("file:///tmp/a").unwrap(), "file:///tmp/a");
/// assert!(fs.make_qualified("/tmp/a").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct LocalFs {
    scheme: Scheme,
}

impl LocalFs {
    /// Create a local backend under [`Scheme::FILE`].
    pub fn new() -> Self {
        Self {
            scheme: Scheme::FILE,
        }
    }

    /// Qualify `path` and map it onto the local filesystem.
    fn resolve(&self, path: &str) -> Result<(QualifiedPath, PathBuf), FsError> {
        let q = self.make_qualified(path)?;
        let local = PathBuf::from(q.location());
        Ok((q, local))
    }

    /// Resolve a path that must name a file. A `/`-terminated path names a
    /// directory: `NotAFile` if anything is there, otherwise `NotFound`.
    fn resolve_file(&self, path: &str, operation: &'static str) -> Result<PathBuf, FsError> {
        let (q, local) = self.resolve(path)?;
        if q.as_str().ends_with('/') {
            fs::metadata(bare(&local)).map_err(|e| lookup_error(e, path, operation))?;
            return Err(FsError::NotAFile { path: path.into() });
        }
        Ok(local)
    }

    /// Resolve a path a file is written to.
    fn resolve_target(&self, path: &str) -> Result<PathBuf, FsError> {
        let (q, local) = self.resolve(path)?;
        if q.as_str().ends_with('/') {
            return Err(FsError::NotAFile { path: path.into() });
        }
        Ok(local)
    }

    /// Qualified form of a local path, for entries discovered while listing.
    pub fn qualify_local(&self, local: &Path) -> Result<QualifiedPath, FsError> {
        let display = local.to_str().ok_or_else(|| FsError::InvalidArgument {
            path: local.display().to_string(),
            reason: "path is not valid UTF-8".into(),
        })?;
        self.make_qualified(&format!("{}{}", self.scheme.token(), display))
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new()
    }
}

fn create_parent(path: &str, local: &Path) -> Result<(), FsError> {
    if let Some(parent) = local.parent() {
        fs::create_dir_all(parent).map_err(|e| FsError::from_io(e, path, "create_dir"))?;
    }
    Ok(())
}

/// `local` without a trailing separator.
fn bare(local: &Path) -> PathBuf {
    local.components().collect()
}

/// A lookup beneath a regular file fails with ENOTDIR; the path is simply absent.
fn lookup_error(error: io::Error, path: &str, operation: &'static str) -> FsError {
    if error.kind() == ErrorKind::NotADirectory {
        return FsError::NotFound { path: path.into() };
    }
    FsError::from_io(error, path, operation)
}

/// ENOTDIR on a directory operation: `local` itself is a file, or it lies
/// beneath one and does not exist.
fn directory_error(error: io::Error, path: &str, local: &Path, operation: &'static str) -> FsError {
    if error.kind() == ErrorKind::NotADirectory && !bare(local).is_file() {
        return FsError::NotFound { path: path.into() };
    }
    FsError::from_io(error, path, operation)
}

fn local_etag(meta: &fs::Metadata) -> Option<ETag> {
    let modified = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());

    #[cfg(unix)]
    let inode = std::os::unix::fs::MetadataExt::ino(meta);
    #[cfg(not(unix))]
    let inode = 0u64;

    ETag::new(format!("{inode:x}-{modified:x}-{:x}", meta.len()))
}

impl FsQualify for LocalFs {
    fn scheme(&self) -> &Scheme {
        &self.scheme
    }
}

impl FsRead for LocalFs {
    fn etag(&self, path: &str) -> Result<ETag, FsError> {
        let local = self.resolve_file(path, "etag")?;
        let meta = fs::metadata(&local).map_err(|e| lookup_error(e, path, "etag"))?;
        if meta.is_dir() {
            return Err(FsError::NotAFile { path: path.into() });
        }
        debug!(path, "local: stat for etag");
        local_etag(&meta).ok_or_else(|| FsError::Backend(format!("no version token for {path}")))
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        let (_, local) = self.resolve(path)?;
        match local.try_exists() {
            Err(e) if e.kind() == ErrorKind::NotADirectory => Ok(false),
            other => other.map_err(|e| FsError::from_io(e, path, "exists")),
        }
    }

    fn metadata(&self, path: &str) -> Result<Metadata, FsError> {
        let (q, local) = self.resolve(path)?;
        let meta = fs::metadata(&local).map_err(|e| lookup_error(e, path, "metadata"))?;
        if meta.is_dir() {
            return Ok(Metadata {
                modified: meta.modified().ok(),
                ..Metadata::directory(q.into_string())
            });
        }
        Ok(Metadata {
            path: q.into_string(),
            file_type: FileType::File,
            size: meta.len(),
            modified: meta.modified().ok(),
            etag: local_etag(&meta),
        })
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let local = self.resolve_file(path, "read")?;
        fs::read(&local).map_err(|e| lookup_error(e, path, "read"))
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError> {
        let local = self.resolve_file(path, "open_read")?;
        let file = fs::File::open(&local).map_err(|e| lookup_error(e, path, "open_read"))?;
        let meta = file
            .metadata()
            .map_err(|e| FsError::from_io(e, path, "open_read"))?;
        if meta.is_dir() {
            return Err(FsError::NotAFile { path: path.into() });
        }
        Ok(Box::new(file))
    }
}

impl FsWrite for LocalFs {
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let local = self.resolve_target(path)?;
        create_parent(path, &local)?;
        fs::write(&local, data).map_err(|e| FsError::from_io(e, path, "write"))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError> {
        let local = self.resolve_target(path)?;
        create_parent(path, &local)?;
        let file = fs::File::create(&local).map_err(|e| FsError::from_io(e, path, "open_write"))?;
        Ok(Box::new(file))
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        let local = self.resolve_file(path, "remove_file")?;
        let meta = fs::metadata(&local).map_err(|e| lookup_error(e, path, "remove_file"))?;
        if meta.is_dir() {
            return Err(FsError::NotAFile { path: path.into() });
        }
        fs::remove_file(&local).map_err(|e| FsError::from_io(e, path, "remove_file"))
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.make_qualified(to)?;
        let src = self.resolve_file(from, "copy")?;
        let meta = fs::metadata(&src).map_err(|e| lookup_error(e, from, "copy"))?;
        if meta.is_dir() {
            return Err(FsError::NotAFile { path: from.into() });
        }
        let dst = self.resolve_target(to)?;
        create_parent(to, &dst)?;
        fs::copy(&src, &dst).map_err(|e| FsError::from_io(e, from, "copy"))?;
        Ok(())
    }
}

impl FsDir for LocalFs {
    fn read_dir(&self, path: &str) -> Result<ReadDirIter, FsError> {
        let (q, local) = self.resolve(path)?;
        let entries =
            fs::read_dir(&local).map_err(|e| directory_error(e, path, &local, "read_dir"))?;
        let iter = entries.map(move |entry| -> Result<DirEntry, FsError> {
            let entry = entry.map_err(|e| FsError::from_io(e, q.as_str(), "read_dir"))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let child = q.join(&name);
            let meta = entry
                .metadata()
                .map_err(|e| FsError::from_io(e, child.as_str(), "read_dir"))?;
            Ok(DirEntry {
                name,
                file_type: if meta.is_dir() {
                    FileType::Directory
                } else {
                    FileType::File
                },
                size: if meta.is_dir() { 0 } else { meta.len() },
                path: child.into_string(),
            })
        });
        Ok(ReadDirIter::new(iter))
    }

    fn create_dir(&self, path: &str) -> Result<(), FsError> {
        let (_, local) = self.resolve(path)?;
        fs::create_dir_all(&local).map_err(|e| FsError::from_io(e, path, "create_dir"))
    }

    fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
        let (_, local) = self.resolve(path)?;
        let meta = fs::symlink_metadata(&local)
            .map_err(|e| directory_error(e, path, &local, "remove_dir_all"))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory { path: path.into() });
        }
        fs::remove_dir_all(&local).map_err(|e| FsError::from_io(e, path, "remove_dir_all"))?;
        debug!(path, "local: removed tree");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> (tempfile::TempDir, LocalFs, String) {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new();
        let root = fs.qualify_local(dir.path()).unwrap().into_string();
        (dir, fs, root)
    }

    #[test]
    fn qualify_local_prefixes_scheme() {
        let fs = LocalFs::new();
        let q = fs.qualify_local(Path::new("/tmp/x")).unwrap();
        assert_eq!(q, "file:///tmp/x");
    }

    #[test]
    fn write_creates_parents() {
        let (_dir, fs, root) = scratch();
        let path = format!("{root}/a/b/c");
        fs.write(&path, b"data").unwrap();
        assert_eq!(fs.read(&path).unwrap(), b"data");
        assert!(fs.metadata(&format!("{root}/a/b")).unwrap().is_dir());
    }

    #[test]
    fn etag_changes_when_content_changes() {
        let (_dir, fs, root) = scratch();
        let path = format!("{root}/a");
        fs.write(&path, b"one").unwrap();
        let first = fs.etag(&path).unwrap();
        assert_eq!(first, fs.etag(&path).unwrap());
        fs.write(&path, b"three").unwrap();
        assert_ne!(first, fs.etag(&path).unwrap());
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_dir, fs, root) = scratch();
        assert!(fs.etag(&format!("{root}/nope")).unwrap_err().is_not_found());
        assert!(!fs.exists(&format!("{root}/nope")).unwrap());
    }

    #[test]
    fn missing_child_of_a_file_is_not_found() {
        let (_dir, fs, root) = scratch();
        fs.write(&format!("{root}/a"), b"x").unwrap();
        let child = format!("{root}/a/child");

        assert!(fs.etag(&child).unwrap_err().is_not_found());
        assert!(fs.metadata(&child).unwrap_err().is_not_found());
        assert!(fs.read(&child).unwrap_err().is_not_found());
        assert!(fs.remove_file(&child).unwrap_err().is_not_found());
        assert!(fs.read_dir(&child).unwrap_err().is_not_found());
        assert!(!fs.exists(&child).unwrap());
    }

    #[test]
    fn trailing_slash_names_a_directory() {
        let (_dir, fs, root) = scratch();
        fs.write(&format!("{root}/a"), b"x").unwrap();
        fs.create_dir(&format!("{root}/d")).unwrap();

        let file_as_dir = format!("{root}/a/");
        assert!(matches!(fs.etag(&file_as_dir), Err(FsError::NotAFile { .. })));
        assert!(matches!(fs.read(&file_as_dir), Err(FsError::NotAFile { .. })));
        assert!(matches!(
            fs.remove_file(&file_as_dir),
            Err(FsError::NotAFile { .. })
        ));
        assert!(!fs.exists(&file_as_dir).unwrap());
        assert!(matches!(fs.etag(&format!("{root}/d/")), Err(FsError::NotAFile { .. })));
        assert!(fs.etag(&format!("{root}/missing/")).unwrap_err().is_not_found());

        assert!(matches!(
            fs.write(&format!("{root}/new/"), b"y"),
            Err(FsError::NotAFile { .. })
        ));
        assert!(!fs.exists(&format!("{root}/new")).unwrap());
    }

    #[test]
    fn failed_copy_leaves_no_directories() {
        let (_dir, fs, root) = scratch();
        let dst = format!("{root}/out/deep/copy");
        assert!(fs.copy(&format!("{root}/missing"), &dst).unwrap_err().is_not_found());
        assert!(!fs.exists(&format!("{root}/out")).unwrap());
    }

    #[test]
    fn read_dir_reports_types() {
        let (_dir, fs, root) = scratch();
        fs.write(&format!("{root}/f"), b"12").unwrap();
        fs.create_dir(&format!("{root}/d")).unwrap();

        let mut entries = fs.read_dir(&root).unwrap().collect_all().unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "d");
        assert_eq!(entries[0].file_type, FileType::Directory);
        assert_eq!(entries[1].path, format!("{root}/f"));
        assert_eq!(entries[1].size, 2);
    }

    #[test]
    fn remove_dir_all_on_file_is_not_a_directory() {
        let (_dir, fs, root) = scratch();
        let path = format!("{root}/f");
        fs.write(&path, b"x").unwrap();
        assert!(matches!(
            fs.remove_dir_all(&path),
            Err(FsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn open_write_streams_to_disk() {
        let (_dir, fs, root) = scratch();
        let path = format!("{root}/s/stream");
        let mut w = fs.open_write(&path).unwrap();
        w.write_all(b"abc").unwrap();
        w.flush().unwrap();
        drop(w);
        let mut text = String::new();
        fs.open_read(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "abc");
    }
}
