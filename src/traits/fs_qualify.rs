//! Path qualification for a backend.

use crate::{FsError, QualifiedPath, Scheme};

/// Binds a backend to its scheme and qualifies paths against it.
///
/// Qualification is a pure, local check. It never performs I/O and never
/// blocks, so it is safe to call before any other operation.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsQualify`.
pub trait FsQualify: Send + Sync {
    /// The scheme this backend answers to.
    fn scheme(&self) -> &Scheme;

    /// Qualify `path` for this backend.
    ///
    /// A path that already carries this backend's scheme is returned
    /// unchanged, so `make_qualified(p) == p` for any qualified `p`. The
    /// operation never guesses or rewrites a scheme.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the scheme is missing or foreign,
    ///   or the rest of the path is malformed
    fn make_qualified(&self, path: &str) -> Result<QualifiedPath, FsError> {
        self.scheme().qualify(path)
    }

    /// Whether this backend serves the scheme `name` (e.g. `"gs"`).
    fn supports_scheme(&self, name: &str) -> bool {
        self.scheme().name() == name
    }
}
