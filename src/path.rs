//! # Path Qualification
//!
//! Scheme-prefixed paths and the rules that decide whether a string is
//! addressed to a particular backend.
//!
//! ## Responsibility
//! - Anchored, case-sensitive prefix matching against a backend's scheme token
//! - Splitting qualified paths into bucket and key components
//! - Classifying rejected input for diagnostics
//!
//! ## Format
//!
//! ```text
//! Bucketed:  <name>://<bucket>[/<key>]     gs://my-bucket/data/a
//! Rooted:    <name>://<absolute path>      file:///tmp/data/a
//! ```
//!
//! Qualification is pure: it never performs I/O and never rewrites its input.
//! A string that qualifies is returned byte-for-byte unchanged.
//!
//! ```rust
//! use urifs::{FsError, Scheme};
//!
//! let qualified = Scheme::GCS.qualify("gs://bucket/path").unwrap();
//! assert_eq!(qualified, "gs://bucket/path");
//! assert_eq!(qualified.bucket(), "bucket");
//! assert_eq!(qualified.key(), "path");
//!
//! let err = Scheme::GCS.qualify("not-gs://bucket/path").unwrap_err();
//! assert!(matches!(err, FsError::InvalidArgument { .. }));
//! ```

use std::borrow::Cow;
use std::fmt;

use crate::FsError;

/// Separator between a scheme name and the rest of the path.
const SCHEME_SEPARATOR: &str = "://";

/// How the remainder of a path after the scheme token is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Addressing {
    /// `<bucket>[/<key>]` with a non-empty bucket (object stores).
    Bucketed,
    /// An absolute path starting with `/` (local disk).
    Rooted,
}

/// A backend's scheme token (e.g. `"gs://"`) together with its addressing rules.
///
/// Matching is anchored at position 0 and case-sensitive: `"GS://b/k"` and
/// `"not-gs://b/k"` do not qualify for [`Scheme::GCS`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scheme {
    token: Cow<'static, str>,
    addressing: Addressing,
}

impl Scheme {
    /// Google Cloud Storage, `gs://<bucket>/<key>`.
    pub const GCS: Scheme = Scheme::builtin("gs://", Addressing::Bucketed);
    /// Amazon S3 and compatible stores, `s3://<bucket>/<key>`.
    pub const S3: Scheme = Scheme::builtin("s3://", Addressing::Bucketed);
    /// Local disk, `file:///<absolute path>`.
    pub const FILE: Scheme = Scheme::builtin("file://", Addressing::Rooted);
    /// Default scheme of the in-memory backend, `memory://<bucket>/<key>`.
    pub const MEMORY: Scheme = Scheme::builtin("memory://", Addressing::Bucketed);

    const fn builtin(token: &'static str, addressing: Addressing) -> Self {
        Self {
            token: Cow::Borrowed(token),
            addressing,
        }
    }

    /// Create a custom scheme from a token such as `"az://"`.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the token does not end in `://` or its
    ///   name part is empty or contains characters other than ASCII
    ///   alphanumerics, `+`, `-` and `.`
    pub fn new(token: impl Into<String>, addressing: Addressing) -> Result<Self, FsError> {
        let token = token.into();
        let valid = token
            .strip_suffix(SCHEME_SEPARATOR)
            .is_some_and(is_valid_scheme_name);
        if !valid {
            return Err(FsError::InvalidArgument {
                path: token,
                reason: "scheme token must look like '<name>://'".into(),
            });
        }
        Ok(Self {
            token: Cow::Owned(token),
            addressing,
        })
    }

    /// The full prefix, e.g. `"gs://"`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The scheme name without the separator, e.g. `"gs"`.
    pub fn name(&self) -> &str {
        &self.token[..self.token.len() - SCHEME_SEPARATOR.len()]
    }

    /// Addressing rules for paths under this scheme.
    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// Qualify `path`, keeping the reason for rejection.
    pub fn classify(&self, path: &str) -> Result<QualifiedPath, Unqualified> {
        let Some(rest) = path.strip_prefix(self.token()) else {
            return Err(match foreign_scheme(path) {
                Some(name) => Unqualified::ForeignScheme(name.to_owned()),
                None => Unqualified::NoScheme,
            });
        };

        if path.contains('\0') {
            return Err(Unqualified::Malformed("path contains a NUL byte"));
        }

        let scheme_len = self.token.len();
        let bucket_end = match self.addressing {
            Addressing::Bucketed => {
                let bucket = rest.split('/').next().unwrap_or_default();
                if bucket.is_empty() {
                    return Err(Unqualified::Malformed("missing bucket"));
                }
                scheme_len + bucket.len()
            }
            Addressing::Rooted => {
                if !rest.starts_with('/') {
                    return Err(Unqualified::Malformed(
                        "expected an absolute path after the scheme",
                    ));
                }
                scheme_len
            }
        };

        Ok(QualifiedPath {
            raw: path.to_owned(),
            scheme_len,
            bucket_end,
        })
    }

    /// Qualify `path` for this scheme.
    ///
    /// Returns the input unchanged when it already carries this scheme.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] for a missing or foreign scheme, or a
    ///   malformed remainder
    pub fn qualify(&self, path: &str) -> Result<QualifiedPath, FsError> {
        self.classify(path).map_err(|why| why.into_error(path, self))
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Why a string did not qualify for a scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unqualified {
    /// No `<name>://` prefix at all; a backend-relative path.
    NoScheme,
    /// A well-formed prefix naming another scheme.
    ForeignScheme(String),
    /// Right scheme, but the remainder breaks the addressing rules.
    Malformed(&'static str),
}

impl Unqualified {
    /// Convert into the [`FsError::InvalidArgument`] reported to callers.
    pub fn into_error(self, path: &str, expected: &Scheme) -> FsError {
        let reason = match self {
            Unqualified::NoScheme => format!("no scheme, expected '{expected}'"),
            Unqualified::ForeignScheme(name) => {
                format!("foreign scheme '{name}', expected '{expected}'")
            }
            Unqualified::Malformed(why) => why.to_owned(),
        };
        FsError::InvalidArgument {
            path: path.to_owned(),
            reason,
        }
    }
}

/// A path carrying its backend's scheme prefix.
///
/// Produced only by [`Scheme::qualify`] (or [`join`](Self::join) on an
/// existing qualified path), so holding one proves qualification succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedPath {
    raw: String,
    scheme_len: usize,
    bucket_end: usize,
}

impl QualifiedPath {
    /// The full path string, identical to what was qualified.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Consume into the underlying string.
    pub fn into_string(self) -> String {
        self.raw
    }

    /// The scheme token, e.g. `"gs://"`.
    pub fn scheme(&self) -> &str {
        &self.raw[..self.scheme_len]
    }

    /// Bucket or container; empty for rooted schemes.
    pub fn bucket(&self) -> &str {
        &self.raw[self.scheme_len..self.bucket_end]
    }

    /// Everything after the bucket and its separating `/`.
    ///
    /// For rooted paths this is the absolute path without its leading `/`.
    pub fn key(&self) -> &str {
        self.raw.get(self.bucket_end + 1..).unwrap_or_default()
    }

    /// Everything after the scheme token.
    pub fn location(&self) -> &str {
        &self.raw[self.scheme_len..]
    }

    /// Final key segment, ignoring a trailing `/`.
    pub fn name(&self) -> &str {
        let key = self.key().trim_end_matches('/');
        key.rsplit('/').next().unwrap_or_default()
    }

    /// Append a relative child to this path.
    pub fn join(&self, child: &str) -> QualifiedPath {
        let child = child.trim_start_matches('/');
        let mut raw = self.raw.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        raw.push_str(child);
        QualifiedPath {
            raw,
            scheme_len: self.scheme_len,
            bucket_end: self.bucket_end,
        }
    }
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for QualifiedPath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl PartialEq<str> for QualifiedPath {
    fn eq(&self, other: &str) -> bool {
        self.raw == other
    }
}

impl PartialEq<&str> for QualifiedPath {
    fn eq(&self, other: &&str) -> bool {
        self.raw == *other
    }
}

impl PartialEq<String> for QualifiedPath {
    fn eq(&self, other: &String) -> bool {
        &self.raw == other
    }
}

impl From<QualifiedPath> for String {
    fn from(path: QualifiedPath) -> Self {
        path.raw
    }
}

fn is_valid_scheme_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

/// The scheme name of `path` when it starts with a well-formed `<name>://`.
fn foreign_scheme(path: &str) -> Option<&str> {
    let end = path.find(SCHEME_SEPARATOR)?;
    let name = &path[..end];
    is_valid_scheme_name(name).then_some(name)
}
