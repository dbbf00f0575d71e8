use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Reasons a request path does not map onto a readable file under the root.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("file not found")]
    NotFound,

    /// The request tried to leave the root directory.
    #[error("path escapes the root directory")]
    Escape,

    #[error("{0}")]
    Io(#[from] io::Error),
}

impl ResolveError {
    /// Escapes are reported to clients exactly like missing files.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound | ResolveError::Escape)
    }
}

/// Maps request paths onto files confined to a root directory.
#[derive(Clone, Debug)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    /// Create a resolver for `root`. The root is canonicalised once, so it
    /// must exist.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `request_path` to an absolute path inside the root and stat it.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, ResolveError> {
        let candidate = self.contain(request_path)?;
        match fs::metadata(&candidate) {
            Ok(_) => Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ResolveError::NotFound),
            Err(err) => Err(ResolveError::Io(err)),
        }
    }

    /// Join `request_path` onto the root without touching the filesystem,
    /// rejecting results that are not lexically inside the root.
    pub fn contain(&self, request_path: &str) -> Result<PathBuf, ResolveError> {
        let relative = clean_request_path(request_path);
        let candidate = normalize_path(self.root.join(relative));
        if candidate.starts_with(&self.root) {
            Ok(candidate)
        } else {
            Err(ResolveError::Escape)
        }
    }
}

/// Collapse `.` and `name/..` segments of a URL path, accepting both `/` and
/// `\` as separators. Leading `..` segments that cannot be collapsed are kept
/// so the containment check can see them.
pub fn clean_request_path(request_path: &str) -> PathBuf {
    let mut segments: Vec<&str> = Vec::new();
    for segment in request_path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }
    segments.iter().collect()
}

/// Canonicalise `.` and `..` path segments without touching the filesystem.
fn normalize_path(path: PathBuf) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cleans_request_segments() {
        assert_eq!(clean_request_path("/docs/./a.md"), PathBuf::from("docs/a.md"));
        assert_eq!(clean_request_path("/docs/x/../a.md"), PathBuf::from("docs/a.md"));
        assert_eq!(clean_request_path("docs\\a.md"), PathBuf::from("docs/a.md"));
        assert_eq!(
            clean_request_path("/../../etc/passwd"),
            PathBuf::from("../../etc/passwd")
        );
        assert_eq!(clean_request_path("/"), PathBuf::new());
    }

    #[test]
    fn rejects_traversal_outside_root() {
        let dir = tempdir().unwrap();
        let resolver = FileResolver::new(dir.path()).unwrap();

        for attempt in [
            "../../etc/passwd",
            "/../../etc/passwd",
            "/docs/../../secret.md",
            "..\\..\\windows\\win.ini",
        ] {
            let err = resolver.contain(attempt).unwrap_err();
            assert!(matches!(err, ResolveError::Escape), "{attempt}");
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn allows_parent_segments_that_stay_inside_root() {
        let dir = tempdir().unwrap();
        let resolver = FileResolver::new(dir.path()).unwrap();
        let root_name = resolver
            .root()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap()
            .to_owned();

        let path = resolver
            .contain(&format!("../{root_name}/notes.md"))
            .unwrap();
        assert_eq!(path, resolver.root().join("notes.md"));
    }

    #[test]
    fn classifies_missing_and_present_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), "# hi\n").unwrap();
        let resolver = FileResolver::new(dir.path()).unwrap();

        let found = resolver.resolve("/readme.md").unwrap();
        assert_eq!(found, resolver.root().join("readme.md"));
        assert!(found.is_absolute());

        let err = resolver.resolve("/missing.md").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound));
    }

    #[cfg(unix)]
    #[test]
    fn stat_failures_other_than_missing_are_io_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), "# hi\n").unwrap();
        let resolver = FileResolver::new(dir.path()).unwrap();

        // A regular file used as a directory fails with ENOTDIR.
        let err = resolver.resolve("/readme.md/child").unwrap_err();
        assert!(matches!(err, ResolveError::Io(_)), "{err:?}");
        assert!(!err.is_not_found());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(FileResolver::new(dir.path().join("absent")).is_err());
    }
}
