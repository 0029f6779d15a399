//! Confinement of caller-supplied paths to a configured root.
//!
//! Paths are checked lexically first (no `..` segments at all), then joined
//! onto the root, canonicalized and required to still sit under the
//! canonical root, which also catches symlinks pointing outside it.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Invalid path '{0}': parent directory segments are not allowed")]
    Traversal(String),

    #[error("Invalid path '{0}': outside the permitted root")]
    OutsideRoot(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Cannot resolve '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reject traversal and strip leading `/` and `.` segments.
///
/// Performs no filesystem access.
pub fn sanitize_relative(user_path: &str) -> Result<PathBuf, PathError> {
    let mut relative = PathBuf::new();
    for component in Path::new(user_path).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(PathError::Traversal(user_path.to_string()));
            }
        }
    }
    Ok(relative)
}

/// Resolve `user_path` under `root`, returning the canonical path.
///
/// Leading slashes are treated as relative to `root`.
pub fn resolve_within(root: &Path, user_path: &str) -> Result<PathBuf, PathError> {
    let relative = sanitize_relative(user_path)?;
    let canonical_root = canonicalize(root, &root.display().to_string())?;
    let resolved = canonicalize(&canonical_root.join(relative), user_path)?;

    if resolved.starts_with(&canonical_root) {
        Ok(resolved)
    } else {
        Err(PathError::OutsideRoot(user_path.to_string()))
    }
}

/// Require an already-resolved path to sit under `subroot`.
pub fn ensure_under(resolved: &Path, subroot: &Path, user_path: &str) -> Result<(), PathError> {
    let canonical_subroot = match subroot.canonicalize() {
        Ok(p) => p,
        // a missing subroot cannot contain anything
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PathError::OutsideRoot(user_path.to_string()))
        }
        Err(e) => {
            return Err(PathError::Io {
                path: subroot.display().to_string(),
                source: e,
            })
        }
    };

    if resolved.starts_with(&canonical_subroot) {
        Ok(())
    } else {
        Err(PathError::OutsideRoot(user_path.to_string()))
    }
}

fn canonicalize(path: &Path, label: &str) -> Result<PathBuf, PathError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PathError::NotFound(label.to_string())
        } else {
            PathError::Io {
                path: label.to_string(),
                source: e,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_strips_root_and_cur_dir() {
        assert_eq!(
            sanitize_relative("/uploads/./a.pdf").unwrap(),
            PathBuf::from("uploads/a.pdf")
        );
        assert_eq!(sanitize_relative("").unwrap(), PathBuf::new());
    }

    #[test]
    fn test_sanitize_rejects_parent_segments() {
        for bad in ["../etc/passwd", "uploads/../../x", "a/..", "/.."] {
            assert!(
                matches!(sanitize_relative(bad), Err(PathError::Traversal(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_resolve_within_root() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("uploads")).unwrap();
        std::fs::write(root.path().join("uploads/a.pdf"), b"x").unwrap();

        let resolved = resolve_within(root.path(), "/uploads/a.pdf").unwrap();
        assert_eq!(
            resolved,
            root.path().canonicalize().unwrap().join("uploads/a.pdf")
        );
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            resolve_within(root.path(), "missing.pdf"),
            Err(PathError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.pdf"), b"x").unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("link")).unwrap();

        assert!(matches!(
            resolve_within(root.path(), "link/secret.pdf"),
            Err(PathError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_ensure_under_subroot() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("uploads/batch")).unwrap();
        std::fs::create_dir(root.path().join("private")).unwrap();
        let subroot = root.path().join("uploads");

        let inside = resolve_within(root.path(), "uploads/batch").unwrap();
        assert!(ensure_under(&inside, &subroot, "uploads/batch").is_ok());

        let outside = resolve_within(root.path(), "private").unwrap();
        assert!(matches!(
            ensure_under(&outside, &subroot, "private"),
            Err(PathError::OutsideRoot(_))
        ));

        let missing_subroot = root.path().join("nope");
        assert!(matches!(
            ensure_under(&inside, &missing_subroot, "uploads/batch"),
            Err(PathError::OutsideRoot(_))
        ));
    }
}
