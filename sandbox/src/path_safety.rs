//! Path safety contract: every relative path handed to a workspace operation
//! must resolve, after `.`/`..` components are collapsed, to a path that is
//! still rooted under that workspace. The sandbox's filesystem lives inside a
//! container we only talk to over the Docker API, so this is a lexical
//! resolution (no `fs::canonicalize`, which would require a local mount) —
//! equivalent in effect since the container denies symlink traversal outside
//! the mounted volume by construction (non-root user, no bind mounts besides
//! the named volume).

use std::path::{Component, Path, PathBuf};

use crate::error::SandboxError;

/// Resolves `relative_path` against `workspace_root`, collapsing `.`/`..`
/// components, and fails with [`SandboxError::PathEscape`] if the result
/// would land outside `workspace_root`.
pub fn resolve_in_workspace(workspace_root: &str, relative_path: &str) -> Result<String, SandboxError> {
    if relative_path.trim().is_empty() {
        return Err(SandboxError::PathEscape("empty path".to_string()));
    }
    let root = PathBuf::from(workspace_root);
    let mut resolved = root.clone();
    for component in Path::new(relative_path).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(&root) {
                    return Err(SandboxError::PathEscape(relative_path.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SandboxError::PathEscape(relative_path.to_string()));
            }
        }
    }
    if !resolved.starts_with(&root) {
        return Err(SandboxError::PathEscape(relative_path.to_string()));
    }
    Ok(resolved.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_subpath_resolves_under_root() {
        let out = resolve_in_workspace("/root/ws/user-1", "notes/todo.txt").unwrap();
        assert_eq!(out, "/root/ws/user-1/notes/todo.txt");
    }

    #[test]
    fn dot_components_are_collapsed() {
        let out = resolve_in_workspace("/root/ws/user-1", "./a/./b").unwrap();
        assert_eq!(out, "/root/ws/user-1/a/b");
    }

    #[test]
    fn parent_dir_escaping_root_fails() {
        let err = resolve_in_workspace("/root/ws/user-1", "../escape.txt").unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape(_)));
    }

    #[test]
    fn parent_dir_within_root_is_allowed() {
        let out = resolve_in_workspace("/root/ws/user-1", "a/../b.txt").unwrap();
        assert_eq!(out, "/root/ws/user-1/b.txt");
    }

    #[test]
    fn absolute_path_is_rejected() {
        let err = resolve_in_workspace("/root/ws/user-1", "/etc/passwd").unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape(_)));
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = resolve_in_workspace("/root/ws/user-1", "").unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape(_)));
    }
}
