use std::path::{Path, PathBuf};

/// Resolves a path captured from a scan header.
///
/// Paths starting with `/` are taken as they are. Anything else is relative
/// to the workspace folder of the log; without one there is no target.
pub fn resolve_target(path: &str, workspace_folder: Option<&Path>) -> Option<PathBuf> {
    if path.is_empty() {
        return None;
    }
    if path.starts_with('/') {
        return Some(PathBuf::from(path));
    }
    workspace_folder.map(|folder| folder.join(path))
}
