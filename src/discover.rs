//! Repository set discovery for a root directory.

use crate::error::DiscoveryError;
use crate::probe::VersionControl;
use std::path::{Path, PathBuf};

/// Returns the repositories to update under `root`.
///
/// A root that is itself a repository yields just `[root]`; nested repositories
/// are not looked for. Otherwise every immediate subdirectory that is a
/// repository is returned, in directory listing order.
pub fn discover<V>(root: &Path, vcs: &V) -> Result<Vec<PathBuf>, DiscoveryError>
where
    V: VersionControl + ?Sized,
{
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

    if vcs.is_repository(&root) {
        return Ok(vec![root]);
    }

    let entries = std::fs::read_dir(&root).map_err(|source| DiscoveryError::Unreadable {
        path: root.clone(),
        source,
    })?;

    Ok(entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| path.is_dir() && vcs.is_repository(path))
        .collect())
}
