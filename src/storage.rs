//! Filesystem loaders for item files and annotated source trees.

use std::path::Path;

pub mod annotations;
pub mod items;

pub use annotations::{scan_annotations, ScanError};
pub use items::{load_requirements, load_tests, ItemKind, LoadError};

/// Formats `path` relative to `root` when it lies below it, otherwise in
/// full.
pub(crate) fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Drops a directory entry the walk could not visit, logging why.
///
/// Covers unreadable directories and symlink loops.
pub(crate) fn visited(entry: walkdir::Result<walkdir::DirEntry>) -> Option<walkdir::DirEntry> {
    entry
        .inspect_err(|e| tracing::warn!("Skipping unreadable entry: {e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn paths_below_root_are_relative() {
        let root = PathBuf::from("/project");
        assert_eq!(display_path(&root.join("src/a.rs"), &root), "src/a.rs");
    }

    #[test]
    fn paths_outside_root_are_kept() {
        let root = PathBuf::from("/project");
        assert_eq!(display_path(Path::new("/elsewhere/a.rs"), &root), "/elsewhere/a.rs");
    }
}
