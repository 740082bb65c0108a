//! Scanning source trees for `HODOR-*` annotation blocks.
//!
//! Every readable text file below the scan directories is segmented into
//! directive blocks (see [`crate::domain::directive`]) and each block becomes
//! a [`Test`]. Files that are not valid UTF-8 are treated as binary and
//! skipped.

use std::{
    io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    domain::{
        directive::{self, DirectiveError},
        item::ensure_unique,
        SkipList, Test,
    },
    storage::{display_path, visited},
};

/// Errors that abort an annotation scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A configured scan directory does not exist.
    #[error("Test scan directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// A `HODOR-*` token that is not a known directive.
    #[error("Unknown HODOR directive '{directive}' in {file}:{line}")]
    UnknownDirective {
        /// The offending token.
        directive: String,
        /// The file, relative to the project root where possible.
        file: String,
        /// 1-based line number.
        line: usize,
    },

    /// A block closed without naming any requirements.
    #[error("Missing HODOR-REQS in {file}:{line}")]
    MissingRequiredReference {
        /// The file, relative to the project root where possible.
        file: String,
        /// 1-based line the block started on.
        line: usize,
    },

    /// Two blocks produced the same test id.
    #[error("Duplicate test id '{id}' in {file} (already declared in {first})")]
    DuplicateIdentifier {
        /// The contested id.
        id: String,
        /// The file holding the repeat.
        file: String,
        /// The file holding the first declaration.
        first: String,
    },

    /// A file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The unreadable file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    fn in_file(error: DirectiveError, file: &str) -> Self {
        match error {
            DirectiveError::UnknownDirective { directive, line } => Self::UnknownDirective {
                directive,
                file: file.to_string(),
                line,
            },
            DirectiveError::MissingRequiredReference { line } => Self::MissingRequiredReference {
                file: file.to_string(),
                line,
            },
        }
    }
}

/// Scans every file below `dirs` (relative to `root`) for annotation blocks.
///
/// Files are visited in sorted order and directories named in `skip` are not
/// descended into, so the output is reproducible.
///
/// # Errors
///
/// Fails on a missing directory, an unreadable file, an unknown directive, a
/// block with no requirement references, or a repeated test id.
pub fn scan_annotations(root: &Path, dirs: &[String], skip: &SkipList) -> Result<Vec<Test>, ScanError> {
    let mut tests = Vec::new();
    for dir in dirs {
        let dir_path = root.join(dir);
        if !dir_path.is_dir() {
            return Err(ScanError::DirectoryNotFound(dir_path));
        }

        for path in collect_scan_paths(&dir_path, skip) {
            tests.extend(scan_file(&path, root)?);
        }
    }

    ensure_unique(&tests).map_err(|duplicate| ScanError::DuplicateIdentifier {
        id: duplicate.id,
        file: duplicate.second,
        first: duplicate.first,
    })?;

    tracing::info!("Found {} annotated tests", tests.len());
    Ok(tests)
}

fn collect_scan_paths(dir: &Path, skip: &SkipList) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !skip.skips_dir(&entry.file_name().to_string_lossy())
        })
        .filter_map(visited)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Extracts the tests declared in one file.
fn scan_file(path: &Path, root: &Path) -> Result<Vec<Test>, ScanError> {
    let bytes = std::fs::read(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let Ok(content) = String::from_utf8(bytes) else {
        tracing::debug!("Skipping binary file {}", path.display());
        return Ok(Vec::new());
    };

    let label = display_path(path, root);
    scan_text(&content, &label)
}

/// Extracts the tests declared in `text`, attributing them to `label`.
///
/// # Errors
///
/// Fails on an unknown directive or a block with no requirement references.
pub fn scan_text(text: &str, label: &str) -> Result<Vec<Test>, ScanError> {
    directive::blocks(text)
        .map(|block| {
            block
                .and_then(|block| block.into_test(label))
                .map_err(|error| ScanError::in_file(error, label))
        })
        .collect()
}
