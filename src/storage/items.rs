//! Declarative requirement and test item files.
//!
//! Item files are YAML mappings (`.yml` or `.yaml`) in the style of
//! Doorstop:
//!
//! ```yaml
//! uid: REQ-001          # optional, defaults to the file stem
//! text: |               # or `title`
//!   The system shall reject expired sessions.
//! links:                # a scalar, or a sequence of scalars/mappings
//! - TST-001
//! ```
//!
//! Unrecognised fields are ignored.

use std::{
    ffi::OsStr,
    fmt, io,
    path::{Path, PathBuf},
};

use serde_yaml::{Mapping, Value};
use walkdir::WalkDir;

use crate::{
    domain::{item::ensure_unique, DuplicateId, Requirement, SkipList, Test},
    storage::{display_path, visited},
};

/// Which namespace an item directory feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Requirement items.
    Requirement,
    /// Declarative test items.
    Test,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement => f.write_str("Requirement"),
            Self::Test => f.write_str("Test"),
        }
    }
}

/// Errors that can occur when loading item files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A configured item directory does not exist.
    #[error("{kind} directory not found: {}", path.display())]
    DirectoryNotFound {
        /// The namespace the directory was meant to feed.
        kind: ItemKind,
        /// The missing directory.
        path: PathBuf,
    },

    /// Two item files of the same kind declared the same id.
    #[error("{0}")]
    DuplicateIdentifier(#[from] DuplicateId),

    /// An item file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The unreadable file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// An item file is not valid YAML.
    #[error("failed to parse {}", path.display())]
    Yaml {
        /// The malformed file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// An item file holds something other than a mapping.
    #[error("{} does not contain a mapping", path.display())]
    NotAMapping {
        /// The malformed file.
        path: PathBuf,
    },
}

/// An item file normalised to its linking-relevant fields.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    id: String,
    text: String,
    links: Vec<String>,
    path: String,
}

/// Loads every requirement item below `dirs` (relative to `root`).
///
/// # Errors
///
/// Fails if a directory is missing, a file cannot be read or parsed, or two
/// files declare the same id.
pub fn load_requirements(
    root: &Path,
    dirs: &[String],
    skip: &SkipList,
) -> Result<Vec<Requirement>, LoadError> {
    let requirements: Vec<_> = load_items(root, dirs, ItemKind::Requirement, skip)?
        .into_iter()
        .map(|item| Requirement {
            id: item.id,
            text: item.text,
            declared_links: item.links,
            source_path: item.path,
        })
        .collect();
    ensure_unique(&requirements)?;

    tracing::info!("Loaded {} requirements", requirements.len());
    Ok(requirements)
}

/// Loads every declarative test item below `dirs` (relative to `root`).
///
/// References are extracted from each test's text.
///
/// # Errors
///
/// Fails if a directory is missing, a file cannot be read or parsed, or two
/// files declare the same id.
pub fn load_tests(root: &Path, dirs: &[String], skip: &SkipList) -> Result<Vec<Test>, LoadError> {
    let tests: Vec<_> = load_items(root, dirs, ItemKind::Test, skip)?
        .into_iter()
        .map(|item| Test::from_item(item.id, item.text, item.links, item.path))
        .collect();
    ensure_unique(&tests)?;

    for test in tests.iter().filter(|t| t.declared_links.is_empty()) {
        tracing::warn!("Test {} in {} declares no links", test.id, test.source_path);
    }

    tracing::info!("Loaded {} declarative tests", tests.len());
    Ok(tests)
}

fn load_items(
    root: &Path,
    dirs: &[String],
    kind: ItemKind,
    skip: &SkipList,
) -> Result<Vec<Item>, LoadError> {
    let mut items = Vec::new();
    for dir in dirs {
        let dir_path = root.join(dir);
        if !dir_path.is_dir() {
            return Err(LoadError::DirectoryNotFound {
                kind,
                path: dir_path,
            });
        }

        for path in collect_item_paths(&dir_path, skip) {
            items.push(load_item(&path, root)?);
        }
    }
    Ok(items)
}

fn collect_item_paths(dir: &Path, skip: &SkipList) -> Vec<PathBuf> {
    let mut paths: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(visited)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            matches!(
                entry.path().extension().and_then(OsStr::to_str),
                Some("yml" | "yaml")
            )
        })
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            if skip.skips_file(&name) {
                tracing::debug!("Skipping marker file {}", entry.path().display());
                false
            } else {
                true
            }
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    paths.sort();
    paths
}

fn load_item(path: &Path, root: &Path) -> Result<Item, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = if content.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(&content).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };

    let fields = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => Mapping::new(),
        _ => {
            return Err(LoadError::NotAMapping {
                path: path.to_path_buf(),
            });
        }
    };

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(normalise(&fields, stem, display_path(path, root)))
}

/// Applies the coercion rules for item fields.
///
/// - `id`: the `uid` field, else the file stem.
/// - `text`: the `text` field, else `title`, else empty; trailing whitespace
///   is trimmed.
/// - `links`: see [`coerce_links`].
///
/// A field that is null or an empty string counts as absent.
fn normalise(fields: &Mapping, stem: String, path: String) -> Item {
    let field = |name: &str| fields.get(name).and_then(coerce_scalar);

    let id = field("uid").unwrap_or(stem);
    let text = field("text")
        .or_else(|| field("title"))
        .unwrap_or_default()
        .trim_end()
        .to_string();
    let links = fields.get("links").map(coerce_links).unwrap_or_default();

    Item {
        id,
        text,
        links,
        path,
    }
}

/// Renders a YAML value as a string.
///
/// Strings are taken as-is, numbers and booleans use their usual textual
/// form, and compound values are rendered as YAML. Null and empty strings
/// yield `None`.
fn coerce_scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Tagged(tagged) => return coerce_scalar(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => serde_yaml::to_string(value)
            .map(|yaml| yaml.trim_end().to_string())
            .ok()?,
    };
    (!text.is_empty()).then_some(text)
}

/// Normalises the `links` field to a list of ids.
///
/// - a scalar becomes a one-element list
/// - a sequence contributes each scalar entry, and the keys of each mapping
///   entry (`- REQ-001: <fingerprint>`); null entries are dropped
/// - anything else yields no links
fn coerce_links(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(entries) => entries.iter().flat_map(coerce_link_entry).collect(),
        Value::Mapping(_) => {
            tracing::debug!("Ignoring malformed links field: {value:?}");
            Vec::new()
        }
        Value::Tagged(tagged) => coerce_links(&tagged.value),
        scalar => coerce_scalar(scalar).into_iter().collect(),
    }
}

fn coerce_link_entry(entry: &Value) -> Vec<String> {
    match entry {
        Value::Mapping(mapping) => mapping.keys().filter_map(coerce_scalar).collect(),
        Value::Sequence(_) => {
            tracing::debug!("Ignoring nested links entry: {entry:?}");
            Vec::new()
        }
        other => coerce_scalar(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn dirs(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn parse(yaml: &str) -> Item {
        let Value::Mapping(fields) = serde_yaml::from_str(yaml).unwrap() else {
            panic!("fixture must be a mapping");
        };
        normalise(&fields, "STEM".to_string(), "STEM.yml".to_string())
    }

    #[test]
    fn uid_defaults_to_file_stem() {
        assert_eq!(parse("text: hello").id, "STEM");
        assert_eq!(parse("uid: REQ-9\ntext: hello").id, "REQ-9");
        assert_eq!(parse("uid: ''\ntext: hello").id, "STEM");
        assert_eq!(parse("uid: 42").id, "42");
    }

    #[test_case("text: body\ntitle: heading", "body"; "text wins over title")]
    #[test_case("title: heading", "heading"; "title fallback")]
    #[test_case("text: ''\ntitle: heading", "heading"; "empty text falls back")]
    #[test_case("text: 12.5", "12.5"; "number coerced")]
    #[test_case("text: true", "true"; "bool coerced")]
    #[test_case("text: \"trailing   \\n\\n\"", "trailing"; "trailing whitespace trimmed")]
    #[test_case("active: true", ""; "absent")]
    fn text_coercion(yaml: &str, expected: &str) {
        assert_eq!(parse(yaml).text, expected);
    }

    #[test_case("links: TST-1", &["TST-1"]; "single scalar")]
    #[test_case("links: [TST-1, TST-2]", &["TST-1", "TST-2"]; "sequence")]
    #[test_case("links: [7, true]", &["7", "true"]; "non-string entries coerced")]
    #[test_case("links:\n- REQ-1: abc123\n- REQ-2: null", &["REQ-1", "REQ-2"]; "doorstop mappings")]
    #[test_case("links: [TST-1, null, '']", &["TST-1"]; "null and empty dropped")]
    #[test_case("links: {a: b}", &[]; "mapping is malformed")]
    #[test_case("links: null", &[]; "null")]
    #[test_case("text: x", &[]; "absent")]
    fn link_coercion(yaml: &str, expected: &[&str]) {
        assert_eq!(parse(yaml).links, expected);
    }

    #[test]
    fn loads_both_extensions_in_path_order() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "reqs/mon/b.yaml", "text: second\n");
        write(root, "reqs/mon/a.yml", "text: first\nlinks: [TST-1]\n");
        write(root, "reqs/mon/nested/c.yml", "uid: REQ-C\n");
        write(root, "reqs/mon/notes.md", "not an item");

        let requirements = load_requirements(root, &dirs(&["reqs/mon"]), &SkipList::default()).unwrap();

        let ids: Vec<_> = requirements.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "REQ-C"]);
        assert_eq!(requirements[0].declared_links, ["TST-1"]);
        assert_eq!(requirements[0].source_path, "reqs/mon/a.yml");
    }

    #[test]
    fn marker_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "reqs/.doorstop.yml", "settings:\n  digits: 3\n");
        write(root, "reqs/REQ001.yml", "text: real\n");

        let requirements = load_requirements(root, &dirs(&["reqs"]), &SkipList::default()).unwrap();

        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].id, "REQ001");
    }

    #[test]
    fn empty_file_is_an_empty_item() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "reqs/REQ001.yml", "");

        let requirements =
            load_requirements(tmp.path(), &dirs(&["reqs"]), &SkipList::default()).unwrap();

        assert_eq!(requirements[0].id, "REQ001");
        assert!(requirements[0].text.is_empty());
        assert!(requirements[0].declared_links.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_items_are_loaded() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "shared/R1.yml", "text: shared\n");
        fs::create_dir_all(tmp.path().join("reqs/mon")).unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("shared/R1.yml"),
            tmp.path().join("reqs/mon/R1.yml"),
        )
        .unwrap();

        let requirements =
            load_requirements(tmp.path(), &dirs(&["reqs/mon"]), &SkipList::default()).unwrap();

        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].text, "shared");
        assert_eq!(requirements[0].source_path, "reqs/mon/R1.yml");
    }

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();

        let error = load_tests(tmp.path(), &dirs(&["reqs/tst"]), &SkipList::default()).unwrap_err();

        assert!(matches!(
            error,
            LoadError::DirectoryNotFound {
                kind: ItemKind::Test,
                ..
            }
        ));
        assert!(error.to_string().starts_with("Test directory not found"));
    }

    #[test]
    fn duplicate_uid_names_both_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "reqs/a.yml", "uid: REQ-1\n");
        write(root, "reqs/b.yml", "uid: REQ-1\n");

        let error = load_requirements(root, &dirs(&["reqs"]), &SkipList::default()).unwrap_err();

        let LoadError::DuplicateIdentifier(duplicate) = error else {
            panic!("expected duplicate identifier, got {error:?}");
        };
        assert_eq!(duplicate.id, "REQ-1");
        assert_eq!(duplicate.first, "reqs/a.yml");
        assert_eq!(duplicate.second, "reqs/b.yml");
    }

    #[test]
    fn duplicates_are_checked_across_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "one/REQ-1.yml", "text: a\n");
        write(root, "two/REQ-1.yml", "text: b\n");

        let error =
            load_requirements(root, &dirs(&["one", "two"]), &SkipList::default()).unwrap_err();

        assert!(matches!(error, LoadError::DuplicateIdentifier(_)));
    }

    #[test]
    fn invalid_yaml_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "reqs/bad.yml", "text: [unclosed\n");

        let error = load_requirements(tmp.path(), &dirs(&["reqs"]), &SkipList::default()).unwrap_err();

        assert!(matches!(error, LoadError::Yaml { .. }));
    }

    #[test]
    fn non_mapping_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "reqs/list.yml", "- a\n- b\n");

        let error = load_requirements(tmp.path(), &dirs(&["reqs"]), &SkipList::default()).unwrap_err();

        assert!(matches!(error, LoadError::NotAMapping { .. }));
    }

    #[test]
    fn declarative_tests_carry_references_from_text() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "reqs/tst/TST-1.yml",
            "text: |\n  Exercises login.\n\n  References:\n  - OWASP ASVS 2.1\nlinks: [REQ-1]\n",
        );

        let tests = load_tests(tmp.path(), &dirs(&["reqs/tst"]), &SkipList::default()).unwrap();

        assert_eq!(tests[0].references, ["OWASP ASVS 2.1"]);
        assert_eq!(tests[0].declared_links, ["REQ-1"]);
    }
}
