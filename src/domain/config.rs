use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};

/// The name of the configuration file, relative to the project root.
pub const CONFIG_FILE: &str = ".trace-audit.toml";

/// Configuration for a traceability audit.
///
/// This struct holds the directories to read requirement and test records
/// from, the directories to scan for in-source annotations, and the names
/// that loading and scanning should skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Directories holding requirement item files, relative to the root.
    pub requirement_dirs: Vec<String>,

    /// Directories holding declarative test item files, relative to the root.
    pub test_dirs: Vec<String>,

    /// Directories scanned for `HODOR-*` annotations, relative to the root.
    pub scan_dirs: Vec<String>,

    /// Label shown in reports in place of the absolute project root.
    pub display_root: String,

    /// Report title.
    pub title: String,

    /// Report subtitle.
    pub subtitle: String,

    skip: SkipList,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            requirement_dirs: default_requirement_dirs(),
            test_dirs: default_test_dirs(),
            scan_dirs: Vec::new(),
            display_root: default_display_root(),
            title: default_title(),
            subtitle: default_subtitle(),
            skip: SkipList::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads `<root>/.trace-audit.toml`, falling back to the defaults only
    /// if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(root: &Path) -> Result<Self, String> {
        let path = root.join(CONFIG_FILE);
        let exists = path
            .try_exists()
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        if !exists {
            tracing::debug!("No {CONFIG_FILE} in {}, using defaults", root.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The names skipped while loading and scanning.
    #[must_use]
    pub const fn skip_list(&self) -> &SkipList {
        &self.skip
    }
}

/// Names of directories and files that loading and scanning pass over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipList {
    dirs: BTreeSet<String>,
    files: BTreeSet<String>,
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new(default_skip_dirs(), default_skip_files())
    }
}

impl SkipList {
    /// Creates a skip list from directory names and file names.
    pub fn new(
        dirs: impl IntoIterator<Item = String>,
        files: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
            files: files.into_iter().collect(),
        }
    }

    /// Whether the scanner should not descend into a directory with this
    /// name.
    #[must_use]
    pub fn skips_dir(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    /// Whether the item loader should ignore a file with this name.
    #[must_use]
    pub fn skips_file(&self, name: &str) -> bool {
        self.files.contains(name)
    }
}

fn default_requirement_dirs() -> Vec<String> {
    vec!["reqs/mon".to_string()]
}

fn default_test_dirs() -> Vec<String> {
    vec!["reqs/tst".to_string()]
}

fn default_display_root() -> String {
    ".".to_string()
}

fn default_title() -> String {
    "Traceability Audit".to_string()
}

fn default_subtitle() -> String {
    "Audit-focused view of requirement coverage and test linkage.".to_string()
}

fn default_skip_dirs() -> Vec<String> {
    [
        ".git",
        ".venv",
        "__pycache__",
        ".mypy_cache",
        ".pytest_cache",
        ".ruff_cache",
        "node_modules",
        "dist",
        "build",
    ]
    .map(String::from)
    .to_vec()
}

// Tool metadata and marker files that live alongside item files.
fn default_skip_files() -> Vec<String> {
    [
        ".doorstop.yml",
        "doorstop.yml",
        ".doorstop.skip",
        ".doorstop.skip-all",
    ]
    .map(String::from)
    .to_vec()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_requirement_dirs")]
        requirement_dirs: Vec<String>,

        #[serde(default = "default_test_dirs")]
        test_dirs: Vec<String>,

        #[serde(default)]
        scan_dirs: Vec<String>,

        #[serde(default = "default_display_root")]
        display_root: String,

        #[serde(default = "default_title")]
        title: String,

        #[serde(default = "default_subtitle")]
        subtitle: String,

        /// Directory names the annotation scanner does not descend into.
        #[serde(default = "default_skip_dirs")]
        skip_dirs: Vec<String>,

        /// File names the item loader ignores.
        #[serde(default = "default_skip_files")]
        skip_files: Vec<String>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                requirement_dirs,
                test_dirs,
                scan_dirs,
                display_root,
                title,
                subtitle,
                skip_dirs,
                skip_files,
            } => Self {
                requirement_dirs,
                test_dirs,
                scan_dirs,
                display_root,
                title,
                subtitle,
                skip: SkipList::new(skip_dirs, skip_files),
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        let Config {
            requirement_dirs,
            test_dirs,
            scan_dirs,
            display_root,
            title,
            subtitle,
            skip: SkipList { dirs, files },
        } = config;
        Self::V1 {
            requirement_dirs,
            test_dirs,
            scan_dirs,
            display_root,
            title,
            subtitle,
            skip_dirs: dirs.into_iter().collect(),
            skip_files: files.into_iter().collect(),
        }
    }
}
