//! One complete audit run.
//!
//! An [`Audit`] loads requirement and test items, scans annotated sources,
//! resolves the link graph and packages the result as a [`Payload`]. Every
//! stage fails fast: no payload is produced if any stage errors.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{
    domain::{Config, LinkGraph, Payload, ResolveError},
    storage::{self, LoadError, ScanError},
};

/// Errors that abort an audit.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Loading requirement or test items failed.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Scanning annotated sources failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Combining the record sets failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The configuration file exists but could not be used.
    #[error("{0}")]
    Config(String),
}

/// An audit of one project tree.
#[derive(Debug, Clone)]
pub struct Audit {
    root: PathBuf,
    config: Config,
}

impl Audit {
    /// Creates an audit of the tree at `root`.
    #[must_use]
    pub const fn new(root: PathBuf, config: Config) -> Self {
        Self { root, config }
    }

    /// Creates an audit using the configuration file in `root`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Config`] if the configuration file exists but
    /// cannot be read or parsed.
    pub fn open(root: PathBuf) -> Result<Self, AuditError> {
        let config = Config::load_or_default(&root).map_err(AuditError::Config)?;
        Ok(Self::new(root, config))
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the configuration, for applying overrides.
    pub const fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Loads and scans every configured source and resolves the links.
    ///
    /// Declarative tests precede scanned tests in the result.
    ///
    /// # Errors
    ///
    /// Returns the first loading, scanning or resolution error.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn resolve(&self) -> Result<LinkGraph, AuditError> {
        let skip = self.config.skip_list();

        let requirements = storage::load_requirements(&self.root, &self.config.requirement_dirs, skip)?;
        let mut tests = storage::load_tests(&self.root, &self.config.test_dirs, skip)?;
        tests.extend(storage::scan_annotations(
            &self.root,
            &self.config.scan_dirs,
            skip,
        )?);

        Ok(LinkGraph::resolve(requirements, tests)?)
    }

    /// Runs the audit and packages the result, stamped with the current
    /// time.
    ///
    /// # Errors
    ///
    /// See [`Audit::resolve`].
    pub fn run(&self) -> Result<Payload, AuditError> {
        self.run_at(Utc::now())
    }

    /// Runs the audit and packages the result, stamped with `generated_at`.
    ///
    /// # Errors
    ///
    /// See [`Audit::resolve`].
    pub fn run_at(&self, generated_at: DateTime<Utc>) -> Result<Payload, AuditError> {
        let graph = self.resolve()?;
        Ok(Payload::new(
            graph,
            self.config.display_root.clone(),
            generated_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn audit(root: &Path, scan_dirs: &[&str]) -> Audit {
        let mut config = Config::default();
        config.scan_dirs = scan_dirs.iter().map(ToString::to_string).collect();
        Audit::new(root.to_path_buf(), config)
    }

    #[test]
    fn declarative_tests_come_before_scanned_tests() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "reqs/mon/R1.yml", "text: r1\n");
        write(tmp.path(), "reqs/tst/T1.yml", "links: [R1]\n");
        write(tmp.path(), "src/a.rs", "// HODOR-REQS: R1\n");

        let graph = audit(tmp.path(), &["src"]).resolve().unwrap();

        let ids: Vec<_> = graph.tests().iter().map(|t| t.test.id.as_str()).collect();
        assert_eq!(ids, ["T1", "src/a.rs#L1"]);
        assert_eq!(graph.requirement("R1").unwrap().tests, ["T1", "src/a.rs#L1"]);
    }

    #[test]
    fn scanned_id_colliding_with_item_test_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "reqs/mon/R1.yml", "text: r1\n");
        write(tmp.path(), "reqs/tst/T1.yml", "links: [R1]\n");
        write(tmp.path(), "src/a.rs", "// HODOR-ID: T1\n// HODOR-REQS: R1\n");

        let error = audit(tmp.path(), &["src"]).resolve().unwrap_err();

        let AuditError::Resolve(error) = error else {
            panic!("expected resolve error, got {error:?}");
        };
        assert_eq!(error.duplicate().first, "reqs/tst/T1.yml");
        assert_eq!(error.duplicate().second, "src/a.rs");
    }

    #[test]
    fn missing_requirement_directory_aborts() {
        let tmp = TempDir::new().unwrap();
        let error = audit(tmp.path(), &[]).run().unwrap_err();
        assert!(matches!(
            error,
            AuditError::Load(LoadError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn open_reads_configuration_file() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            crate::domain::CONFIG_FILE,
            "_version = \"1\"\nrequirement_dirs = [\"reqs\"]\ntest_dirs = []\ndisplay_root = \"project\"\n",
        );
        write(tmp.path(), "reqs/R1.yml", "text: r1\n");

        let payload = Audit::open(tmp.path().to_path_buf())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(payload.source_root, "project");
        assert_eq!(payload.summary.requirements_total, 1);
        assert!(payload.summary.coverage_pct.abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_configuration_file_aborts() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            crate::domain::CONFIG_FILE,
            "_version = \"1\"\nscan_dirs = \"src\"\n",
        );
        write(tmp.path(), "reqs/mon/R1.yml", "text: r1\n");
        write(tmp.path(), "reqs/tst/.keep", "");
        write(tmp.path(), "src/a.rs", "// HODOR-REQS: R1\n");

        let error = Audit::open(tmp.path().to_path_buf()).unwrap_err();

        let AuditError::Config(message) = error else {
            panic!("expected config error, got {error:?}");
        };
        assert!(message.starts_with("Failed to parse config file:"));
    }
}
