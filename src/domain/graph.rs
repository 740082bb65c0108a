//! Bidirectional requirement/test link resolution.
//!
//! The [`LinkGraph`] knows nothing about where records came from. Either side
//! of a relationship may declare it: a test listing a requirement and a
//! requirement listing a test produce the same [`Link`], recorded once.
//! References to ids that do not exist are dropped without error, since
//! requirements and tests are authored independently and may refer to items
//! that have not been written yet.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    item::{ensure_unique, DuplicateId},
    Requirement, Test,
};

/// An association between one requirement and one test.
///
/// Ordering is by requirement id, then test id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Link {
    /// The requirement end.
    #[serde(rename = "req")]
    pub requirement: String,
    /// The test end.
    pub test: String,
}

impl Link {
    /// Creates a link between a requirement and a test.
    pub fn new(requirement: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            test: test.into(),
        }
    }
}

/// Whether a record ended up with any links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// At least one link.
    Linked,
    /// No links.
    Unlinked,
}

impl LinkStatus {
    fn of<T>(related: &[T]) -> Self {
        if related.is_empty() {
            Self::Unlinked
        } else {
            Self::Linked
        }
    }

    /// Returns `true` for [`LinkStatus::Linked`].
    #[must_use]
    pub const fn is_linked(self) -> bool {
        matches!(self, Self::Linked)
    }
}

/// A requirement together with the tests resolved against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRequirement {
    /// The underlying record.
    #[serde(flatten)]
    pub requirement: Requirement,
    /// Sorted ids of linked tests.
    pub tests: Vec<String>,
    /// `linked` if `tests` is non-empty.
    pub status: LinkStatus,
}

/// A test together with the requirements resolved against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTest {
    /// The underlying record.
    #[serde(flatten)]
    pub test: Test,
    /// Sorted ids of linked requirements.
    pub reqs: Vec<String>,
    /// `linked` if `reqs` is non-empty.
    pub status: LinkStatus,
}

/// Errors that can occur when resolving links.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Two requirements share an id.
    #[error("requirement {0}")]
    DuplicateRequirement(#[source] DuplicateId),
    /// Two tests share an id, whichever mix of item files and source
    /// annotations declared them.
    #[error("test {0}")]
    DuplicateTest(#[source] DuplicateId),
}

impl ResolveError {
    /// The underlying duplicate.
    #[must_use]
    pub const fn duplicate(&self) -> &DuplicateId {
        match self {
            Self::DuplicateRequirement(duplicate) | Self::DuplicateTest(duplicate) => duplicate,
        }
    }
}

/// The resolved, deduplicated link set and per-record back-references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkGraph {
    requirements: Vec<ResolvedRequirement>,
    tests: Vec<ResolvedTest>,
    links: BTreeSet<Link>,
}

impl LinkGraph {
    /// Resolves the links declared by both record sets.
    ///
    /// `tests` is the concatenation of declarative and scanned tests; record
    /// order is preserved in the output.
    ///
    /// # Errors
    ///
    /// Returns an error if an id is claimed twice within the requirement set
    /// or within the test set.
    #[instrument(level = "debug", skip_all, fields(requirements = requirements.len(), tests = tests.len()))]
    pub fn resolve(requirements: Vec<Requirement>, tests: Vec<Test>) -> Result<Self, ResolveError> {
        ensure_unique(&requirements).map_err(ResolveError::DuplicateRequirement)?;
        ensure_unique(&tests).map_err(ResolveError::DuplicateTest)?;

        let links = collect_links(&requirements, &tests);

        let mut tests_of: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut reqs_of: BTreeMap<String, Vec<String>> = BTreeMap::new();
        // `links` iterates in (requirement, test) order, so both lists come
        // out sorted.
        for link in &links {
            tests_of
                .entry(link.requirement.clone())
                .or_default()
                .push(link.test.clone());
            reqs_of
                .entry(link.test.clone())
                .or_default()
                .push(link.requirement.clone());
        }

        let requirements = requirements
            .into_iter()
            .map(|requirement| {
                let tests = tests_of.remove(requirement.id.as_str()).unwrap_or_default();
                ResolvedRequirement {
                    status: LinkStatus::of(&tests),
                    requirement,
                    tests,
                }
            })
            .collect();

        let tests = tests
            .into_iter()
            .map(|test| {
                let reqs = reqs_of.remove(test.id.as_str()).unwrap_or_default();
                ResolvedTest {
                    status: LinkStatus::of(&reqs),
                    test,
                    reqs,
                }
            })
            .collect();

        tracing::debug!(links = links.len(), "resolved link graph");

        Ok(Self {
            requirements,
            tests,
            links,
        })
    }

    /// Resolved requirements, in input order.
    #[must_use]
    pub fn requirements(&self) -> &[ResolvedRequirement] {
        &self.requirements
    }

    /// Resolved tests, in input order.
    #[must_use]
    pub fn tests(&self) -> &[ResolvedTest] {
        &self.tests
    }

    /// The link set, sorted by requirement id then test id.
    pub fn links(&self) -> impl ExactSizeIterator<Item = &Link> {
        self.links.iter()
    }

    /// Looks up a resolved requirement by id.
    #[must_use]
    pub fn requirement(&self, id: &str) -> Option<&ResolvedRequirement> {
        self.requirements.iter().find(|r| r.requirement.id == id)
    }

    /// Looks up a resolved test by id.
    #[must_use]
    pub fn test(&self, id: &str) -> Option<&ResolvedTest> {
        self.tests.iter().find(|t| t.test.id == id)
    }

    /// Requirements no test is linked to.
    pub fn unlinked_requirements(&self) -> impl Iterator<Item = &ResolvedRequirement> {
        self.requirements
            .iter()
            .filter(|r| !r.status.is_linked())
    }

    /// Splits the graph into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ResolvedRequirement>, Vec<ResolvedTest>, Vec<Link>) {
        (self.requirements, self.tests, self.links.into_iter().collect())
    }
}

/// The union of links declared from either side, keeping only pairs whose
/// endpoints both exist.
fn collect_links(requirements: &[Requirement], tests: &[Test]) -> BTreeSet<Link> {
    let requirement_ids: BTreeSet<&str> = requirements.iter().map(|r| r.id.as_str()).collect();
    let test_ids: BTreeSet<&str> = tests.iter().map(|t| t.id.as_str()).collect();

    let (requirement_ids, test_ids) = (&requirement_ids, &test_ids);

    let from_tests = tests.iter().flat_map(move |test| {
        test.declared_links
            .iter()
            .filter(move |req| requirement_ids.contains(req.as_str()))
            .map(move |req| Link::new(req.as_str(), test.id.as_str()))
    });

    let from_requirements = requirements.iter().flat_map(move |requirement| {
        requirement
            .declared_links
            .iter()
            .filter(move |test| test_ids.contains(test.as_str()))
            .map(move |test| Link::new(requirement.id.as_str(), test.as_str()))
    });

    from_tests.chain(from_requirements).collect()
}
