//! Canonical requirement and test records.
//!
//! Records are produced either from declarative item files (see
//! [`crate::storage::items`]) or, for tests, from directive blocks found in
//! source files (see [`crate::storage::annotations`]). Both origins end up as
//! the same types so the resolver can treat them uniformly.

use serde::Serialize;
use thiserror::Error;

/// A declarative record describing an obligation the audited system must
/// satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    /// Unique identifier within the requirement namespace.
    pub id: String,
    /// Free-form description.
    pub text: String,
    /// Ids of tests this requirement claims to be verified by.
    #[serde(rename = "links")]
    pub declared_links: Vec<String>,
    /// Path of the file the record was read from.
    #[serde(rename = "path")]
    pub source_path: String,
}

/// A record asserting coverage of one or more requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Test {
    /// Unique identifier within the combined test namespace.
    pub id: String,
    /// Free-form description.
    pub text: String,
    /// Ids of requirements this test claims to cover.
    #[serde(rename = "links")]
    pub declared_links: Vec<String>,
    /// Path of the file the record was read from.
    #[serde(rename = "path")]
    pub source_path: String,
    /// Free-text evidence such as citations. Not used for linking.
    pub references: Vec<String>,
}

impl Test {
    /// Builds a test from a declarative item, pulling its references out of
    /// the text.
    #[must_use]
    pub fn from_item(id: String, text: String, declared_links: Vec<String>, source_path: String) -> Self {
        let references = extract_references(&text);
        Self {
            id,
            text,
            declared_links,
            source_path,
            references,
        }
    }
}

/// Anything with an identity and an origin.
pub trait Record {
    /// The record's identifier.
    fn id(&self) -> &str;

    /// The path of the file that declared the record.
    fn source_path(&self) -> &str;
}

impl Record for Requirement {
    fn id(&self) -> &str {
        &self.id
    }

    fn source_path(&self) -> &str {
        &self.source_path
    }
}

impl Record for Test {
    fn id(&self) -> &str {
        &self.id
    }

    fn source_path(&self) -> &str {
        &self.source_path
    }
}

/// Two records claimed the same identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("duplicate id '{id}' in {second} (already declared in {first})")]
pub struct DuplicateId {
    /// The contested identifier.
    pub id: String,
    /// Where the identifier was first declared.
    pub first: String,
    /// Where it was declared again.
    pub second: String,
}

/// Checks that no two records in a completed collection share an id.
///
/// Records are examined in order, so the reported `second` location is the
/// first repeat encountered.
///
/// # Errors
///
/// Returns [`DuplicateId`] naming the id and both source paths.
pub fn ensure_unique<R: Record>(records: &[R]) -> Result<(), DuplicateId> {
    let mut seen = std::collections::HashMap::with_capacity(records.len());
    for record in records {
        if let Some(first) = seen.insert(record.id(), record.source_path()) {
            return Err(DuplicateId {
                id: record.id().to_string(),
                first: first.to_string(),
                second: record.source_path().to_string(),
            });
        }
    }
    Ok(())
}

/// Pulls a bulleted reference list out of free-form item text.
///
/// The list starts after a line reading `References:` and runs over the
/// following `- ` bullets. A blank or non-bullet line ends it.
#[must_use]
pub fn extract_references(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .skip_while(|line| *line != "References:")
        .skip(1)
        .map_while(|line| line.strip_prefix("- "))
        .map(ToString::to_string)
        .collect()
}
