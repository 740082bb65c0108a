use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Link, LinkGraph, ResolvedRequirement, ResolvedTest, Summary};

/// Everything a report needs, in one serialisable structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    /// UTC generation time, formatted `%Y-%m-%d %H:%M:%SZ`.
    pub generated_at: String,
    /// Display label for the project root.
    pub source_root: String,
    /// Coverage statistics.
    pub summary: Summary,
    /// Requirements with their linked tests and status.
    pub requirements: Vec<ResolvedRequirement>,
    /// Tests with their linked requirements, status and references.
    pub tests: Vec<ResolvedTest>,
    /// The sorted link set.
    pub links: Vec<Link>,
}

impl Payload {
    /// Packages a resolved graph for export.
    #[must_use]
    pub fn new(graph: LinkGraph, source_root: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        let summary = Summary::of(&graph);
        let (requirements, tests, links) = graph.into_parts();
        Self {
            generated_at: generated_at.format("%Y-%m-%d %H:%M:%SZ").to_string(),
            source_root: source_root.into(),
            summary,
            requirements,
            tests,
            links,
        }
    }
}
