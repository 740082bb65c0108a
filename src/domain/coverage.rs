//! Coverage statistics over a resolved [`LinkGraph`].

use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::LinkGraph;

/// Summary counts for a resolved link graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Number of requirements.
    pub requirements_total: usize,
    /// Number of tests, declarative and scanned.
    pub tests_total: usize,
    /// Size of the deduplicated link set.
    pub links_total: usize,
    /// Requirements with at least one test.
    pub requirements_linked: usize,
    /// Requirements with no tests.
    pub requirements_unlinked: usize,
    /// Tests with at least one requirement.
    pub tests_linked: usize,
    /// Tests with no requirements.
    pub tests_unlinked: usize,
    /// Percentage of linked requirements, to one decimal place.
    pub coverage_pct: f64,
}

impl Summary {
    /// Computes the summary of a resolved graph.
    #[must_use]
    pub fn of(graph: &LinkGraph) -> Self {
        let requirements_total = graph.requirements().len();
        let requirements_linked = graph
            .requirements()
            .iter()
            .filter(|r| r.status.is_linked())
            .count();
        let tests_total = graph.tests().len();
        let tests_linked = graph.tests().iter().filter(|t| t.status.is_linked()).count();

        Self {
            requirements_total,
            tests_total,
            links_total: graph.links().len(),
            requirements_linked,
            requirements_unlinked: requirements_total - requirements_linked,
            tests_linked,
            tests_unlinked: tests_total - tests_linked,
            coverage_pct: coverage_pct(requirements_linked, requirements_total),
        }
    }
}

/// `100 * linked / total` as an `f64`, rounded to one decimal place.
///
/// Rounding looks at the exact value of that `f64`, so `0.05` (stored as
/// slightly more than `0.05`) rounds up. Only exact ties such as `6.25` go to
/// the even neighbour. Defined as `0.0` when there is nothing to cover.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn coverage_pct(linked: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = 100.0 * linked as f64 / total as f64;

    // The result is `tenths` or `tenths + 1`, split at `midpoint / 20`.
    let tenths = 1000 * linked / total;
    let midpoint = (2 * tenths + 1) as f64;
    // `pct * 20 - midpoint` with a single rounding keeps the exact sign.
    let side = pct.mul_add(20.0, -midpoint);

    let round_up = match side.partial_cmp(&0.0) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => tenths % 2 == 1,
        _ => false,
    };
    let rounded = if round_up { tenths + 1 } else { tenths };
    rounded as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{Requirement, Test};

    #[test_case(0, 0, 0.0; "no requirements")]
    #[test_case(0, 4, 0.0; "none linked")]
    #[test_case(4, 4, 100.0; "all linked")]
    #[test_case(1, 3, 33.3; "one third")]
    #[test_case(2, 3, 66.7; "two thirds")]
    #[test_case(1, 16, 6.2; "tie rounds to even")]
    #[test_case(7, 8, 87.5; "exact tenth")]
    #[test_case(1, 2000, 0.1; "stored value above the tie rounds up")]
    #[test_case(3, 2000, 0.1; "stored value below the tie rounds down")]
    #[test_case(1999, 2000, 100.0; "rounds up to whole")]
    fn percentage(linked: usize, total: usize, expected: f64) {
        assert!((coverage_pct(linked, total) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_counts() {
        let requirements = ["R1", "R2", "R3"]
            .into_iter()
            .map(|id| Requirement {
                id: id.to_string(),
                text: String::new(),
                declared_links: Vec::new(),
                source_path: format!("{id}.yml"),
            })
            .collect();
        let tests = vec![
            Test {
                id: "T1".to_string(),
                text: String::new(),
                declared_links: vec!["R1".to_string(), "R2".to_string()],
                source_path: "T1.yml".to_string(),
                references: Vec::new(),
            },
            Test {
                id: "T2".to_string(),
                text: String::new(),
                declared_links: vec!["R404".to_string()],
                source_path: "T2.yml".to_string(),
                references: Vec::new(),
            },
        ];
        let graph = LinkGraph::resolve(requirements, tests).unwrap();

        assert_eq!(
            Summary::of(&graph),
            Summary {
                requirements_total: 3,
                tests_total: 2,
                links_total: 2,
                requirements_linked: 2,
                requirements_unlinked: 1,
                tests_linked: 1,
                tests_unlinked: 1,
                coverage_pct: 66.7,
            }
        );
    }

    #[test]
    fn empty_graph_has_zero_coverage() {
        let summary = Summary::of(&LinkGraph::default());
        assert_eq!(summary.requirements_total, 0);
        assert!(summary.coverage_pct.abs() < f64::EPSILON);
    }
}
