//! Styling for coverage output on the terminal

use owo_colors::{colors::css, OwoColorize};
use traceaudit::Summary;

/// How a piece of status output should read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Coverage is where it should be (green).
    Good,
    /// Coverage needs attention (amber).
    Attention,
    /// Secondary detail such as paths and rules (dimmed).
    Quiet,
}

impl Tone {
    /// The tone for a coverage summary.
    ///
    /// With a threshold, coverage at or above it is good. Without one, only
    /// full coverage is.
    pub fn for_coverage(summary: &Summary, threshold: Option<f64>) -> Self {
        let good = threshold.map_or(summary.requirements_unlinked == 0, |threshold| {
            summary.coverage_pct >= threshold
        });
        if good { Self::Good } else { Self::Attention }
    }

    /// The marker printed after a coverage figure.
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Good => "✅",
            Self::Attention => "⚠️",
            Self::Quiet => "",
        }
    }

    /// Styles `text`, or returns it unchanged when stdout has no colour
    /// support.
    pub fn paint(self, text: &str) -> String {
        if supports_color::on(supports_color::Stream::Stdout).is_none() {
            return text.to_string();
        }
        match self {
            Self::Good => text.fg::<css::Green>().to_string(),
            Self::Attention => text.fg::<css::Orange>().to_string(),
            Self::Quiet => text.dimmed().to_string(),
        }
    }
}

/// Whether the terminal is too narrow for the tabular layout (< 60 columns).
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < 60)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn summary(unlinked: usize, coverage_pct: f64) -> Summary {
        Summary {
            requirements_total: 10,
            tests_total: 10,
            links_total: 10 - unlinked,
            requirements_linked: 10 - unlinked,
            requirements_unlinked: unlinked,
            tests_linked: 10,
            tests_unlinked: 0,
            coverage_pct,
        }
    }

    #[test_case(0, 100.0, None, Tone::Good; "full coverage")]
    #[test_case(1, 90.0, None, Tone::Attention; "gap without threshold")]
    #[test_case(1, 90.0, Some(90.0), Tone::Good; "meets threshold")]
    #[test_case(2, 80.0, Some(90.0), Tone::Attention; "below threshold")]
    fn coverage_tone(unlinked: usize, pct: f64, threshold: Option<f64>, expected: Tone) {
        assert_eq!(Tone::for_coverage(&summary(unlinked, pct), threshold), expected);
    }

    #[test]
    fn painting_keeps_the_text() {
        assert!(Tone::Quiet.paint("reqs/mon/R1.yml").contains("reqs/mon/R1.yml"));
    }
}
