use std::process;

use clap::Parser;
use tracing::instrument;
use traceaudit::{Audit, LinkGraph, Summary};

use super::terminal::{is_narrow, Tone};

#[derive(Debug, Parser, Default)]
#[command(about = "Show coverage counts and unlinked requirements")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,

    /// Exit with code 2 if coverage is below this percentage
    #[arg(long, value_name = "PCT")]
    fail_under: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Status {
    #[instrument(level = "debug", skip(self, audit))]
    pub fn run(self, audit: &Audit) -> anyhow::Result<()> {
        let graph = audit.resolve()?;
        let summary = Summary::of(&graph);

        match self.output {
            OutputFormat::Json => Self::output_json(&summary, &graph)?,
            OutputFormat::Table => {
                if self.quiet {
                    Self::output_quiet(&summary);
                } else {
                    Self::output_table(&summary, &graph, self.fail_under);
                }
            }
        }

        if self.below_threshold(&summary) {
            process::exit(2);
        }

        Ok(())
    }

    fn below_threshold(&self, summary: &Summary) -> bool {
        self.fail_under
            .is_some_and(|threshold| summary.coverage_pct < threshold)
    }

    fn output_json(summary: &Summary, graph: &LinkGraph) -> anyhow::Result<()> {
        use serde_json::json;

        let unlinked: Vec<_> = graph
            .unlinked_requirements()
            .map(|r| r.requirement.id.as_str())
            .collect();

        let output = json!({
            "summary": summary,
            "unlinked_requirements": unlinked,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_quiet(summary: &Summary) {
        println!(
            "requirements={} tests={} links={} coverage={}",
            summary.requirements_total, summary.tests_total, summary.links_total, summary.coverage_pct
        );
    }

    fn output_table(summary: &Summary, graph: &LinkGraph, threshold: Option<f64>) {
        const MAX_UNLINKED_DISPLAY: usize = 10;

        if summary.requirements_total == 0 {
            println!("No requirements found.");
            return;
        }

        println!("Traceability");
        println!("{}", Tone::Quiet.paint("────────────"));

        let rows = [
            ("Requirements", summary.requirements_total, summary.requirements_linked),
            ("Tests", summary.tests_total, summary.tests_linked),
        ];
        if is_narrow() {
            for (label, total, linked) in rows {
                println!("{label}: {total} ({linked} linked)");
            }
        } else {
            println!("{:<14} {:<7} {:<7} Unlinked", "", "Total", "Linked");
            for (label, total, linked) in rows {
                println!("{label:<14} {total:<7} {linked:<7} {}", total - linked);
            }
        }
        println!("Links: {}", summary.links_total);

        println!();

        let tone = Tone::for_coverage(summary, threshold);
        let coverage = format!("{:.1}%", summary.coverage_pct);
        match threshold {
            Some(threshold) => println!(
                "Coverage: {} {} (threshold {threshold:.1}%)",
                tone.paint(&coverage),
                tone.marker()
            ),
            None => println!("Coverage: {} {}", tone.paint(&coverage), tone.marker()),
        }

        for requirement in graph.unlinked_requirements().take(MAX_UNLINKED_DISPLAY) {
            println!(
                "  • {} {}",
                requirement.requirement.id,
                Tone::Quiet.paint(&requirement.requirement.source_path)
            );
        }
        if summary.requirements_unlinked > MAX_UNLINKED_DISPLAY {
            println!(
                "  • ... and {} more",
                summary.requirements_unlinked - MAX_UNLINKED_DISPLAY
            );
        }
    }
}
