use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use tracing::instrument;
use traceaudit::{
    report::html::{self, Page},
    Audit, Payload,
};

/// The report location used when `--out` is not given, relative to the root.
const DEFAULT_OUTPUT: &str = "visual/traceability_audit.html";

#[derive(Debug, Parser, Default)]
#[command(about = "Write the HTML audit report")]
pub struct Report {
    /// Output HTML path (default: <root>/visual/traceability_audit.html)
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Report title (overrides the configured title)
    #[arg(long)]
    title: Option<String>,

    /// Report subtitle (overrides the configured subtitle)
    #[arg(long)]
    subtitle: Option<String>,
}

impl Report {
    #[instrument(level = "debug", skip(self, audit))]
    pub fn run(self, audit: &Audit) -> anyhow::Result<()> {
        let payload = audit.run()?;
        let out = self.output_path(audit.root());
        let page = Page {
            title: self.title.unwrap_or_else(|| audit.config().title.clone()),
            subtitle: self
                .subtitle
                .unwrap_or_else(|| audit.config().subtitle.clone()),
        };

        write_report(&payload, &page, &out)?;

        println!("Wrote {}", out.display());
        Ok(())
    }

    fn output_path(&self, root: &Path) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_OUTPUT))
    }
}

fn write_report(payload: &Payload, page: &Page, out: &Path) -> anyhow::Result<()> {
    let document = html::render(payload, page).context("Failed to render report")?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(out, document).with_context(|| format!("Failed to write {}", out.display()))?;

    tracing::info!(
        "Report covers {} requirements and {} tests",
        payload.summary.requirements_total,
        payload.summary.tests_total
    );
    Ok(())
}
