use std::path::{Path, PathBuf};

mod export;
mod init;
mod report;
mod status;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use export::Export;
use report::Report;
use status::Status;
use traceaudit::Audit;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the project
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(flatten)]
    sources: Sources,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("Project root not found: {}", self.root.display()))?;

        self.command
            .unwrap_or_else(|| Command::Report(Report::default()))
            .run(&root, self.sources)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Overrides for the directories named in `.trace-audit.toml`.
#[derive(Debug, Default, clap::Args)]
struct Sources {
    /// Requirement item directory, relative to the root (repeatable)
    #[arg(long = "req-dir", value_name = "DIR", global = true)]
    req_dirs: Vec<String>,

    /// Test item directory, relative to the root (repeatable)
    #[arg(long = "test-dir", value_name = "DIR", global = true)]
    test_dirs: Vec<String>,

    /// Directory to scan for HODOR annotations, relative to the root
    /// (repeatable)
    #[arg(long = "test-scan-dir", value_name = "DIR", global = true)]
    scan_dirs: Vec<String>,

    /// Label shown in reports in place of the project root
    #[arg(long, value_name = "LABEL", global = true)]
    display_root: Option<String>,
}

impl Sources {
    fn open(self, root: &Path) -> anyhow::Result<Audit> {
        let mut audit = Audit::open(root.to_path_buf())?;
        let config = audit.config_mut();

        if !self.req_dirs.is_empty() {
            config.requirement_dirs = self.req_dirs;
        }
        if !self.test_dirs.is_empty() {
            config.test_dirs = self.test_dirs;
        }
        if !self.scan_dirs.is_empty() {
            config.scan_dirs = self.scan_dirs;
        }
        if let Some(display_root) = self.display_root {
            config.display_root = display_root;
        }

        Ok(audit)
    }
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// Write the HTML audit report (default)
    Report(Report),

    /// Write the audit payload as JSON or the link set as CSV
    Export(Export),

    /// Show coverage counts and unlinked requirements
    Status(Status),

    /// Write a default `.trace-audit.toml`
    Init(init::Command),
}

impl Command {
    fn run(self, root: &Path, sources: Sources) -> anyhow::Result<()> {
        match self {
            Self::Report(command) => command.run(&sources.open(root)?)?,
            Self::Export(command) => command.run(&sources.open(root)?)?,
            Self::Status(command) => command.run(&sources.open(root)?)?,
            Self::Init(command) => command.run(root)?,
        }
        Ok(())
    }
}
