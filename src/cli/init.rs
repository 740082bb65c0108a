use std::path::Path;

use tracing::instrument;
use traceaudit::domain::{Config, CONFIG_FILE};

#[derive(Debug, Default, clap::Parser)]
pub struct Command {
    /// Directories to scan for HODOR annotations, relative to the root
    #[arg(long = "scan-dir", value_name = "DIR")]
    scan_dirs: Vec<String>,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!("Already initialized (found existing {CONFIG_FILE})");
        }

        let mut config = Config::default();
        config.scan_dirs = self.scan_dirs;
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

        println!("Initialized traceability audit in {}", root.display());
        println!("  Created: {CONFIG_FILE}");
        println!();
        println!("Next steps:");
        println!(
            "  Add requirement items under {}",
            config.requirement_dirs.join(", ")
        );
        println!("  trace-audit report");

        Ok(())
    }
}
