//! `trace-audit`: build traceability reports from requirement items and
//! in-source annotations.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
