use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use tracing::instrument;
use traceaudit::{report, Audit, Payload};

#[derive(Debug, Parser, Default)]
#[command(about = "Write the audit payload as JSON or the link set as CSV")]
pub struct Export {
    /// Export format
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    format: Format,

    /// Output path (default: stdout)
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Format {
    /// The full payload, pretty-printed
    #[default]
    Json,
    /// One `requirement_id,test_id` row per link
    Csv,
}

impl Export {
    #[instrument(level = "debug", skip(self, audit))]
    pub fn run(self, audit: &Audit) -> anyhow::Result<()> {
        let payload = audit.run()?;

        let mut writer: Box<dyn Write> = match &self.out {
            Some(path) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
            )),
            None => Box::new(io::stdout().lock()),
        };

        self.format.write(&payload, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl Format {
    fn write(self, payload: &Payload, writer: &mut dyn Write) -> anyhow::Result<()> {
        match self {
            Self::Json => {
                let json = report::to_json(payload)?;
                writeln!(writer, "{json}")?;
            }
            Self::Csv => report::write_links_csv(&payload.links, writer)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;
    use traceaudit::Config;

    use super::*;

    fn project() -> (tempfile::TempDir, Audit) {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("reqs/mon")).unwrap();
        fs::create_dir_all(root.join("reqs/tst")).unwrap();
        fs::write(root.join("reqs/mon/R1.yml"), "text: one\n").unwrap();
        fs::write(root.join("reqs/mon/R2.yml"), "text: two\n").unwrap();
        fs::write(root.join("reqs/tst/T1.yml"), "links: [R2, R1]\n").unwrap();
        let audit = Audit::new(root.to_path_buf(), Config::default());
        (tmp, audit)
    }

    #[test]
    fn csv_lists_sorted_links() {
        let (tmp, audit) = project();
        let out = tmp.path().join("links.csv");

        Export {
            format: Format::Csv,
            out: Some(out.clone()),
        }
        .run(&audit)
        .unwrap();

        assert_eq!(
            fs::read_to_string(out).unwrap(),
            "requirement_id,test_id\nR1,T1\nR2,T1\n"
        );
    }

    #[test]
    fn json_is_the_full_payload() {
        let (tmp, audit) = project();
        let out = tmp.path().join("audit.json");

        Export {
            format: Format::Json,
            out: Some(out.clone()),
        }
        .run(&audit)
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(value["summary"]["links_total"], 2);
        assert_eq!(value["tests"][0]["reqs"], serde_json::json!(["R1", "R2"]));
        assert_eq!(value["tests"][0]["links"], serde_json::json!(["R2", "R1"]));
        assert_eq!(value["links"][0], serde_json::json!({"req": "R1", "test": "T1"}));
    }
}
