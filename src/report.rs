//! Rendering an audit [`Payload`] for people and other tools.
//!
//! - [`html`]: a self-contained interactive HTML page
//! - [`to_json`]: the payload as pretty-printed JSON
//! - [`write_links_csv`]: the link set as a two-column table

use std::io;

use crate::domain::{Link, Payload};

pub mod html;

/// The header row of the link export.
pub const LINKS_CSV_HEADER: [&str; 2] = ["requirement_id", "test_id"];

/// Serialises the payload as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialisation fails.
pub fn to_json(payload: &Payload) -> serde_json::Result<String> {
    serde_json::to_string_pretty(payload)
}

/// Writes one row per link, after a `requirement_id,test_id` header.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_links_csv<'a, W: io::Write>(
    links: impl IntoIterator<Item = &'a Link>,
    writer: W,
) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(LINKS_CSV_HEADER)?;
    for link in links {
        csv.write_record([&link.requirement, &link.test])?;
    }
    csv.flush()?;
    Ok(())
}
