//! Self-contained HTML report.
//!
//! The payload is embedded as JSON in a `<script type="application/json">`
//! element and rendered client-side, so the page needs no server and no
//! network access.

use crate::domain::Payload;

const TEMPLATE: &str = include_str!("template.html");

/// Heading text for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page title.
    pub title: String,
    /// Line shown under the title.
    pub subtitle: String,
}

/// Renders the payload into a complete HTML document.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialised.
pub fn render(payload: &Payload, page: &Page) -> serde_json::Result<String> {
    // `</` would let a string inside the JSON close the script element.
    let data = serde_json::to_string(payload)?.replace("</", "<\\/");

    Ok(TEMPLATE
        .replace("{{title}}", &escape(&page.title))
        .replace("{{subtitle}}", &escape(&page.subtitle))
        .replace("{{source_root}}", &escape(&payload.source_root))
        .replace("{{generated_at}}", &escape(&payload.generated_at))
        .replace("{{data}}", &data))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
