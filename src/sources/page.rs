//! Page snapshot extraction strategy
//!
//! Recovers rendered file content from a captured GitHub page, trying a set
//! of markup patterns in order and returning the first that yields
//! non-trivial text. GitHub has shipped several generations of file-view
//! markup; each pattern targets one of them. A missing snapshot or a page
//! with none of the expected shapes is a non-match, never a failure.

use crate::resolver::{Purpose, Resource, Strategy, StrategyError};
use async_trait::async_trait;
use regex_lite::Regex;
use tracing::debug;

/// Extracted text shorter than this is markup noise, not file content
const MIN_CONTENT_LEN: usize = 10;

/// Snapshot extraction strategy
pub struct SnapshotExtraction {
    html: Option<String>,
}

impl SnapshotExtraction {
    /// Build the strategy over an optional captured page. `None` makes
    /// every fetch a non-match, which keeps the chain wiring uniform when
    /// the caller has no snapshot to offer.
    pub fn new(html: Option<String>) -> Self {
        Self { html }
    }

    fn extract(&self, html: &str) -> Option<String> {
        let patterns: [(&str, fn(&str) -> Option<String>); 3] = [
            ("raw-lines-payload", extract_raw_lines),
            ("data-code-text", extract_data_code_text),
            ("blob-code-cells", extract_blob_code_cells),
        ];

        for (name, pattern) in patterns {
            if let Some(content) = pattern(html) {
                let trimmed = content.trim();
                if trimmed.len() > MIN_CONTENT_LEN {
                    debug!(pattern = name, lines = trimmed.lines().count(), "Snapshot match");
                    return Some(trimmed.to_string());
                }
            }
        }

        None
    }
}

#[async_trait]
impl Strategy for SnapshotExtraction {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch(&self, resource: &Resource) -> Result<Option<String>, StrategyError> {
        // Only raw file content lives in the rendered page
        if resource.purpose != Purpose::FileContent {
            return Ok(None);
        }

        let Some(ref html) = self.html else {
            return Ok(None);
        };

        Ok(self.extract(html))
    }
}

/// The modern file view embeds the file as a `"rawLines"` JSON array inside
/// its React payload
fn extract_raw_lines(html: &str) -> Option<String> {
    let idx = html.find("\"rawLines\":")?;
    let rest = &html[idx + "\"rawLines\":".len()..];

    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Vec<String>>();
    match stream.next() {
        Some(Ok(lines)) if !lines.is_empty() => Some(lines.join("\n")),
        _ => None,
    }
}

/// Line-by-line `data-code-text` attributes (code search / some blob views)
fn extract_data_code_text(html: &str) -> Option<String> {
    let re = Regex::new(r#"data-code-text="([^"]*)""#).ok()?;
    let lines: Vec<String> = re
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| unescape_entities(m.as_str())))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Legacy `<td class="blob-code ...">` table cells
fn extract_blob_code_cells(html: &str) -> Option<String> {
    let cell = Regex::new(r#"(?s)<td[^>]*class="[^"]*blob-code[^"]*"[^>]*>(.*?)</td>"#).ok()?;
    let tag = Regex::new(r"<[^>]+>").ok()?;

    let lines: Vec<String> = cell
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| unescape_entities(&tag.replace_all(m.as_str(), "")))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Undo HTML attribute/body escaping for extracted code. `&amp;` last so an
/// already-escaped ampersand is not decoded twice.
fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
