//! Clarification board → [`ClarificationRecord`] extraction.
//!
//! The board is a table whose rows hold one clarification each. Fields are
//! read by cell position; the positions below are tied to the board layout
//! identified by [`LAYOUT_VERSION`] and are the only thing to touch when the
//! remote page changes shape.

use monitor_core::error::{MonitorError, Result};
use monitor_core::models::ClarificationRecord;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

// ── Board layout ──────────────────────────────────────────────────────────────

/// Revision of the cell layout the constants below describe.
pub const LAYOUT_VERSION: u32 = 1;

/// Problem title, linked to the problem page.
pub const CELL_PROBLEM: usize = 0;
/// Asker handle, linked to the profile page.
pub const CELL_USER: usize = 1;
pub const CELL_QUESTION: usize = 2;
pub const CELL_RESPONSE: usize = 3;
pub const CELL_PUBLIC: usize = 4;
/// Reply/edit action; the link's last path segment is the record id.
pub const CELL_REPLY: usize = 7;

const ROW_SELECTOR: &str = "tbody tr";
const CELL_SELECTOR: &str = "td";
const LINK_SELECTOR: &str = "a";

// ── RecordExtractor ───────────────────────────────────────────────────────────

/// Parses clarification board documents.
pub struct RecordExtractor {
    /// Prefix for relative links, without a trailing slash.
    base_url: String,
    rows: Selector,
    cells: Selector,
    link: Selector,
}

impl RecordExtractor {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            rows: parse_selector(ROW_SELECTOR)?,
            cells: parse_selector(CELL_SELECTOR)?,
            link: parse_selector(LINK_SELECTOR)?,
        })
    }

    /// Extract every row of `document`, in document order.
    ///
    /// Rows whose reply link is missing come back with an empty `id`; it is
    /// up to the caller to skip them. A document without rows yields an
    /// empty vector.
    pub fn extract(&self, document: &str) -> Result<Vec<ClarificationRecord>> {
        if document.trim().is_empty() {
            return Err(MonitorError::Parse("empty document".to_string()));
        }

        let html = Html::parse_document(document);
        if !html.errors.is_empty() {
            debug!(count = html.errors.len(), "board markup had recoverable errors");
        }

        let records: Vec<ClarificationRecord> = html
            .select(&self.rows)
            .map(|row| self.extract_row(row))
            .collect();

        debug!(rows = records.len(), "extracted clarification rows");
        Ok(records)
    }

    fn extract_row(&self, row: ElementRef<'_>) -> ClarificationRecord {
        let mut record = ClarificationRecord::default();

        for (index, cell) in row.select(&self.cells).enumerate() {
            match index {
                CELL_PROBLEM => {
                    record.problem_title = cell_text(cell);
                    if let Some(href) = self.first_href(cell) {
                        record.problem_url = self.absolute(href);
                    }
                }
                CELL_USER => {
                    record.user_id = cell_text(cell);
                    if let Some(href) = self.first_href(cell) {
                        record.user_url = self.absolute(href);
                    }
                }
                CELL_QUESTION => record.clarification_text = cell_text(cell),
                CELL_RESPONSE => record.response_text = cell_text(cell),
                CELL_PUBLIC => record.is_public = cell_text(cell),
                CELL_REPLY => {
                    if let Some(href) = self.first_href(cell) {
                        record.reply_url = self.absolute(href);
                        if let Some(id) = id_from_link(href) {
                            record.id = id.to_string();
                        }
                    }
                }
                _ => {}
            }
        }

        record
    }

    fn first_href<'a>(&self, cell: ElementRef<'a>) -> Option<&'a str> {
        cell.select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
    }

    /// Resolve a link from the board against the contest root.
    fn absolute(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| MonitorError::Parse(format!("bad selector '{selector}': {e}")))
}

/// Concatenated text of a cell with surrounding whitespace removed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// The path segment after the last `/` of a link, ignoring query and fragment.
///
/// Returns `None` when the path has no `/` or ends with one.
pub fn id_from_link(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or("");
    let slash = path.rfind('/')?;
    let segment = &path[slash + 1..];
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://abc300.contest.example";

    fn extractor() -> RecordExtractor {
        RecordExtractor::new(BASE).expect("selectors")
    }

    /// Wrap rows in a page shaped like the real board.
    fn board(rows: &str) -> String {
        format!(
            "<html><body><table class=\"table\">\
             <thead><tr><th>Task</th><th>User</th><th>Question</th><th>Answer</th>\
             <th>Public</th><th>Created</th><th>Updated</th><th></th></tr></thead>\
             <tbody>{rows}</tbody></table></body></html>"
        )
    }

    fn row(reply_cell: &str) -> String {
        format!(
            "<tr>\
             <td><a href=\"/tasks/abc300_a\">A - N-choice question</a></td>\
             <td><a href=\"/users/alice\">alice</a></td>\
             <td>Can N be zero?</td>\
             <td>No.</td>\
             <td>Yes</td>\
             <td>2023-04-29 21:05</td>\
             <td>2023-04-29 21:07</td>\
             <td>{reply_cell}</td>\
             </tr>"
        )
    }

    // ── positional contract ───────────────────────────────────────────────────

    #[test]
    fn test_extract_reads_fields_by_position() {
        let doc = board(&row("<a href=\"/clars/123\">Reply</a>"));
        let records = extractor().extract(&doc).expect("extract");

        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.id, "123");
        assert_eq!(rec.problem_title, "A - N-choice question");
        assert_eq!(rec.problem_url, format!("{BASE}/tasks/abc300_a"));
        assert_eq!(rec.user_id, "alice");
        assert_eq!(rec.user_url, format!("{BASE}/users/alice"));
        assert_eq!(rec.clarification_text, "Can N be zero?");
        assert_eq!(rec.response_text, "No.");
        assert_eq!(rec.is_public, "Yes");
        assert_eq!(rec.reply_url, format!("{BASE}/clars/123"));
    }

    #[test]
    fn test_trailing_slash_link_yields_empty_id() {
        let doc = board(&row("<a href=\"/clars/\">Reply</a>"));
        let records = extractor().extract(&doc).expect("extract");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "");
        assert_eq!(records[0].reply_url, format!("{BASE}/clars/"));
    }

    #[test]
    fn test_row_without_reply_link_is_kept() {
        let doc = board(&row(""));
        let records = extractor().extract(&doc).expect("extract");

        assert_eq!(records.len(), 1);
        assert!(!records[0].is_identifiable());
        assert_eq!(records[0].reply_url, "");
        assert_eq!(records[0].user_id, "alice");
    }

    #[test]
    fn test_short_row_leaves_missing_fields_empty() {
        let doc = board("<tr><td>General</td><td>bob</td><td>Is this rated?</td></tr>");
        let records = extractor().extract(&doc).expect("extract");

        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.problem_title, "General");
        assert_eq!(rec.problem_url, "");
        assert_eq!(rec.user_url, "");
        assert_eq!(rec.clarification_text, "Is this rated?");
        assert_eq!(rec.response_text, "");
        assert_eq!(rec.id, "");
    }

    #[test]
    fn test_unanswered_row_has_empty_response() {
        let doc = board(
            "<tr><td></td><td>carol</td><td>Typo in sample 2?</td><td>  </td><td>No</td>\
             <td></td><td></td><td><a href=\"/clars/9\">Reply</a></td></tr>",
        );
        let records = extractor().extract(&doc).expect("extract");

        assert_eq!(records[0].id, "9");
        assert_eq!(records[0].problem_title, "");
        assert!(!records[0].is_answered());
    }

    #[test]
    fn test_preserves_document_order_and_duplicates() {
        let rows = [
            row("<a href=\"/clars/3\">Reply</a>"),
            row("<a href=\"/clars/1\">Reply</a>"),
            row("<a href=\"/clars/3\">Reply</a>"),
        ]
        .concat();
        let records = extractor().extract(&board(&rows)).expect("extract");

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "3"]);
    }

    #[test]
    fn test_cell_text_is_trimmed_and_flattened() {
        let doc = board(
            "<tr><td>\n  <a href=\"/tasks/b\">B - Grid</a>\n</td><td>dave</td>\
             <td>\n  Is <b>H</b> rows?\n</td><td></td><td></td><td></td><td></td>\
             <td><a href=\"/clars/5\">Reply</a></td></tr>",
        );
        let records = extractor().extract(&doc).expect("extract");

        assert_eq!(records[0].problem_title, "B - Grid");
        assert_eq!(records[0].clarification_text, "Is H rows?");
    }

    #[test]
    fn test_absolute_links_are_kept() {
        let doc = board(&row(
            "<a href=\"https://other.example/clarifications/reply/77\">Reply</a>",
        ));
        let records = extractor().extract(&doc).expect("extract");

        assert_eq!(records[0].id, "77");
        assert_eq!(
            records[0].reply_url,
            "https://other.example/clarifications/reply/77"
        );
    }

    // ── empty / malformed input ───────────────────────────────────────────────

    #[test]
    fn test_empty_board_yields_no_records() {
        let records = extractor().extract(&board("")).expect("extract");
        assert!(records.is_empty());
    }

    #[test]
    fn test_page_without_table_yields_no_records() {
        let records = extractor()
            .extract("<html><body><p>Sign in</p></body></html>")
            .expect("extract");
        assert!(records.is_empty());
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        let err = extractor().extract("  \n ").unwrap_err();
        assert!(matches!(err, MonitorError::Parse(_)));
    }

    // ── id_from_link ──────────────────────────────────────────────────────────

    #[test]
    fn test_id_from_link() {
        assert_eq!(id_from_link("/clars/123"), Some("123"));
        assert_eq!(id_from_link("/contests/x/clarifications/reply/8"), Some("8"));
        assert_eq!(id_from_link("/clars/"), None);
        assert_eq!(id_from_link("clars"), None);
        assert_eq!(id_from_link(""), None);
        assert_eq!(id_from_link("/clars/42?lang=en"), Some("42"));
        assert_eq!(id_from_link("/clars/42#answer"), Some("42"));
    }
}
