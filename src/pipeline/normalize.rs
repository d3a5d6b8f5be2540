//! Normalization: turn heterogeneous page records into plain text.
//!
//! ## Why normalize at all?
//!
//! Depending on the model and request options, the OCR service returns page
//! content as ready-made Markdown, as recognised line lists, as paragraph
//! lists, or as layout blocks (some of them tables). Downstream stages want
//! exactly one thing: a single text string per page. This module applies the
//! fixed-priority classification from [`crate::response::PageContent`] and
//! renders whichever shape won into that string.
//!
//! Guarantees:
//! * output length always equals input page count — pages are never dropped
//!   or merged, and order is preserved;
//! * exactly one extraction strategy is applied per page;
//! * a malformed page degrades to an empty page carrying a warning — one bad
//!   page never aborts the conversion;
//! * inline image embeds are stripped (text-only mode) and line endings are
//!   normalised to LF.

use crate::error::ConversionWarning;
use crate::output::NormalizedPage;
use crate::response::{Block, PageContent};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Normalize all pages of an OCR response, in order.
pub fn normalize(pages: &[Value]) -> Vec<NormalizedPage> {
    pages
        .iter()
        .enumerate()
        .map(|(idx, page)| normalize_page(idx + 1, page))
        .collect()
}

/// Normalize a single page. Never fails: malformed structure degrades to an
/// empty page with a warning attached.
fn normalize_page(page_num: usize, page: &Value) -> NormalizedPage {
    match PageContent::from_value(page) {
        Ok(content) => NormalizedPage {
            page_num,
            text: render_content(&content),
            warning: None,
        },
        Err(detail) => {
            warn!("Page {page_num}: {detail} — emitting empty page");
            NormalizedPage {
                page_num,
                text: String::new(),
                warning: Some(ConversionWarning::MalformedPage {
                    page: page_num,
                    detail,
                }),
            }
        }
    }
}

/// Render a classified page to its normalized text.
fn render_content(content: &PageContent) -> String {
    let raw = match content {
        PageContent::Markdown(s) => s.clone(),
        PageContent::Lines(lines) => lines.join("\n"),
        PageContent::Paragraphs(paras) => paras.join("\n\n"),
        PageContent::Blocks(blocks) => blocks
            .iter()
            .map(render_block)
            .collect::<Vec<_>>()
            .join("\n\n"),
        PageContent::Empty => String::new(),
    };
    clean_text(&raw)
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Table(rows) => render_table(rows),
        Block::Text(parts) => parts.join("\n\n"),
    }
}

/// Render tabular rows as a GFM pipe table: header row, dash separator,
/// body rows. Ragged rows are padded to the widest row so every line has
/// the same column count.
fn render_table(rows: &[Vec<String>]) -> String {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return String::new();
    }

    let mut out = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<String> = (0..cols)
            .map(|c| escape_cell(row.get(c).map(String::as_str).unwrap_or("")))
            .collect();
        out.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            out.push(format!("|{}", " --- |".repeat(cols)));
        }
    }
    out.join("\n")
}

/// Pipes inside cell text would shift columns; escape them.
fn escape_cell(cell: &str) -> String {
    cell.trim().replace('|', "\\|").replace('\n', " ")
}

// ── Text cleanup ─────────────────────────────────────────────────────────

static RE_IMAGE_EMBED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());

/// Cleanup applied to every extracted page text:
/// 1. Strip inline image embeds (`![alt](url)`) — text-only mode, the
///    surrounding text is kept intact.
/// 2. Normalise line endings (CRLF/CR → LF).
/// 3. Trim trailing whitespace per line and surrounding blank lines.
fn clean_text(input: &str) -> String {
    let s = RE_IMAGE_EMBED.replace_all(input, "");
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    s.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn length_always_equals_page_count() {
        for n in 0..5 {
            let pages: Vec<Value> = (0..n).map(|i| json!({"markdown": format!("p{i}")})).collect();
            assert_eq!(normalize(&pages).len(), n);
        }
    }

    #[test]
    fn markdown_used_verbatim() {
        let pages = vec![json!({"markdown_text": "# Title\n\nBody"})];
        assert_eq!(normalize(&pages)[0].text, "# Title\n\nBody");
    }

    #[test]
    fn lines_joined_with_newlines() {
        let pages = vec![json!({"lines": ["A", "B", "C"]})];
        assert_eq!(normalize(&pages)[0].text, "A\nB\nC");
    }

    #[test]
    fn paragraphs_joined_with_blank_lines() {
        let pages = vec![json!({"paragraphs": ["First.", "Second."]})];
        assert_eq!(normalize(&pages)[0].text, "First.\n\nSecond.");
    }

    #[test]
    fn table_block_renders_pipe_table() {
        let pages = vec![json!({"blocks": [
            {"rows": [["Name", "Qty"], ["Bolt", 4], ["Nut", 9]]}
        ]})];
        let text = &normalize(&pages)[0].text;
        assert_eq!(
            text,
            "| Name | Qty |\n| --- | --- |\n| Bolt | 4 |\n| Nut | 9 |"
        );
    }

    #[test]
    fn ragged_table_rows_are_padded() {
        let rows = vec![
            vec!["A".to_string(), "B".to_string()],
            vec!["only-one".to_string()],
        ];
        let text = render_table(&rows);
        assert_eq!(text, "| A | B |\n| --- | --- |\n| only-one |  |");
    }

    #[test]
    fn cell_pipes_escaped() {
        assert_eq!(escape_cell("a|b"), "a\\|b");
    }

    #[test]
    fn text_blocks_joined_with_blank_lines() {
        let pages = vec![json!({"blocks": ["one", {"text": "two"}]})];
        assert_eq!(normalize(&pages)[0].text, "one\n\ntwo");
    }

    #[test]
    fn image_embeds_stripped_text_intact() {
        let pages = vec![json!({"markdown": "Before ![fig 1](img-0.jpeg) after"})];
        assert_eq!(normalize(&pages)[0].text, "Before  after");
    }

    #[test]
    fn crlf_normalised() {
        let pages = vec![json!({"markdown": "a\r\nb\rc"})];
        assert_eq!(normalize(&pages)[0].text, "a\nb\nc");
    }

    #[test]
    fn absent_fields_yield_empty_page_without_warning() {
        let pages = vec![json!({"index": 0})];
        let out = normalize(&pages);
        assert_eq!(out[0].text, "");
        assert!(out[0].warning.is_none());
    }

    #[test]
    fn malformed_page_degrades_with_warning() {
        let pages = vec![
            json!({"markdown": "good"}),
            json!({"lines": 42}),
            json!({"markdown": "also good"}),
        ];
        let out = normalize(&pages);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].text, "good");
        assert_eq!(out[1].text, "");
        assert!(out[1].warning.is_some());
        assert_eq!(out[2].text, "also good");
    }

    #[test]
    fn page_numbers_are_one_indexed_in_order() {
        let pages = vec![json!({"markdown": "a"}), json!({"markdown": "b"})];
        let nums: Vec<usize> = normalize(&pages).iter().map(|p| p.page_num).collect();
        assert_eq!(nums, vec![1, 2]);
    }
}
