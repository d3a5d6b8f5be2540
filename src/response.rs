//! OCR response data model: container unwrapping and per-page content shapes.
//!
//! The remote OCR service returns loosely-structured JSON whose envelope and
//! per-page fields vary between models and API versions. This module is the
//! single place where that looseness is tamed:
//!
//! * [`unwrap_pages`] locates the page sequence inside whatever envelope the
//!   service used (or synthesises one page from top-level text).
//! * [`PageContent`] is an explicit tagged union over the recognised page
//!   shapes, selected by a fixed priority order — never probed ad hoc at
//!   call sites.
//!
//! Everything here treats the input as untrusted: a page that matches no
//! recognised shape is reported as malformed (and later degraded to an empty
//! page), while a response with no page sequence at all is a fatal error.

use crate::error::Ocr2DocError;
use serde_json::Value;
use tracing::debug;

/// Envelope keys under which some API versions nest the actual result.
const CONTAINER_KEYS: &[&str] = &["result", "data", "response"];

/// Top-level text keys tried, in order, when the container has no pages.
const TOP_LEVEL_TEXT_KEYS: &[&str] = &["markdown", "full_text", "content", "text", "raw_text"];

/// Locate the ordered page sequence inside a raw OCR response.
///
/// Resolution order:
/// 1. `pages` on the response itself, or on one envelope level below
///    (`result`/`data`/`response`) — an array wins, even an empty one
///    (zero pages is a valid edge case, not an error).
/// 2. Top-level text under `markdown`/`full_text`/`content`/`text`/
///    `raw_text` — synthesised into a single markdown page.
///
/// # Errors
/// [`Ocr2DocError::FatalInput`] when `pages` is present but not an array, or
/// when neither pages nor usable top-level text exist.
pub fn unwrap_pages(response: &Value) -> Result<Vec<Value>, Ocr2DocError> {
    let container = unwrap_container(response);

    match container.get("pages") {
        Some(Value::Array(pages)) => {
            debug!("Found {} pages in OCR response", pages.len());
            Ok(pages.clone())
        }
        Some(other) => Err(Ocr2DocError::FatalInput {
            detail: format!("'pages' is {}, not an array", type_name(other)),
        }),
        None => {
            // Some responses carry the whole document as one top-level text
            // field instead of a page list.
            for key in TOP_LEVEL_TEXT_KEYS {
                if let Some(Value::String(s)) = container.get(*key) {
                    if !s.trim().is_empty() {
                        debug!("No pages; synthesising one page from top-level '{key}'");
                        return Ok(vec![serde_json::json!({ "markdown": s })]);
                    }
                }
            }
            Err(Ocr2DocError::FatalInput {
                detail: "no 'pages' array and no usable top-level text".into(),
            })
        }
    }
}

/// Descend one envelope level if the pages live under `result`/`data`/…
fn unwrap_container(response: &Value) -> &Value {
    if response.get("pages").is_some() {
        return response;
    }
    for key in CONTAINER_KEYS {
        if let Some(inner @ Value::Object(_)) = response.get(*key) {
            if inner.get("pages").is_some() || TOP_LEVEL_TEXT_KEYS.iter().any(|k| inner.get(*k).is_some()) {
                return inner;
            }
        }
    }
    response
}

/// The recognised shapes of one page, in strict extraction priority.
///
/// Exactly one variant is selected per page: the first field that is present
/// and non-empty wins. A page with none of the fields is [`Self::Empty`]
/// (valid, not an error).
#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    /// `markdown_text` (aliases: `markdown`, `text`) — used verbatim.
    Markdown(String),
    /// `lines` — joined with newline separators.
    Lines(Vec<String>),
    /// `paragraphs` — joined with blank-line separators.
    Paragraphs(Vec<String>),
    /// `blocks` — tables rendered as pipe tables, text blocks joined with
    /// blank lines.
    Blocks(Vec<Block>),
    /// No recognised field present.
    Empty,
}

/// One entry of a page's `blocks` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A table-like block structured as rows of cells.
    Table(Vec<Vec<String>>),
    /// A plain text block (one or more text fragments).
    Text(Vec<String>),
}

impl PageContent {
    /// Classify a raw page value into its extraction strategy.
    ///
    /// Priority: markdown text → lines → paragraphs → blocks → empty.
    /// A field that is present but empty does not win; the next strategy is
    /// tried. A field that is present with the wrong type makes the whole
    /// page malformed (`Err` carries the detail for the warning).
    pub fn from_value(page: &Value) -> Result<PageContent, String> {
        let obj = match page {
            Value::Object(map) => map,
            other => return Err(format!("page is {}, not an object", type_name(other))),
        };

        for key in ["markdown_text", "markdown", "text"] {
            match obj.get(key) {
                Some(Value::String(s)) => {
                    if !s.trim().is_empty() {
                        return Ok(PageContent::Markdown(s.clone()));
                    }
                }
                Some(other) => {
                    return Err(format!("'{key}' is {}, not a string", type_name(other)))
                }
                None => {}
            }
        }

        if let Some(v) = obj.get("lines") {
            let lines = string_seq(v).map_err(|e| format!("'lines' {e}"))?;
            if lines.iter().any(|l| !l.trim().is_empty()) {
                return Ok(PageContent::Lines(lines));
            }
        }

        if let Some(v) = obj.get("paragraphs") {
            let paras = string_seq(v).map_err(|e| format!("'paragraphs' {e}"))?;
            if paras.iter().any(|p| !p.trim().is_empty()) {
                return Ok(PageContent::Paragraphs(paras));
            }
        }

        if let Some(v) = obj.get("blocks") {
            let blocks = block_seq(v)?;
            if !blocks.is_empty() {
                return Ok(PageContent::Blocks(blocks));
            }
        }

        Ok(PageContent::Empty)
    }
}

/// Accept an array of strings, or of objects carrying a string `text` field.
fn string_seq(v: &Value) -> Result<Vec<String>, String> {
    let arr = match v {
        Value::Array(a) => a,
        other => return Err(format!("is {}, not an array", type_name(other))),
    };
    arr.iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Object(map) => match map.get("text") {
                Some(Value::String(s)) => Ok(s.clone()),
                _ => Err("contains an object without a string 'text' field".to_string()),
            },
            other => Err(format!("contains {}, expected strings", type_name(other))),
        })
        .collect()
}

/// Parse the `blocks` array: strings and text objects become text blocks,
/// objects with a `rows` field become table blocks.
fn block_seq(v: &Value) -> Result<Vec<Block>, String> {
    let arr = match v {
        Value::Array(a) => a,
        other => return Err(format!("'blocks' is {}, not an array", type_name(other))),
    };

    let mut blocks = Vec::with_capacity(arr.len());
    for (i, item) in arr.iter().enumerate() {
        let block = match item {
            Value::String(s) => Block::Text(vec![s.clone()]),
            Value::Object(map) => {
                if let Some(rows) = map.get("rows") {
                    Block::Table(table_rows(rows).map_err(|e| format!("block {i}: {e}"))?)
                } else if let Some(v) = map.get("lines").or_else(|| map.get("paragraphs")) {
                    Block::Text(string_seq(v).map_err(|e| format!("block {i} {e}"))?)
                } else if let Some(Value::String(s)) = map.get("text") {
                    Block::Text(vec![s.clone()])
                } else {
                    return Err(format!("block {i} has no 'rows', 'lines', or 'text'"));
                }
            }
            other => return Err(format!("block {i} is {}, expected string or object", type_name(other))),
        };
        // Drop blocks that carry no content at all; empty cells inside a
        // table row are preserved (they are positional).
        let keep = match &block {
            Block::Table(rows) => !rows.is_empty(),
            Block::Text(parts) => parts.iter().any(|p| !p.trim().is_empty()),
        };
        if keep {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

/// Parse table rows: an array of arrays of scalar cells.
fn table_rows(v: &Value) -> Result<Vec<Vec<String>>, String> {
    let arr = match v {
        Value::Array(a) => a,
        other => return Err(format!("'rows' is {}, not an array", type_name(other))),
    };
    arr.iter()
        .map(|row| match row {
            Value::Array(cells) => cells.iter().map(cell_text).collect(),
            other => Err(format!("row is {}, not an array", type_name(other))),
        })
        .collect()
}

/// Render one table cell. OCR tables routinely mix strings and numbers.
fn cell_text(cell: &Value) -> Result<String, String> {
    match cell {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(format!("cell is {}, expected a scalar", type_name(other))),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwrap_direct_pages() {
        let resp = json!({"pages": [{"markdown": "hi"}]});
        assert_eq!(unwrap_pages(&resp).unwrap().len(), 1);
    }

    #[test]
    fn unwrap_nested_container() {
        let resp = json!({"result": {"pages": [{"markdown": "a"}, {"markdown": "b"}]}});
        assert_eq!(unwrap_pages(&resp).unwrap().len(), 2);
    }

    #[test]
    fn unwrap_empty_pages_is_valid() {
        let resp = json!({"pages": []});
        assert!(unwrap_pages(&resp).unwrap().is_empty());
    }

    #[test]
    fn unwrap_top_level_text_fallback() {
        let resp = json!({"full_text": "whole document"});
        let pages = unwrap_pages(&resp).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0]["markdown"], "whole document");
    }

    #[test]
    fn unwrap_rejects_non_array_pages() {
        let resp = json!({"pages": "oops"});
        let err = unwrap_pages(&resp).unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn unwrap_rejects_unusable_response() {
        let resp = json!({"status": "ok"});
        assert!(unwrap_pages(&resp).is_err());
    }

    #[test]
    fn priority_markdown_beats_paragraphs() {
        let page = json!({"markdown_text": "# MD", "paragraphs": ["ignored"]});
        assert_eq!(
            PageContent::from_value(&page).unwrap(),
            PageContent::Markdown("# MD".into())
        );
    }

    #[test]
    fn priority_empty_markdown_falls_through_to_lines() {
        let page = json!({"markdown": "   ", "lines": ["A", "B"]});
        assert_eq!(
            PageContent::from_value(&page).unwrap(),
            PageContent::Lines(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn lines_accept_text_objects() {
        let page = json!({"lines": [{"text": "A"}, {"text": "B"}]});
        assert_eq!(
            PageContent::from_value(&page).unwrap(),
            PageContent::Lines(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn blocks_mix_tables_and_text() {
        let page = json!({"blocks": [
            {"rows": [["H1", "H2"], ["a", 1]]},
            "trailing note",
        ]});
        let content = PageContent::from_value(&page).unwrap();
        match content {
            PageContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2);
                assert_eq!(
                    blocks[0],
                    Block::Table(vec![
                        vec!["H1".into(), "H2".into()],
                        vec!["a".into(), "1".into()],
                    ])
                );
                assert_eq!(blocks[1], Block::Text(vec!["trailing note".into()]));
            }
            other => panic!("expected blocks, got {other:?}"),
        }
    }

    #[test]
    fn no_fields_is_empty_not_error() {
        let page = json!({"index": 3, "dpi": 150});
        assert_eq!(PageContent::from_value(&page).unwrap(), PageContent::Empty);
    }

    #[test]
    fn wrong_type_is_malformed() {
        let page = json!({"markdown_text": 42});
        let err = PageContent::from_value(&page).unwrap_err();
        assert!(err.contains("not a string"));

        let page = json!({"lines": "not-a-list"});
        assert!(PageContent::from_value(&page).is_err());

        let page = json!(["not", "an", "object"]);
        assert!(PageContent::from_value(&page).is_err());
    }
}
