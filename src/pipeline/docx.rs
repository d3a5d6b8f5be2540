//! Fallback DOCX renderer: manual document construction from Markdown.
//!
//! ## Why a hand-rolled Markdown subset?
//!
//! This is not a general Markdown parser and must never grow into one. The
//! assembler is the only producer of the input, so the grammar is closed:
//! headings, GFM pipe tables, the page-break sentinel, and plain paragraphs.
//! Parsing is a single pass over line classes (heading / table-header /
//! table-separator / table-row / pagebreak / blank / paragraph); anything
//! unrecognised — math syntax included — stays literal text. That narrowness
//! is what lets this path guarantee valid output when the external
//! converter is absent.
//!
//! The intermediate [`DocBlock`] representation is public so tests can
//! assert document structure without unzipping DOCX bytes.

use crate::error::Ocr2DocError;
use crate::pipeline::assemble::PAGE_BREAK_SENTINEL;
use docx_rs::{
    AlignmentType, BreakType, Docx, Paragraph, Run, RunFonts, Style, StyleType, Table,
    TableAlignmentType, TableCell, TableRow,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Cursor;

/// One block-level element of the parsed Markdown subset.
#[derive(Debug, Clone, PartialEq)]
pub enum DocBlock {
    /// `#`–`######` heading.
    Heading { level: usize, text: String },
    /// A single non-blank line of body text.
    Paragraph(String),
    /// A pipe table: header row, per-column alignment, body rows.
    Table {
        aligns: Vec<ColumnAlign>,
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// The page-break sentinel line.
    PageBreak,
}

/// Column alignment parsed from a GFM separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAlign {
    Left,
    Center,
    Right,
}

// ── Line classification ──────────────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(\S.*)$").unwrap());

pub(crate) fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 2
}

pub(crate) fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !is_table_row(trimmed) {
        return false;
    }
    trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| c == '|' || c == '-' || c == ':' || c == ' ')
}

/// Whether the document contains at least one well-formed pipe table
/// (a table row immediately followed by a separator row). Drives
/// [`crate::config::TablePolicy::PreferBuilder`].
pub(crate) fn contains_table(markdown: &str) -> bool {
    let lines: Vec<&str> = markdown.lines().collect();
    lines.windows(2).any(|w| {
        is_table_row(w[0]) && !is_separator_row(w[0]) && is_separator_row(w[1])
    })
}

/// Parse the Markdown subset into block-level elements.
///
/// Blank lines are collapsed (no empty paragraph per blank line); every
/// other non-blank line maps to exactly one block, except table blocks
/// which consume header + separator + body rows in one go.
pub fn parse_blocks(markdown: &str) -> Vec<DocBlock> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim_end();

        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        if line.trim() == PAGE_BREAK_SENTINEL {
            blocks.push(DocBlock::PageBreak);
            i += 1;
            continue;
        }

        if let Some(caps) = RE_HEADING.captures(line) {
            blocks.push(DocBlock::Heading {
                level: caps[1].len(),
                text: caps[2].trim().to_string(),
            });
            i += 1;
            continue;
        }

        // A header row is only a table when the separator row follows;
        // otherwise the line is literal text.
        if is_table_row(line) && !is_separator_row(line) {
            if let Some(next) = lines.get(i + 1) {
                if is_separator_row(next) {
                    let header = split_cells(line);
                    let aligns = parse_alignments(next, header.len());
                    let mut rows = Vec::new();
                    i += 2;
                    while i < lines.len() && is_table_row(lines[i]) {
                        // Stray mid-table separators carry no data.
                        if !is_separator_row(lines[i]) {
                            rows.push(split_cells(lines[i]));
                        }
                        i += 1;
                    }
                    blocks.push(DocBlock::Table {
                        aligns,
                        header,
                        rows,
                    });
                    continue;
                }
            }
        }

        blocks.push(DocBlock::Paragraph(line.trim().to_string()));
        i += 1;
    }

    blocks
}

/// Split a pipe-table row into cell texts, honouring `\|` escapes.
fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim().trim_start_matches('|').trim_end_matches('|');
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in trimmed.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '|' if escaped => {
                current.push('|');
                escaped = false;
            }
            '|' => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            c => {
                if escaped {
                    current.push('\\');
                    escaped = false;
                }
                current.push(c);
            }
        }
    }
    if escaped {
        current.push('\\');
    }
    cells.push(current.trim().to_string());
    cells
}

/// Parse `:---` / `:---:` / `---:` hints; missing columns default to left.
fn parse_alignments(separator: &str, cols: usize) -> Vec<ColumnAlign> {
    let parsed: Vec<ColumnAlign> = split_cells(separator)
        .iter()
        .map(|cell| {
            let starts = cell.starts_with(':');
            let ends = cell.ends_with(':');
            match (starts, ends) {
                (true, true) => ColumnAlign::Center,
                (false, true) => ColumnAlign::Right,
                _ => ColumnAlign::Left,
            }
        })
        .collect();
    (0..cols)
        .map(|c| parsed.get(c).copied().unwrap_or(ColumnAlign::Left))
        .collect()
}

// ── Inline emphasis ──────────────────────────────────────────────────────

/// A run-level fragment of a paragraph or cell.
#[derive(Debug, Clone, PartialEq)]
enum InlineSpan {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
}

/// Translate minimal inline emphasis to spans: `**bold**`, `*italic*`,
/// `_italic_`, `` `code` ``. Delimiters must flank a word: an opener cannot
/// sit inside a word or precede whitespace, a closer cannot follow
/// whitespace, and `_` never matches intra-word — `snake_case_name` and
/// `2 * 3` stay literal, matching how the external converter reads them.
/// No nesting; anything unmatched stays literal, as does everything else
/// (math syntax in particular).
fn parse_inline(text: &str) -> Vec<InlineSpan> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    let mut flush = |plain: &mut String, spans: &mut Vec<InlineSpan>| {
        if !plain.is_empty() {
            spans.push(InlineSpan::Text(std::mem::take(plain)));
        }
    };

    while i < chars.len() {
        if chars[i] == '*' && chars.get(i + 1) == Some(&'*') {
            if can_open(&chars, i, 2) {
                if let Some(end) = find_bold_closer(&chars, i + 2) {
                    if end > i + 2 {
                        flush(&mut plain, &mut spans);
                        spans.push(InlineSpan::Bold(chars[i + 2..end].iter().collect()));
                        i = end + 2;
                        continue;
                    }
                }
            }
        } else if chars[i] == '*' || chars[i] == '_' {
            let marker = chars[i];
            if can_open(&chars, i, 1) {
                if let Some(end) = find_italic_closer(&chars, i + 1, marker) {
                    if end > i + 1 {
                        flush(&mut plain, &mut spans);
                        spans.push(InlineSpan::Italic(chars[i + 1..end].iter().collect()));
                        i = end + 1;
                        continue;
                    }
                }
            }
        } else if chars[i] == '`' {
            if let Some(end) = find_char(&chars, i + 1, '`') {
                if end > i + 1 {
                    flush(&mut plain, &mut spans);
                    spans.push(InlineSpan::Code(chars[i + 1..end].iter().collect()));
                    i = end + 1;
                    continue;
                }
            }
        }
        plain.push(chars[i]);
        i += 1;
    }

    flush(&mut plain, &mut spans);
    spans
}

fn find_char(chars: &[char], from: usize, c: char) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == c)
}

/// An opener must start a word: nothing alphanumeric before it, no
/// whitespace right after the delimiter.
fn can_open(chars: &[char], i: usize, len: usize) -> bool {
    let prev_ok = i == 0 || !chars[i - 1].is_alphanumeric();
    let next_ok = chars.get(i + len).is_some_and(|c| !c.is_whitespace());
    prev_ok && next_ok
}

fn find_bold_closer(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1))
        .find(|&j| chars[j] == '*' && chars[j + 1] == '*' && !chars[j - 1].is_whitespace())
}

/// A closer must end a word: no whitespace before it, and for `_` nothing
/// alphanumeric after it.
fn find_italic_closer(chars: &[char], from: usize, marker: char) -> Option<usize> {
    (from..chars.len()).find(|&j| {
        chars[j] == marker
            && !chars[j - 1].is_whitespace()
            && (marker != '_' || chars.get(j + 1).map_or(true, |c| !c.is_alphanumeric()))
    })
}

// ── DOCX construction ────────────────────────────────────────────────────

/// Render Markdown to packed DOCX bytes via manual document construction.
///
/// Always succeeds for any input the assembler can produce; the only error
/// path is the final zip pack, which would indicate an internal bug.
pub fn build_docx(markdown: &str) -> Result<Vec<u8>, Ocr2DocError> {
    let mut docx = register_styles(Docx::new());

    for block in parse_blocks(markdown) {
        docx = match block {
            DocBlock::Heading { level, text } => {
                let style = heading_style_id(level);
                docx.add_paragraph(styled_paragraph(&text, Some(style), None))
            }
            DocBlock::Paragraph(text) => docx.add_paragraph(styled_paragraph(&text, None, None)),
            DocBlock::PageBreak => docx.add_paragraph(
                Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            ),
            DocBlock::Table {
                aligns,
                header,
                rows,
            } => docx.add_table(build_table(&aligns, &header, &rows)),
        };
    }

    let mut buffer = Vec::new();
    docx.build()
        .pack(&mut Cursor::new(&mut buffer))
        .map_err(|e| Ocr2DocError::DocxBuild(e.to_string()))?;
    Ok(buffer)
}

fn heading_style_id(level: usize) -> &'static str {
    match level {
        1 => "Heading1",
        2 => "Heading2",
        3 => "Heading3",
        4 => "Heading4",
        5 => "Heading5",
        _ => "Heading6",
    }
}

/// Build a paragraph from inline spans, optionally styled and aligned.
fn styled_paragraph(
    text: &str,
    style: Option<&str>,
    align: Option<ColumnAlign>,
) -> Paragraph {
    let mut para = Paragraph::new();
    if let Some(style_id) = style {
        para = para.style(style_id);
    }
    if let Some(align) = align {
        para = para.align(match align {
            ColumnAlign::Left => AlignmentType::Left,
            ColumnAlign::Center => AlignmentType::Center,
            ColumnAlign::Right => AlignmentType::Right,
        });
    }
    for span in parse_inline(text) {
        let run = match span {
            InlineSpan::Text(t) => Run::new().add_text(t),
            InlineSpan::Bold(t) => Run::new().add_text(t).bold(),
            InlineSpan::Italic(t) => Run::new().add_text(t).italic(),
            InlineSpan::Code(t) => Run::new().style("CodeInline").add_text(t),
        };
        para = para.add_run(run);
    }
    para
}

/// Build a DOCX table: header row in bold, per-column alignment applied to
/// every cell of the column.
fn build_table(aligns: &[ColumnAlign], header: &[String], rows: &[Vec<String>]) -> Table {
    let cols = header.len();
    let mut table_rows = Vec::with_capacity(rows.len() + 1);

    let header_cells: Vec<TableCell> = (0..cols)
        .map(|c| {
            let text = if header[c].is_empty() {
                String::new()
            } else {
                format!("**{}**", header[c])
            };
            TableCell::new().add_paragraph(styled_paragraph(
                &text,
                None,
                Some(aligns[c]),
            ))
        })
        .collect();
    table_rows.push(TableRow::new(header_cells));

    for row in rows {
        let cells: Vec<TableCell> = (0..cols)
            .map(|c| {
                let text = row.get(c).map(String::as_str).unwrap_or("");
                TableCell::new().add_paragraph(styled_paragraph(text, None, Some(aligns[c])))
            })
            .collect();
        table_rows.push(TableRow::new(cells));
    }

    Table::new(table_rows).style("Table")
}

/// Register the paragraph and character styles the builder emits,
/// mirroring the document defaults users expect from word processors.
fn register_styles(docx: Docx) -> Docx {
    fn heading(id: &str, name: &str, size: usize) -> Style {
        Style::new(id, StyleType::Paragraph).name(name).size(size).bold()
    }

    let mono = RunFonts::new()
        .ascii("Courier New")
        .hi_ansi("Courier New")
        .east_asia("Courier New")
        .cs("Courier New");

    docx.add_style(heading("Heading1", "Heading 1", 32))
        .add_style(heading("Heading2", "Heading 2", 28))
        .add_style(heading("Heading3", "Heading 3", 26))
        .add_style(heading("Heading4", "Heading 4", 24))
        .add_style(heading("Heading5", "Heading 5", 22))
        .add_style(heading("Heading6", "Heading 6", 20))
        .add_style(
            Style::new("CodeInline", StyleType::Character)
                .name("Code Inline")
                .fonts(mono)
                .size(18),
        )
        .add_style(
            Style::new("Table", StyleType::Table)
                .name("Table")
                .table_align(TableAlignmentType::Center),
        )
}
