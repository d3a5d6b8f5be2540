//! Assembly: join normalized pages into one Markdown document.
//!
//! The assembler is deliberately dumb — all per-page cleanup already
//! happened in the normalizer, so this stage only decides document-level
//! layout: the optional title heading, blank-line separation between pages,
//! and the page-break sentinel.
//!
//! Assembly is a pure function of its inputs: the same pages and config
//! always produce byte-identical output.

use crate::config::RenderConfig;
use crate::output::NormalizedPage;

/// Marker line inserted between pages when `page_breaks` is enabled.
///
/// An HTML comment survives every Markdown renderer unchanged (it is
/// invisible in previews but greppable in the source), cannot collide with
/// OCR-extracted content the way a horizontal rule could, and both DOCX
/// paths recognise it and emit a real page-break element in its place.
pub const PAGE_BREAK_SENTINEL: &str = "<!-- pagebreak -->";

/// Assemble normalized pages into a single Markdown document.
///
/// Layout: optional `# title`, then each page's text in order. Consecutive
/// parts are separated by one blank line; with `page_breaks` enabled the
/// sentinel line additionally sits between consecutive pages (N pages yield
/// exactly N−1 sentinels). Empty pages contribute no text but still count
/// for sentinel placement. No trailing separator.
pub fn assemble(pages: &[NormalizedPage], config: &RenderConfig) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(pages.len() * 2 + 1);

    if let Some(title) = config.title.as_deref() {
        let title = title.trim();
        if !title.is_empty() {
            parts.push(format!("# {title}"));
        }
    }

    for (i, page) in pages.iter().enumerate() {
        if i > 0 && config.page_breaks {
            parts.push(PAGE_BREAK_SENTINEL.to_string());
        }
        let text = page.text.trim();
        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }

    parts.join("\n\n")
}
