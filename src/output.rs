//! Output types returned by the conversion entry points.
//!
//! Everything the caller might want to present side by side lives in
//! [`ConversionOutput`]: the assembled Markdown, the DOCX bytes, the
//! normalized per-page texts, the raw OCR response for diagnostics, and the
//! warnings recovered along the way. All of it is request-scoped — created
//! fresh per conversion and owned solely by the caller once returned.

use crate::error::ConversionWarning;
use serde::{Deserialize, Serialize};

/// Complete result of one conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The assembled Markdown document (UTF-8, LF line endings).
    pub markdown: String,

    /// The DOCX document as a packed byte stream.
    ///
    /// Skipped during serialisation: callers wanting the bytes on disk use
    /// [`crate::convert::convert_to_files`] or write them themselves.
    #[serde(skip)]
    pub docx: Vec<u8>,

    /// Normalized per-page texts, in original page order.
    pub pages: Vec<NormalizedPage>,

    /// The raw OCR response, returned untouched for diagnostics.
    pub raw: serde_json::Value,

    /// Non-fatal conditions recovered during this conversion.
    pub warnings: Vec<ConversionWarning>,

    /// Conversion statistics.
    pub stats: ConversionStats,
}

/// Plain text content extracted from one page.
///
/// The normalizer produces exactly one of these per input page — pages are
/// never dropped or merged, and a page that matched no extraction strategy
/// is present with empty text and a warning attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPage {
    /// 1-indexed page number (original response order).
    pub page_num: usize,

    /// Normalized text (possibly empty, possibly multi-line).
    pub text: String,

    /// Set when this page degraded to empty due to malformed structure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ConversionWarning>,
}

/// Statistics for a completed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of pages in the response (== `pages.len()`).
    pub total_pages: usize,

    /// Pages that normalized to empty text (absent fields or malformed).
    pub empty_pages: usize,

    /// Pages degraded to empty because their structure was malformed.
    pub malformed_pages: usize,

    /// Which engine produced the DOCX bytes.
    pub docx_engine: DocxEngine,

    /// Wall-clock duration of the whole conversion.
    pub total_duration_ms: u64,

    /// Wall-clock duration of the DOCX rendering step alone.
    pub docx_duration_ms: u64,
}

/// Which rendering path produced the DOCX artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocxEngine {
    /// External high-fidelity converter (primary path).
    Converter,
    /// Built-in document builder (fallback path, or chosen by table policy).
    Builder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_serialises_without_docx_bytes() {
        let out = ConversionOutput {
            markdown: "# T\n".into(),
            docx: vec![0x50, 0x4B, 0x03, 0x04],
            pages: vec![NormalizedPage {
                page_num: 1,
                text: "T".into(),
                warning: None,
            }],
            raw: serde_json::json!({"pages": []}),
            warnings: vec![],
            stats: ConversionStats {
                total_pages: 1,
                empty_pages: 0,
                malformed_pages: 0,
                docx_engine: DocxEngine::Builder,
                total_duration_ms: 1,
                docx_duration_ms: 1,
            },
        };

        let json = serde_json::to_string(&out).expect("output must serialise");
        assert!(!json.contains("docx\":"), "docx bytes must be skipped");

        let back: ConversionOutput = serde_json::from_str(&json).expect("round-trip");
        assert!(back.docx.is_empty(), "skipped field defaults to empty");
        assert_eq!(back.stats.docx_engine, DocxEngine::Builder);
    }
}
