//! Error types for the ocr2doc library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`Ocr2DocError`] — **Fatal**: the conversion cannot proceed at all
//!   (response is not a page sequence, invalid configuration, output file
//!   cannot be written). Returned as `Err(Ocr2DocError)` from the top-level
//!   `convert*` functions.
//!
//! * [`ConversionWarning`] — **Non-fatal**: something was recovered from with
//!   degraded output (a malformed page emitted as empty, the external
//!   converter falling back to the builder). Collected in
//!   [`crate::output::ConversionOutput::warnings`] so callers can inspect
//!   what was lost rather than failing the whole document.
//!
//! The separation lets callers decide their own tolerance: surface warnings
//! to the user, log and ignore them, or treat any warning as an error.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ocr2doc library.
///
/// Recovered conditions use [`ConversionWarning`] and are stored in
/// [`crate::output::ConversionOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Ocr2DocError {
    /// The OCR response is structurally unusable: no page sequence and no
    /// top-level text content to synthesise one from.
    #[error("OCR response is structurally unusable: {detail}\nExpected a 'pages' array (or top-level markdown/text content).")]
    FatalInput { detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The fallback DOCX builder could not pack the document.
    ///
    /// This is fatal: the builder is the path of last resort, so there is
    /// nothing left to fall back to.
    #[error("Failed to build DOCX document: {0}")]
    DocxBuild(String),

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal condition recovered during conversion.
///
/// Stored in [`crate::output::ConversionOutput::warnings`] (and, for page
/// warnings, on the affected [`crate::output::NormalizedPage`]). The overall
/// conversion always completes with both artifacts.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ConversionWarning {
    /// A page's fields matched no extraction strategy shape; it was emitted
    /// as an empty page.
    #[error("Page {page}: unrecognised structure, emitted as empty page ({detail})")]
    MalformedPage { page: usize, detail: String },

    /// The external converter binary could not be started (not installed).
    #[error("Converter '{command}' unavailable, used builder fallback: {detail}")]
    ConverterUnavailable { command: String, detail: String },

    /// The external converter ran but failed (non-zero exit, unusable output).
    #[error("Converter '{command}' failed, used builder fallback: {detail}")]
    ConverterFailed { command: String, detail: String },

    /// The external converter exceeded the configured timeout and was killed.
    #[error("Converter '{command}' timed out after {secs}s, used builder fallback")]
    ConverterTimeout { command: String, secs: u64 },
}
