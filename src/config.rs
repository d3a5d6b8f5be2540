//! Configuration types for OCR-response-to-document conversion.
//!
//! All rendering behaviour is controlled through [`RenderConfig`], built via
//! its [`RenderConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! Callers usually care about one or two fields (a title, the page-break
//! toggle). The builder lets them set only those and rely on well-documented
//! defaults for the rest.

use crate::error::Ocr2DocError;
use serde::{Deserialize, Serialize};

/// Configuration for one conversion request.
///
/// Built via [`RenderConfig::builder()`] or using
/// [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use ocr2doc::RenderConfig;
///
/// let config = RenderConfig::builder()
///     .title("Quarterly Report")
///     .page_breaks(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Document title rendered as a level-1 heading at document start.
    /// Default: None (no heading).
    pub title: Option<String>,

    /// Insert an explicit page-break marker between consecutive pages in
    /// both outputs. Default: true.
    ///
    /// The marker is [`crate::pipeline::assemble::PAGE_BREAK_SENTINEL`] in
    /// the Markdown output and a real page-break element in the DOCX output.
    pub page_breaks: bool,

    /// Attempt the external high-fidelity converter before the builder.
    /// Default: true.
    ///
    /// Set to false to skip the subprocess entirely and render every
    /// document with the built-in DOCX builder. Useful in sandboxed
    /// environments and in tests that need deterministic output.
    pub use_converter: bool,

    /// External converter binary, invoked with Markdown-in/DOCX-out
    /// semantics. Default: "pandoc".
    ///
    /// Presence is detected at call time, not assumed: a missing binary is a
    /// warning, never an error.
    pub converter_command: String,

    /// Timeout for one external-converter invocation, in seconds.
    /// Default: 30.
    ///
    /// The subprocess is killed when the timeout elapses and the builder
    /// path is used instead — no conversion request may block indefinitely
    /// on the external tool.
    pub converter_timeout_secs: u64,

    /// How to render documents containing pipe tables. Default:
    /// [`TablePolicy::PreferBuilder`].
    pub table_policy: TablePolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: None,
            page_breaks: true,
            use_converter: true,
            converter_command: "pandoc".to_string(),
            converter_timeout_secs: 30,
            table_policy: TablePolicy::default(),
        }
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn page_breaks(mut self, v: bool) -> Self {
        self.config.page_breaks = v;
        self
    }

    pub fn use_converter(mut self, v: bool) -> Self {
        self.config.use_converter = v;
        self
    }

    pub fn converter_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.converter_command = cmd.into();
        self
    }

    pub fn converter_timeout_secs(mut self, secs: u64) -> Self {
        self.config.converter_timeout_secs = secs.max(1);
        self
    }

    pub fn table_policy(mut self, policy: TablePolicy) -> Self {
        self.config.table_policy = policy;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, Ocr2DocError> {
        let c = &self.config;
        if c.converter_command.trim().is_empty() {
            return Err(Ocr2DocError::InvalidConfig(
                "Converter command must not be empty (disable with use_converter=false instead)"
                    .into(),
            ));
        }
        if c.converter_timeout_secs == 0 {
            return Err(Ocr2DocError::InvalidConfig(
                "Converter timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref t) = c.title {
            if t.contains('\n') {
                return Err(Ocr2DocError::InvalidConfig(
                    "Title must be a single line".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How table-bearing documents are rendered to DOCX.
///
/// The external converter produces better math typesetting, but its table
/// output loses the per-column alignment hints carried in the GFM separator
/// row. Rather than merging two representations of the same document, the
/// policy picks one engine per document and applies it consistently:
///
/// | Policy | Tables present | Tables absent |
/// |--------|----------------|---------------|
/// | `PreferBuilder` (default) | builder renders the whole document | converter, builder on failure |
/// | `ConverterVerbatim` | converter output used wholesale | converter, builder on failure |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TablePolicy {
    /// Any document containing a pipe table is rendered entirely by the
    /// builder, whose alignment handling is authoritative. (default)
    #[default]
    PreferBuilder,
    /// Always prefer the external converter; accept its table formatting.
    ConverterVerbatim,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = RenderConfig::default();
        assert!(c.title.is_none());
        assert!(c.page_breaks);
        assert!(c.use_converter);
        assert_eq!(c.converter_command, "pandoc");
        assert_eq!(c.converter_timeout_secs, 30);
        assert_eq!(c.table_policy, TablePolicy::PreferBuilder);
    }

    #[test]
    fn builder_sets_fields() {
        let c = RenderConfig::builder()
            .title("Doc")
            .page_breaks(false)
            .use_converter(false)
            .converter_command("mypandoc")
            .converter_timeout_secs(5)
            .table_policy(TablePolicy::ConverterVerbatim)
            .build()
            .unwrap();
        assert_eq!(c.title.as_deref(), Some("Doc"));
        assert!(!c.page_breaks);
        assert!(!c.use_converter);
        assert_eq!(c.converter_command, "mypandoc");
        assert_eq!(c.converter_timeout_secs, 5);
        assert_eq!(c.table_policy, TablePolicy::ConverterVerbatim);
    }

    #[test]
    fn builder_rejects_empty_command() {
        let err = RenderConfig::builder()
            .converter_command("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Converter command"));
    }

    #[test]
    fn builder_rejects_multiline_title() {
        let err = RenderConfig::builder()
            .title("two\nlines")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("single line"));
    }

    #[test]
    fn timeout_clamped_to_minimum() {
        let c = RenderConfig::builder()
            .converter_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.converter_timeout_secs, 1);
    }

    #[test]
    fn config_serialises() {
        let c = RenderConfig::builder().title("T").build().unwrap();
        let json = serde_json::to_string(&c).unwrap();
        let back: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title.as_deref(), Some("T"));
    }
}
