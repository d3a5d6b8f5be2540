//! # ocr2doc
//!
//! Convert OCR service responses into polished Markdown and DOCX documents.
//!
//! ## Why this crate?
//!
//! OCR APIs return loosely-structured JSON: page content arrives as ready
//! Markdown, line lists, paragraph lists, or layout blocks depending on the
//! model and request options, sometimes nested one envelope level deep. This
//! crate absorbs all of that variance and emits two presentable artifacts —
//! a Markdown document and a DOCX — from any recognised response shape,
//! degrading gracefully (empty page + warning) instead of failing when a
//! single page is malformed.
//!
//! ## Pipeline Overview
//!
//! ```text
//! OCR response (JSON)
//!  │
//!  ├─ 1. Unwrap     locate the page sequence inside the envelope
//!  ├─ 2. Normalize  one plain-text string per page (fixed strategy priority)
//!  ├─ 3. Assemble   title heading + page-break sentinels → Markdown
//!  ├─ 4. Render     external converter (pandoc), builder fallback → DOCX
//!  └─ 5. Output     both artifacts + per-page texts, warnings, stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2doc::{convert, RenderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raw: serde_json::Value =
//!         serde_json::from_str(&std::fs::read_to_string("response.json")?)?;
//!     let config = RenderConfig::builder().title("Scanned Report").build()?;
//!     let output = convert(&raw, &config).await?;
//!     println!("{}", output.markdown);
//!     std::fs::write("report.docx", &output.docx)?;
//!     for warning in &output.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2doc` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! ocr2doc = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod response;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RenderConfig, RenderConfigBuilder, TablePolicy};
pub use convert::{convert, convert_sync, convert_to_files};
pub use error::{ConversionWarning, Ocr2DocError};
pub use output::{ConversionOutput, ConversionStats, DocxEngine, NormalizedPage};
pub use pipeline::assemble::PAGE_BREAK_SENTINEL;
