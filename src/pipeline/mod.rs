//! The conversion pipeline: OCR response JSON in, documents out.
//!
//! Data flows through four stages:
//!
//! ```text
//! raw OCR response (serde_json::Value)
//!        │  response::unwrap_pages
//!        ▼
//! page values ──► normalize ──► Vec<NormalizedPage>
//!                                      │  assemble
//!                                      ▼
//!                              Markdown document
//!                                      │  convert_tool::render_docx
//!                                      ▼
//!                    DOCX bytes (converter or docx builder)
//! ```
//!
//! Each stage is independently testable; [`crate::convert`] wires them
//! together and aggregates warnings and statistics.

pub mod assemble;
pub mod convert_tool;
pub mod docx;
pub mod normalize;
