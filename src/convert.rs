//! Conversion entry points.
//!
//! [`convert`] is the primary API: one raw OCR response in, both documents
//! (Markdown + DOCX) plus per-page texts, warnings, and statistics out.
//! [`convert_to_files`] additionally persists the two artifacts with atomic
//! writes; [`convert_sync`] wraps the async path for blocking callers.

use crate::config::RenderConfig;
use crate::error::Ocr2DocError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::{assemble, convert_tool, normalize};
use crate::response;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a raw OCR response to Markdown and DOCX.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `raw` — The OCR service response, parsed JSON of any supported shape
/// * `config` — Rendering configuration
///
/// # Returns
/// `Ok(ConversionOutput)` whenever a page sequence could be located, even if
/// individual pages were malformed or the external converter was unusable
/// (check `output.warnings`). Both artifacts are always populated.
///
/// # Errors
/// Returns `Err(Ocr2DocError)` only for fatal conditions:
/// - The response has no page sequence and no top-level text
/// - `pages` is present but not an array
/// - The fallback DOCX builder itself failed (no path left)
pub async fn convert(
    raw: &serde_json::Value,
    config: &RenderConfig,
) -> Result<ConversionOutput, Ocr2DocError> {
    let total_start = Instant::now();
    info!("Starting conversion");

    // ── Step 1: Locate the page sequence ─────────────────────────────────
    let page_values = response::unwrap_pages(raw)?;
    debug!("Unwrapped {} pages", page_values.len());

    // ── Step 2: Normalize pages to plain text ────────────────────────────
    let pages = normalize::normalize(&page_values);

    // ── Step 3: Assemble the Markdown document ───────────────────────────
    let markdown = assemble::assemble(&pages, config);

    // ── Step 4: Render DOCX ──────────────────────────────────────────────
    let docx_start = Instant::now();
    let (docx, docx_engine, converter_warning) =
        convert_tool::render_docx(&markdown, config).await?;
    let docx_duration_ms = docx_start.elapsed().as_millis() as u64;

    // ── Step 5: Aggregate warnings and stats ─────────────────────────────
    let mut warnings: Vec<_> = pages.iter().filter_map(|p| p.warning.clone()).collect();
    let malformed_pages = warnings.len();
    warnings.extend(converter_warning);

    let stats = ConversionStats {
        total_pages: pages.len(),
        empty_pages: pages.iter().filter(|p| p.text.is_empty()).count(),
        malformed_pages,
        docx_engine,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        docx_duration_ms,
    };

    info!(
        "Conversion complete: {} pages, {} warnings, {:?} engine, {}ms total",
        stats.total_pages,
        warnings.len(),
        docx_engine,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        docx,
        pages,
        raw: raw.clone(),
        warnings,
        stats,
    })
}

/// Convert a raw OCR response and write both artifacts to disk.
///
/// `base_path` is extended with `.md` and `.docx`; parent directories are
/// created as needed. Each file uses an atomic write (temp file + rename) so
/// a crash mid-write never leaves a partial artifact behind.
pub async fn convert_to_files(
    raw: &serde_json::Value,
    config: &RenderConfig,
    base_path: impl AsRef<Path>,
) -> Result<ConversionOutput, Ocr2DocError> {
    let output = convert(raw, config).await?;
    let base = base_path.as_ref();

    if let Some(parent) = base.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Ocr2DocError::OutputWriteFailed {
                    path: base.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }

    write_atomic(&with_extension(base, "md"), output.markdown.as_bytes()).await?;
    write_atomic(&with_extension(base, "docx"), &output.docx).await?;

    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally; do not call from within an
/// async context.
pub fn convert_sync(
    raw: &serde_json::Value,
    config: &RenderConfig,
) -> Result<ConversionOutput, Ocr2DocError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Ocr2DocError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(raw, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn with_extension(base: &Path, ext: &str) -> std::path::PathBuf {
    let mut path = base.to_path_buf();
    path.set_extension(ext);
    path
}

/// Atomic write: write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Ocr2DocError> {
    let map_err = |e| Ocr2DocError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let tmp_path = path.with_extension(match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.tmp"),
        None => "tmp".to_string(),
    });
    tokio::fs::write(&tmp_path, bytes).await.map_err(map_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(map_err)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
