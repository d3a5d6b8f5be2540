//! DOCX rendering dispatch: external converter with builder fallback.
//!
//! ## Engine selection
//!
//! The external converter (pandoc by default) produces the highest-fidelity
//! DOCX, but it is an optional system dependency. This module treats it as
//! strictly best-effort: every way the subprocess can disappoint — binary
//! missing, non-zero exit, timeout, garbage output — downgrades to a
//! [`ConversionWarning`] and the built-in builder renders the document
//! instead. A conversion request never fails because of the converter.
//!
//! Two configuration knobs short-circuit the subprocess entirely:
//! `use_converter = false`, and [`TablePolicy::PreferBuilder`] when the
//! document contains a pipe table (the builder's column-alignment handling
//! is authoritative, see [`crate::config::TablePolicy`]).
//!
//! The subprocess runs in a scratch directory with `kill_on_drop`, so a
//! timed-out converter cannot outlive the request that spawned it.

use crate::config::{RenderConfig, TablePolicy};
use crate::error::{ConversionWarning, Ocr2DocError};
use crate::output::DocxEngine;
use crate::pipeline::assemble::PAGE_BREAK_SENTINEL;
use crate::pipeline::docx::{build_docx, contains_table};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Raw OpenXML block substituted for each page-break sentinel before the
/// converter runs. Requires the `raw_attribute` reader extension.
const OPENXML_PAGE_BREAK: &str =
    "```{=openxml}\n<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>\n```";

/// Render Markdown to DOCX bytes, choosing an engine per the config.
///
/// Returns the bytes, which engine produced them, and the warning carried
/// out of a converter fallback (if any). The only error path is the builder
/// itself failing to pack, which has no further fallback.
pub async fn render_docx(
    markdown: &str,
    config: &RenderConfig,
) -> Result<(Vec<u8>, DocxEngine, Option<ConversionWarning>), Ocr2DocError> {
    if !config.use_converter {
        debug!("Converter disabled by config, using builder");
        return Ok((build_docx(markdown)?, DocxEngine::Builder, None));
    }

    if config.table_policy == TablePolicy::PreferBuilder && contains_table(markdown) {
        debug!("Document contains tables, table policy selects builder");
        return Ok((build_docx(markdown)?, DocxEngine::Builder, None));
    }

    match run_converter(markdown, config).await {
        Ok(bytes) => Ok((bytes, DocxEngine::Converter, None)),
        Err(warning) => {
            warn!("{warning}");
            Ok((build_docx(markdown)?, DocxEngine::Builder, Some(warning)))
        }
    }
}

/// Invoke the external converter in a scratch directory.
///
/// Any failure is returned as the warning the caller will attach to the
/// output after falling back to the builder.
async fn run_converter(
    markdown: &str,
    config: &RenderConfig,
) -> Result<Vec<u8>, ConversionWarning> {
    let command = &config.converter_command;
    let scratch = tempfile::tempdir().map_err(|e| ConversionWarning::ConverterFailed {
        command: command.clone(),
        detail: format!("could not create scratch directory: {e}"),
    })?;
    let input_path = scratch.path().join("input.md");
    let output_path = scratch.path().join("output.docx");

    tokio::fs::write(&input_path, rewrite_sentinels(markdown))
        .await
        .map_err(|e| ConversionWarning::ConverterFailed {
            command: command.clone(),
            detail: format!("could not write scratch input: {e}"),
        })?;

    let mut cmd = Command::new(command);
    cmd.arg("-f")
        .arg("gfm+raw_attribute")
        .arg("-t")
        .arg("docx")
        .arg("-o")
        .arg(&output_path)
        .arg(&input_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConversionWarning::ConverterUnavailable {
                command: command.clone(),
                detail: "binary not found on PATH".into(),
            }
        } else {
            ConversionWarning::ConverterUnavailable {
                command: command.clone(),
                detail: e.to_string(),
            }
        }
    })?;

    let timeout = Duration::from_secs(config.converter_timeout_secs);
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ConversionWarning::ConverterFailed {
                command: command.clone(),
                detail: format!("could not collect subprocess output: {e}"),
            });
        }
        // kill_on_drop reaps the subprocess when the future is dropped here.
        Err(_) => {
            return Err(ConversionWarning::ConverterTimeout {
                command: command.clone(),
                secs: config.converter_timeout_secs,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConversionWarning::ConverterFailed {
            command: command.clone(),
            detail: format!(
                "exit status {}: {}",
                output.status,
                stderr_tail(&stderr)
            ),
        });
    }

    let bytes = tokio::fs::read(&output_path)
        .await
        .map_err(|e| ConversionWarning::ConverterFailed {
            command: command.clone(),
            detail: format!("produced no readable output file: {e}"),
        })?;

    // A DOCX is a zip archive; anything else is unusable.
    if !bytes.starts_with(b"PK") {
        return Err(ConversionWarning::ConverterFailed {
            command: command.clone(),
            detail: "output is not a zip archive".into(),
        });
    }

    debug!(
        "Converter '{command}' produced {} bytes of DOCX output",
        bytes.len()
    );
    Ok(bytes)
}

/// Replace every page-break sentinel line with a raw OpenXML page break the
/// converter passes through verbatim.
fn rewrite_sentinels(markdown: &str) -> String {
    markdown
        .lines()
        .map(|line| {
            if line.trim() == PAGE_BREAK_SENTINEL {
                OPENXML_PAGE_BREAK
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last line of converter stderr, enough to identify the failure.
fn stderr_tail(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("(no diagnostic output)")
        .to_string()
}
