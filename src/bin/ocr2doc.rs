//! CLI binary for ocr2doc.
//!
//! A thin shim over the library crate that maps CLI flags to `RenderConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use ocr2doc::{convert, convert_to_files, RenderConfig, TablePolicy};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a saved OCR response; writes output.md and output.docx
  ocr2doc response.json

  # Read the response from stdin, name the artifacts
  curl -s https://api.example.com/ocr/job/42 | ocr2doc - -o report

  # Title heading and no page breaks
  ocr2doc response.json --title "Q3 Scans" --no-page-breaks

  # Skip pandoc entirely (builder only, fully offline)
  ocr2doc response.json --no-converter

  # Print the assembled Markdown to stdout instead of writing files
  ocr2doc response.json --stdout

  # Structured JSON result (markdown, pages, warnings, stats)
  ocr2doc response.json --json > result.json

EXTERNAL CONVERTER:
  DOCX output prefers pandoc when it is installed; otherwise (or on any
  pandoc failure/timeout) the built-in document builder renders the DOCX
  and a warning is recorded. Both paths always produce a valid file.

ENVIRONMENT VARIABLES:
  OCR2DOC_OUTPUT      Default output base path (same as -o)
  OCR2DOC_CONVERTER   Converter binary (default: pandoc)
  RUST_LOG            Tracing filter, overrides -v/-q (e.g. ocr2doc=debug)
"#;

/// Convert OCR response JSON to Markdown and DOCX documents.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2doc",
    version,
    about = "Convert OCR response JSON to Markdown and DOCX documents",
    long_about = "Convert the JSON response of an OCR service into a clean Markdown document \
and a DOCX file. Handles every recognised response shape (markdown text, line lists, \
paragraph lists, layout blocks) and degrades gracefully on malformed pages.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the OCR response JSON, or '-' for stdin.
    input: String,

    /// Output base path; '.md' and '.docx' are appended.
    #[arg(short, long, env = "OCR2DOC_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Document title, rendered as a level-1 heading.
    #[arg(short, long)]
    title: Option<String>,

    /// Do not insert page breaks between pages.
    #[arg(long)]
    no_page_breaks: bool,

    /// Skip the external converter; always use the built-in DOCX builder.
    #[arg(long)]
    no_converter: bool,

    /// External converter binary.
    #[arg(long, env = "OCR2DOC_CONVERTER", default_value = "pandoc")]
    converter_cmd: String,

    /// External converter timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Table handling: prefer-builder or converter-verbatim.
    #[arg(long, value_enum, default_value = "prefer-builder")]
    tables: TableArg,

    /// Print the assembled Markdown to stdout instead of writing files.
    #[arg(long, conflicts_with = "json")]
    stdout: bool,

    /// Output the structured conversion result as JSON to stdout.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum TableArg {
    PreferBuilder,
    ConverterVerbatim,
}

impl From<TableArg> for TablePolicy {
    fn from(v: TableArg) -> Self {
        match v {
            TableArg::PreferBuilder => TablePolicy::PreferBuilder,
            TableArg::ConverterVerbatim => TablePolicy::ConverterVerbatim,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read the response ────────────────────────────────────────────────
    let raw_text = if cli.input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read OCR response from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(&cli.input)
            .await
            .with_context(|| format!("Failed to read OCR response from '{}'", cli.input))?
    };
    let raw: serde_json::Value =
        serde_json::from_str(&raw_text).context("OCR response is not valid JSON")?;

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = RenderConfig::builder()
        .page_breaks(!cli.no_page_breaks)
        .use_converter(!cli.no_converter)
        .converter_command(&cli.converter_cmd)
        .converter_timeout_secs(cli.timeout)
        .table_policy(cli.tables.clone().into());
    if let Some(ref title) = cli.title {
        builder = builder.title(title);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    if cli.stdout || cli.json {
        let output = convert(&raw, &config).await.context("Conversion failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.markdown.as_bytes())
                .context("Failed to write to stdout")?;
            if !output.markdown.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
        print_summary(&cli, &output);
        return Ok(());
    }

    let output = convert_to_files(&raw, &config, &cli.output)
        .await
        .context("Conversion failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}  {}",
            if output.warnings.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.total_pages,
            output.stats.total_duration_ms,
            bold(&cli.output.with_extension("md").display().to_string()),
            bold(&cli.output.with_extension("docx").display().to_string()),
        );
    }
    print_summary(&cli, &output);

    Ok(())
}

/// Print warnings and the engine line to stderr (unless quiet/json).
fn print_summary(cli: &Cli, output: &ocr2doc::ConversionOutput) {
    if cli.quiet || cli.json {
        return;
    }
    for warning in &output.warnings {
        eprintln!("   {} {}", cyan("⚠"), warning);
    }
    eprintln!(
        "   {}",
        dim(&format!(
            "docx engine: {:?}, {}ms",
            output.stats.docx_engine, output.stats.docx_duration_ms
        ))
    );
}
