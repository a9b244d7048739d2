//! CLI binary for pdf-revive.
//!
//! A thin shim over the library crate that maps CLI flags to `RepairConfig`
//! and prints the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use pdf_revive::{repair_file, RepairConfig, RepairOutcome};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Repair in place (writes repaired_document.pdf next to the input)
  pdfrevive document.pdf

  # Explicit output path
  pdfrevive document.pdf -o fixed.pdf

  # Tight budget for the external qpdf stage
  pdfrevive --qpdf /opt/qpdf/bin/qpdf --timeout 10 document.pdf

  # Machine-readable report on stdout
  pdfrevive --json document.pdf > report.json

REPAIR STAGES (tried in order, first success wins):
  1. standard                fast re-save, full fidelity
  2. lenient reconstruction  rebuilds the page tree, drops annotations
  3. deep scan               viewer-grade engine re-scan (needs libpdfium)
  4. external tool           qpdf --recover (needs the qpdf binary)
  5. content salvage         text + images into a zip when repair is hopeless

EXIT STATUS:
  0  repaired or salvaged
  1  fatal error (unreadable input, bad flags)
  2  document unrecoverable

ENVIRONMENT VARIABLES:
  PDFREVIVE_QPDF     Path to the qpdf binary
  PDFREVIVE_TIMEOUT  External-tool budget in seconds
  RUST_LOG           Tracing filter, e.g. RUST_LOG=pdf_revive=debug
"#;

/// Repair corrupt PDF documents through a staged recovery pipeline.
#[derive(Parser, Debug)]
#[command(
    name = "pdfrevive",
    version,
    about = "Repair corrupt PDF documents through a staged recovery pipeline",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The damaged PDF file.
    input: PathBuf,

    /// Output path. Default: repaired_<name>.pdf (or salvaged_content_<name>.zip)
    /// next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to the qpdf binary used by the external-tool stage.
    #[arg(long, env = "PDFREVIVE_QPDF", default_value = "qpdf")]
    qpdf: PathBuf,

    /// Wall-clock budget for the external-tool stage, in seconds.
    #[arg(long, env = "PDFREVIVE_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Directory for per-run scratch files. Default: the system temp dir.
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Print a JSON report on stdout instead of human-readable output.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder = RepairConfig::builder()
        .qpdf_path(&cli.qpdf)
        .external_timeout_secs(cli.timeout);
    if let Some(ref dir) = cli.scratch_dir {
        builder = builder.scratch_dir(dir);
    }
    let config = builder.build().context("Invalid configuration")?;

    let report = repair_file(&cli.input, cli.output.as_deref(), &config)
        .await
        .context("Repair failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report.outcome.report(&report.content_id))
            .context("Failed to serialise report")?;
        println!("{json}");
    }

    match &report.outcome {
        RepairOutcome::Repaired { bytes, method } => {
            if !cli.quiet && !cli.json {
                println!(
                    "{} repaired via {}  {}  →  {}",
                    green("✔"),
                    bold(method),
                    dim(&format!("{} bytes", bytes.len())),
                    report
                        .written_to
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                );
            }
            Ok(())
        }
        RepairOutcome::Salvaged { archive } => {
            if !cli.quiet && !cli.json {
                println!(
                    "{} document unrepairable; salvaged {} page(s) of text, {} image(s)  →  {}",
                    cyan("⚠"),
                    bold(&archive.page_count.to_string()),
                    bold(&archive.image_count.to_string()),
                    report
                        .written_to
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                );
            }
            Ok(())
        }
        RepairOutcome::Unrecoverable { attempts } => {
            if !cli.json {
                eprintln!("{} document is unrecoverable", red("✘"));
                for attempt in attempts {
                    eprintln!("  {} {}: {}", red("✗"), bold(&attempt.method), attempt.reason);
                }
            }
            std::process::exit(2);
        }
    }
}
