//! CLI binary for pdfmend.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RepairConfig` and prints a per-page repair log plus a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfmend::{
    inspect, repair, ObserverHandle, PageDecision, PageRecord, RepairConfig, RepairObserver,
    TesseractOcr,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: renders a live progress bar plus one log line per
/// repaired page.
struct CliObserver {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
}

impl CliObserver {
    /// Create an observer whose progress-bar length is set by
    /// `on_run_start` (called once the page count is known).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Switch to the full progress-bar style once `total` is known.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Repairing");
        self.bar.reset_eta();
    }
}

impl RepairObserver for CliObserver {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Repairing {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_outcome(&self, record: &PageRecord, total: usize) {
        let (glyph, what) = match &record.decision {
            PageDecision::Copied { text_chars } => {
                (green("✓"), dim(&format!("copied  {text_chars:>5} chars")))
            }
            PageDecision::OcrApplied => (green("✓"), cyan("OCR reconstruction")),
            PageDecision::OcrFailedFallbackImage { .. } => {
                (yellow("⚠"), yellow("OCR failed, raw image"))
            }
            PageDecision::ImageInserted => (green("✓"), dim("raw page image")),
            PageDecision::ImageInsertFailed { error } => {
                // Truncate very long error messages to keep output tidy.
                (red("✗"), red(&ellipsize(error, 80)))
            }
        };
        let pruned = if record.removed_blank {
            dim("  (blank, removed)")
        } else {
            String::new()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}{}",
            glyph, record.page, total, what, pruned
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, failed_pages: usize) {
        self.bar.finish_and_clear();

        if failed_pages == 0 {
            eprintln!(
                "{} {} pages repaired successfully",
                green("✔"),
                bold(&total_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages repaired  ({} failed)",
                if failed_pages == total_pages {
                    red("✘")
                } else {
                    yellow("⚠")
                },
                bold(&(total_pages - failed_pages).to_string()),
                total_pages,
                red(&failed_pages.to_string()),
            );
        }
    }
}

/// Truncate `s` to at most `max` characters, ending in an ellipsis.
///
/// Counts characters, not bytes — error text can carry multibyte input
/// (file names, engine messages) and a byte slice could split a char.
fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{cut}\u{2026}")
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic repair (writes document.repaired.pdf + document.pdf.repair_report.json)
  pdfmend document.pdf

  # Repair with OCR reconstruction of text-less pages
  pdfmend --ocr scan.pdf -o fixed.pdf

  # German OCR at higher resolution, pruning blank pages
  pdfmend --ocr --ocr-lang deu --dpi 400 --remove-blank scan.pdf

  # Export embedded images while repairing
  pdfmend --extract-images ./images document.pdf

  # Inspect page count and properties, no repair
  pdfmend --inspect-only document.pdf

  # Encrypted input
  pdfmend --password hunter2 locked.pdf

  # Machine-readable result on stdout
  pdfmend --json document.pdf > result.json

HOW PAGES ARE REPAIRED:
  Decision              Meaning
  ──────────────────    ─────────────────────────────────────────────────
  copied                page had text; copied verbatim, full fidelity
  ocr_applied           no text; OCR produced a searchable reconstruction
  ocr_failed_fallback   OCR failed; page preserved as a raw image
  image_inserted        OCR disabled; page preserved as a raw image
  image_insert_failed   nothing worked; recorded in the report, no output

  Every decision is written to the JSON repair report, one entry per
  source page, in order.

ENVIRONMENT VARIABLES:
  PDFMEND_OUTPUT        Default output path
  PDFMEND_DPI           Rasterisation DPI (72-1200)
  PDFMEND_OCR_LANG      tesseract language code(s), e.g. eng, deu, eng+fra
  PDFMEND_OCR_TIMEOUT   Per-page OCR deadline in seconds
  PDFIUM_LIB_PATH       Path to an existing libpdfium

SETUP:
  OCR needs a tesseract binary on PATH (apt install tesseract-ocr,
  brew install tesseract). Without one, --ocr still runs: text-less
  pages fall back to raw page images and the report says why.
"#;

/// Repair damaged PDF files page by page.
#[derive(Parser, Debug)]
#[command(
    name = "pdfmend",
    version,
    about = "Repair damaged PDF files page by page",
    long_about = "Rebuild a damaged PDF one page at a time: pages with extractable text are \
copied verbatim; broken pages are reconstructed via OCR or preserved as raw page images. \
Every decision is written to a JSON repair report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Damaged PDF file to repair.
    input: PathBuf,

    /// Write the repaired PDF here. Default: <input stem>.repaired.pdf.
    #[arg(short, long, env = "PDFMEND_OUTPUT")]
    output: Option<PathBuf>,

    /// Reconstruct text-less pages with OCR (requires tesseract on PATH).
    #[arg(long, env = "PDFMEND_OCR")]
    ocr: bool,

    /// OCR language code(s), e.g. eng, deu, eng+fra.
    #[arg(long, env = "PDFMEND_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Per-page OCR deadline in seconds.
    #[arg(long, env = "PDFMEND_OCR_TIMEOUT", default_value_t = 120)]
    ocr_timeout: u64,

    /// Rasterisation DPI for OCR input and image re-insertion (72–1200).
    #[arg(long, env = "PDFMEND_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=1200))]
    dpi: u32,

    /// Remove rebuilt pages that come out blank.
    #[arg(long, env = "PDFMEND_REMOVE_BLANK")]
    remove_blank: bool,

    /// Export embedded images to this directory (page{N}_img{M}.png).
    #[arg(long, value_name = "DIR", env = "PDFMEND_EXTRACT_IMAGES")]
    extract_images: Option<PathBuf>,

    /// Where to write the JSON repair report. Default: <input>.repair_report.json.
    #[arg(long, env = "PDFMEND_REPORT")]
    report: Option<PathBuf>,

    /// Skip the structural resave of the input before page processing.
    #[arg(long, env = "PDFMEND_NO_RESAVE")]
    no_resave: bool,

    /// Skip the timestamped backup copy of the input.
    #[arg(long, env = "PDFMEND_NO_BACKUP")]
    no_backup: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFMEND_PASSWORD")]
    password: Option<String>,

    /// Print page count and document properties only, no repair.
    #[arg(long)]
    inspect_only: bool,

    /// Output the structured result as JSON instead of the summary.
    #[arg(long, env = "PDFMEND_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDFMEND_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFMEND_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFMEND_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the per-page log lines carry the same information.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = tokio::task::block_in_place(|| {
            inspect(&cli.input, cli.password.as_deref())
        })
        .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise info")?
            );
        } else {
            println!("File:      {}", cli.input.display());
            println!("Pages:     {}", info.page_count);
            if let Some(ref t) = info.properties.title {
                println!("Title:     {}", t);
            }
            if let Some(ref a) = info.properties.author {
                println!("Author:    {}", a);
            }
            if let Some(ref s) = info.properties.subject {
                println!("Subject:   {}", s);
            }
            if let Some(ref c) = info.properties.creator {
                println!("Creator:   {}", c);
            }
            if let Some(ref p) = info.properties.producer {
                println!("Producer:  {}", p);
            }
        }
        return Ok(());
    }

    // ── Backup ───────────────────────────────────────────────────────────
    if !cli.no_backup {
        let backup = backup_path(&cli.input);
        std::fs::copy(&cli.input, &backup)
            .with_context(|| format!("Failed to back up input to {}", backup.display()))?;
        if !cli.quiet {
            eprintln!("{} Backup: {}", dim("·"), dim(&backup.display().to_string()));
        }
    }

    // ── Build config and run ─────────────────────────────────────────────
    if cli.ocr && !TesseractOcr::new(cli.ocr_timeout).is_available() && !cli.quiet {
        eprintln!(
            "{} tesseract not found on PATH; text-less pages will fall back to raw images",
            yellow("⚠")
        );
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let mut builder = RepairConfig::builder()
        .dpi(cli.dpi)
        .ocr(cli.ocr)
        .ocr_lang(cli.ocr_lang.as_str())
        .ocr_timeout_secs(cli.ocr_timeout)
        .remove_blank(cli.remove_blank)
        .resave(!cli.no_resave);
    if let Some(ref dir) = cli.extract_images {
        builder = builder.extract_images_dir(dir);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.as_str());
    }
    if let Some(ref path) = cli.report {
        builder = builder.report_path(path);
    }
    if show_progress {
        let observer = CliObserver::new_dynamic();
        builder = builder.observer(observer as ObserverHandle);
    }
    let config = builder.build().context("Invalid configuration")?;

    let result = repair(&cli.input, &output_path, config)
        .await
        .context("Repair failed")?;

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::json!({
            "output_path": result.output_path,
            "report_path": result.report_path,
            "stats": result.stats,
        });
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &json).context("Failed to serialise result")?;
        handle.write_all(b"\n").ok();
    } else if !cli.quiet {
        let s = &result.stats;
        eprintln!(
            "{}  {} pages in {}ms  →  {}",
            if s.failed_pages == 0 {
                green("✔")
            } else {
                yellow("⚠")
            },
            s.total_pages,
            s.duration_ms,
            bold(&result.output_path.display().to_string()),
        );
        eprintln!(
            "   {} copied  /  {} OCR  /  {} image  /  {} failed  /  {} blank removed",
            dim(&s.copied_pages.to_string()),
            dim(&s.ocr_pages.to_string()),
            dim(&s.image_pages.to_string()),
            dim(&s.failed_pages.to_string()),
            dim(&s.removed_blank_pages.to_string()),
        );
        if let Some(ref report) = result.report_path {
            eprintln!("   {} {}", dim("report:"), dim(&report.display().to_string()));
        }
    }

    if result.stats.failed_pages > 0 {
        std::process::exit(2);
    }
    Ok(())
}

/// `document.pdf` → `document.repaired.pdf`.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}.repaired.pdf"))
}

/// `document.pdf` → `document.backup.<timestamp>.pdf`.
fn backup_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
    input.with_file_name(format!("{stem}.backup.{stamp}{ext}"))
}
