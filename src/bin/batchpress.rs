//! CLI binary for batchpress.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CompressionConfig`, partitions inputs by file kind, and prints results.

use anyhow::{Context, Result};
use batchpress::{
    export_all, format_bytes, run, savings_percent, BatchProgressCallback, CompressionConfig,
    FileKind, FileStatus, PixelReencode, ProgressCallback, RecordSummary, RunReport, SimulatedShrink,
    SourceFile, Workspace,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per batch, scaled to 100 units per
/// file so the simulated strategy's intermediate ticks are visible, with a
/// ✓/✗ log line per finished file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-file name and wall-clock start time for the finish lines.
    in_flight: Mutex<HashMap<usize, (String, Instant)>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(label: &str) -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            in_flight: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        // 100 bar units per file keeps intra-file ticks visible.
        self.bar.set_length((total_files * 100) as u64);
        self.bar.reset_elapsed();
    }

    fn on_file_start(&self, file_num: usize, total_files: usize, name: &str) {
        self.in_flight
            .lock()
            .unwrap()
            .insert(file_num, (name.to_string(), Instant::now()));
        self.bar.set_position(((file_num - 1) * 100) as u64);
        self.bar.set_message(format!("{file_num}/{total_files}  {name}"));
    }

    fn on_file_progress(&self, file_num: usize, _total_files: usize, percent: u8) {
        self.bar
            .set_position(((file_num - 1) * 100 + percent as usize) as u64);
    }

    fn on_file_complete(&self, file_num: usize, total_files: usize, result_size: u64) {
        let (name, elapsed_ms) = self
            .in_flight
            .lock()
            .unwrap()
            .remove(&file_num)
            .map(|(n, t)| (n, t.elapsed().as_millis()))
            .unwrap_or_default();

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {:<10}  {}",
            green("✓"),
            file_num,
            total_files,
            name,
            dim(&format_bytes(result_size)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.set_position((file_num * 100) as u64);
    }

    fn on_file_error(&self, file_num: usize, total_files: usize, error: &str) {
        let name = self
            .in_flight
            .lock()
            .unwrap()
            .remove(&file_num)
            .map(|(n, _)| n)
            .unwrap_or_default();

        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}",
            red("✗"),
            file_num,
            total_files,
            name,
            red(&msg),
        ));
        self.bar.set_position((file_num * 100) as u64);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} file(s) compressed",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) compressed  ({} failed)",
                if failed == total_files { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compress images next to the originals (writes into ./compressed/)
  batchpress photo.jpg scan.png

  # Pick an output directory and quality
  batchpress --quality 65 -o out/ *.jpg

  # Mix kinds freely; each file is routed to its strategy by extension
  batchpress slides.pdf cover.webp notes.pdf

  # Machine-readable summary
  batchpress --json report.pdf > result.json

SUPPORTED FILES:
  Kind      Extensions                         Strategy
  ─────     ─────────────────────────────      ───────────────────
  image     jpg, jpeg, png, gif, webp, svg     pixel re-encode (JPEG output)
  document  pdf                                simulated shrink (placeholder)

NOTE:
  The document path is a stand-in: it produces a placeholder payload sized
  by a pseudo-random ratio, not a recompressed PDF. Treat its output as a
  pipeline smoke signal, not a document.
"#;

/// Compress a batch of images and PDFs with per-file progress.
#[derive(Parser, Debug)]
#[command(
    name = "batchpress",
    version,
    about = "Compress a batch of images and PDFs with per-file progress",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to compress (images and/or PDFs).
    files: Vec<PathBuf>,

    /// Directory to write compressed outputs into.
    #[arg(short, long, env = "BATCHPRESS_OUT_DIR", default_value = "compressed")]
    out_dir: PathBuf,

    /// Quality 1–100; defaults to 80 for images, 70 for PDFs.
    #[arg(long, env = "BATCHPRESS_QUALITY",
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Embedded-image quality for the document path, 1–100.
    #[arg(long, env = "BATCHPRESS_IMAGE_QUALITY",
          value_parser = clap::value_parser!(u8).range(1..=100))]
    image_quality: Option<u8>,

    /// Output format hint for images: auto, jpg, png, webp (advisory).
    #[arg(long, env = "BATCHPRESS_FORMAT", default_value = "auto")]
    format: String,

    /// Keep embedded metadata (accepted; the re-encoder cannot honour it yet).
    #[arg(long)]
    preserve_metadata: bool,

    /// Pause between files in milliseconds.
    #[arg(long, env = "BATCHPRESS_PAUSE_MS", default_value_t = 300)]
    pause_ms: u64,

    /// Output a structured JSON summary instead of the human report.
    #[arg(long, env = "BATCHPRESS_JSON")]
    json: bool,

    /// Disable progress bars.
    #[arg(long, env = "BATCHPRESS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BATCHPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BATCHPRESS_QUIET")]
    quiet: bool,
}

/// Everything the summary printers need about one finished batch.
struct BatchOutcome {
    label: &'static str,
    records: Vec<RecordSummary>,
    report: RunReport,
    total_original: u64,
    total_result: u64,
    exported: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    // ── Partition inputs by kind ─────────────────────────────────────────
    let mut images: Vec<SourceFile> = Vec::new();
    let mut pdfs: Vec<SourceFile> = Vec::new();
    for path in &cli.files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match FileKind::from_name(&name) {
            Some(kind) => {
                let source = SourceFile::from_path(path)
                    .with_context(|| format!("Failed to read '{}'", path.display()))?;
                match kind {
                    FileKind::Image => images.push(source),
                    FileKind::Pdf => pdfs.push(source),
                }
            }
            None => {
                eprintln!("{} skipping unsupported file: {}", cyan("⚠"), path.display());
            }
        }
    }
    anyhow::ensure!(
        !images.is_empty() || !pdfs.is_empty(),
        "no supported files among the inputs"
    );

    // ── Build configs ────────────────────────────────────────────────────
    let output_format = cli
        .format
        .parse()
        .with_context(|| format!("Invalid --format '{}'", cli.format))?;

    let image_config = {
        let mut b = CompressionConfig::image_defaults()
            .to_builder()
            .output_format(output_format)
            .preserve_metadata(cli.preserve_metadata)
            .inter_file_pause_ms(cli.pause_ms);
        if let Some(q) = cli.quality {
            b = b.quality(q);
        }
        b.build().context("Invalid image configuration")?
    };
    let pdf_config = {
        let mut b = CompressionConfig::pdf_defaults()
            .to_builder()
            .inter_file_pause_ms(cli.pause_ms);
        if let Some(q) = cli.quality {
            b = b.quality(q);
        }
        if let Some(q) = cli.image_quality {
            b = b.image_quality(q);
        }
        b.build().context("Invalid PDF configuration")?
    };

    // ── Run each batch ───────────────────────────────────────────────────
    let mut outcomes: Vec<BatchOutcome> = Vec::new();
    if !images.is_empty() {
        let ws = Workspace::new(Arc::new(PixelReencode::new()));
        outcomes.push(
            process_batch("Images", &ws, images, image_config, show_progress, &cli.out_dir)
                .await?,
        );
    }
    if !pdfs.is_empty() {
        let ws = Workspace::new(Arc::new(SimulatedShrink::new()));
        outcomes
            .push(process_batch("PDFs", &ws, pdfs, pdf_config, show_progress, &cli.out_dir).await?);
    }

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        print_json_summary(&outcomes)?;
    } else if !cli.quiet {
        print_human_summary(&outcomes, &cli.out_dir);
    }

    let succeeded: usize = outcomes.iter().map(|o| o.report.succeeded).sum();
    let eligible: usize = outcomes.iter().map(|o| o.report.eligible).sum();
    anyhow::ensure!(
        succeeded > 0 || eligible == 0,
        "all {eligible} file(s) failed to compress"
    );
    Ok(())
}

async fn process_batch(
    label: &'static str,
    workspace: &Workspace,
    sources: Vec<SourceFile>,
    config: CompressionConfig,
    show_progress: bool,
    out_dir: &PathBuf,
) -> Result<BatchOutcome> {
    workspace
        .add(sources)
        .with_context(|| format!("Failed to stage {label}"))?;

    let config = if show_progress {
        let cb = CliProgressCallback::new(label);
        config
            .to_builder()
            .progress_callback(cb as ProgressCallback)
            .build()
            .context("Invalid configuration")?
    } else {
        config
    };

    let report = run(workspace, &config).await;
    let exported = export_all(workspace, out_dir).context("Export failed")?;

    let summary = workspace.summary();
    Ok(BatchOutcome {
        label,
        records: workspace.snapshot(),
        report,
        total_original: summary.total_original_size,
        total_result: summary.total_result_size,
        exported,
    })
}

fn print_human_summary(outcomes: &[BatchOutcome], out_dir: &PathBuf) {
    for outcome in outcomes {
        eprintln!(
            "{}: {}  →  {}  (saved {})",
            bold(outcome.label),
            format_bytes(outcome.total_original),
            format_bytes(outcome.total_result),
            savings_percent(outcome.total_original, Some(outcome.total_result)),
        );
        for record in &outcome.records {
            if record.status == FileStatus::Failed {
                eprintln!(
                    "  {} {}: {}",
                    red("✗"),
                    record.name,
                    record.error.as_deref().unwrap_or("failed")
                );
            }
        }
    }
    let written: usize = outcomes.iter().map(|o| o.exported.len()).sum();
    eprintln!("{} file(s) written to {}", written, out_dir.display());
}

fn print_json_summary(outcomes: &[BatchOutcome]) -> Result<()> {
    let value = serde_json::json!({
        "batches": outcomes
            .iter()
            .map(|o| {
                serde_json::json!({
                    "label": o.label,
                    "records": o.records,
                    "report": o.report,
                    "total_original_size": o.total_original,
                    "total_result_size": o.total_result,
                    "exported": o.exported,
                })
            })
            .collect::<Vec<_>>(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&value).context("Failed to serialise summary")?
    );
    Ok(())
}
