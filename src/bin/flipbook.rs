//! CLI binary for flipbook-render.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RenderConfig`, renders every page and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use flipbook_render::{
    inspect, render_document, render_to_dir, ProgressCallback, RenderConfig,
    RenderProgressCallback, Viewport,
};
use indicatif::{ProgressBar, ProgressStyle};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the source is fetched, then a
/// page bar once the page count is known. Pages arrive strictly in order, so
/// a single "last event" timestamp is enough for per-page timings.
struct CliProgressCallback {
    bar: ProgressBar,
    last_event: Mutex<Instant>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_open
        Arc::new(Self::with_bar(bar))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            last_event: Mutex::new(Instant::now()),
            errors: AtomicUsize::new(0),
        }
    }

    /// Pages reported through `on_page_error` so far.
    fn failed_pages(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    /// Seconds since the previous page event; resets the clock.
    fn lap(&self) -> f64 {
        match self.last_event.lock() {
            Ok(mut last) => {
                let secs = last.elapsed().as_secs_f64();
                *last = Instant::now();
                secs
            }
            Err(_) => 0.0,
        }
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_open(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.lap();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_pages} pages…"))
        ));
    }

    fn on_page_ready(&self, page_num: usize, total: usize, bytes: usize) {
        let secs = self.lap();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>6} KiB", bytes / 1024)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.lap();
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_render_complete(&self, total_pages: usize, success_count: usize) {
        let failed = self.failed_pages();
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages rendered",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages rendered  ({} skipped)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render every page and print a summary
  flipbook brochure.pdf

  # Write page-0001.jpg, page-0002.jpg, … into a directory
  flipbook brochure.pdf -o pages/

  # Sharper rasters, smaller files
  flipbook --scale 2.0 --quality 75 catalogue.pdf -o out/

  # Render from a URL
  flipbook https://example.com/files/brochure.pdf -o pages/

  # Flipbook size on a phone-sized viewport
  flipbook --viewport 390x844 brochure.pdf

  # Inspect PDF metadata only
  flipbook --inspect-only brochure.pdf

  # JSON summary (stats, skipped pages, layout)
  flipbook --json brochure.pdf > summary.json

LAYOUT:
  Viewports narrower than 768 px use the compact layout:
    width  = min(viewport_width - 32, 360)
    height = min(viewport_height * 0.65, 480)
  Wider viewports use:
    width  = min(viewport_width * 0.6, 520)
    height = min(viewport_height * 0.75, 720)

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Override the log filter (e.g. flipbook_render=debug)
"#;

/// Rasterise PDF files and URLs into flipbook page images.
#[derive(Parser, Debug)]
#[command(
    name = "flipbook",
    version,
    about = "Rasterise PDF files and URLs into flipbook page images",
    long_about = "Decode every page of a PDF (local file or URL) into a JPEG raster, \
in page order, the same way a page-flip viewer would. Pages that fail to decode are \
skipped and reported.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path, file:// URL or HTTP/HTTPS URL.
    input: String,

    /// Write page images into this directory.
    #[arg(short, long, env = "FLIPBOOK_OUTPUT")]
    output: Option<PathBuf>,

    /// Raster scale relative to native page size (0.25–4.0).
    #[arg(long, env = "FLIPBOOK_SCALE", default_value_t = flipbook_render::DEFAULT_SCALE)]
    scale: f32,

    /// JPEG quality (1–100).
    #[arg(long, env = "FLIPBOOK_QUALITY", default_value_t = flipbook_render::DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "FLIPBOOK_PASSWORD")]
    password: Option<String>,

    /// Viewport used to size the flipbook, as WIDTHxHEIGHT.
    #[arg(long, env = "FLIPBOOK_VIEWPORT", default_value = "1280x800", value_parser = parse_viewport)]
    viewport: Viewport,

    /// Output a JSON summary instead of text.
    #[arg(long, env = "FLIPBOOK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FLIPBOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FLIPBOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FLIPBOOK_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "FLIPBOOK_FETCH_TIMEOUT", default_value_t = 120)]
    fetch_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides all the feedback that matters, so library
    // INFO logs are hidden while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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
        let config = build_config(&cli, None)?;
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RenderProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let book = cli.viewport.dimensions();

    // ── Run render ───────────────────────────────────────────────────────
    let (stats, failures) = if let Some(ref dir) = cli.output {
        let output = render_to_dir(&cli.input, dir, &config)
            .await
            .context("Render failed")?;
        (output.stats, output.failures)
    } else {
        let output = render_document(&cli.input, &config)
            .await
            .context("Render failed")?;
        (output.stats, output.failures)
    };

    if cli.json {
        let summary = serde_json::json!({
            "input": cli.input,
            "output_dir": cli.output,
            "viewport": cli.viewport,
            "compact": cli.viewport.is_compact(),
            "dimensions": book,
            "stats": stats,
            "failures": failures,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }

    if !cli.quiet {
        if !show_progress {
            eprintln!(
                "Rendered {}/{} pages in {}ms",
                stats.rendered_pages, stats.total_pages, stats.total_duration_ms
            );
            for failure in &failures {
                eprintln!("  {}", failure);
            }
        }
        if let Some(ref dir) = cli.output {
            eprintln!(
                "{}  {} images  →  {}",
                if stats.skipped_pages == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                stats.rendered_pages,
                bold(&dir.display().to_string()),
            );
        }
        eprintln!(
            "   book {}×{} px on a {}×{} {} viewport  —  {} fetch / {} render",
            bold(&format!("{:.0}", book.width)),
            bold(&format!("{:.0}", book.height)),
            cli.viewport.width,
            cli.viewport.height,
            if cli.viewport.is_compact() {
                "compact"
            } else {
                "wide"
            },
            dim(&format!("{}ms", stats.fetch_duration_ms)),
            dim(&format!("{}ms", stats.render_duration_ms)),
        );
    }

    Ok(())
}

/// Map CLI args to `RenderConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RenderConfig> {
    let mut builder = RenderConfig::builder()
        .scale(cli.scale)
        .jpeg_quality(cli.quality)
        .fetch_timeout_secs(cli.fetch_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--viewport` as `WIDTHxHEIGHT`, e.g. `390x844`.
fn parse_viewport(s: &str) -> Result<Viewport> {
    let s = s.trim().to_lowercase();
    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("Expected WIDTHxHEIGHT, got '{s}'"))?;
    let width: f64 = w.trim().parse().context("Invalid viewport width")?;
    let height: f64 = h.trim().parse().context("Invalid viewport height")?;

    if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
        anyhow::bail!("Viewport must be non-negative, got {width}x{height}");
    }
    Ok(Viewport::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_pages_are_counted_from_error_events() {
        let cb = CliProgressCallback::with_bar(ProgressBar::hidden());
        cb.on_open(4);
        cb.on_page_ready(1, 4, 2048);
        cb.on_page_error(2, 4, "Page 2: decode failed: broken xref");
        cb.on_page_ready(3, 4, 2048);
        cb.on_page_error(4, 4, "Page 4: decode failed: broken xref");
        assert_eq!(cb.failed_pages(), 2);
        cb.on_render_complete(4, 2);
    }

    #[test]
    fn viewport_flag_parses() {
        let vp = parse_viewport(" 390X844 ").unwrap();
        assert_eq!((vp.width, vp.height), (390.0, 844.0));
        assert!(parse_viewport("390").is_err());
        assert!(parse_viewport("-1x10").is_err());
    }
}
