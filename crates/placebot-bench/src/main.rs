//! placebot-bench: CLI tool for canvas analysis experiments and diagnostics.
//!
//! Runs the analysis on saved canvas and palette screenshots with
//! configurable parameters, printing per-stage diagnostics. Useful for:
//!
//! - Checking the grid estimate on a new zoom level or theme
//! - Tuning the cell size range, candidate threshold, and tolerances
//! - Seeing which cells would be clicked for a color
//! - Writing SVG/PNG overlays of what the estimator classified
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin placebot-bench -- --canvas <PNG> [OPTIONS]
//! ```
//!
//! Set `RUST_LOG=debug` for per-stage library logs.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use placebot_export::SvgMetadata;
use placebot_vision::diagnostics::{AnalysisDiagnostics, Clock};
use placebot_vision::{
    AnalysisConfig, ColorRgb, EdgeDetectorKind, ScreenRegion, Screenshot, Tolerance,
};
use tracing_subscriber::EnvFilter;

/// Canvas analysis experimentation and diagnostics for placebot.
///
/// Runs grid estimation, pixel sampling, and palette location on saved
/// screenshots and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "placebot-bench", version)]
struct Cli {
    /// Canvas screenshot (PNG, JPEG, BMP, WebP).
    #[arg(long)]
    canvas: PathBuf,

    /// Palette screenshot. Without it no swatches are located.
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Palette JSON document listing the colors to locate.
    ///
    /// Without it only the `--target` color is located.
    #[arg(long)]
    colors: Option<PathBuf>,

    /// Screen position of the palette screenshot's top-left pixel, as X,Y.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, default_value = "0,0")]
    palette_offset: (i32, i32),

    /// Palette region size as WxH. Defaults to the palette image size.
    #[arg(long, value_parser = parse_size)]
    palette_size: Option<(u32, u32)>,

    /// Color to resolve paint targets for, as R,G,B.
    #[arg(long, value_parser = parse_color)]
    target: Option<ColorRgb>,

    /// Per-channel tolerance for paint target resolution.
    #[arg(long, default_value_t = Tolerance::DEFAULT.intended)]
    tolerance: u8,

    /// Edge detector feeding contour extraction.
    #[arg(long, value_enum, default_value_t = Detector::ForwardDifference)]
    edge_detector: Detector,

    /// Cell size used when too few contours qualify.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_FALLBACK_CELL_SIZE)]
    fallback_cell_size: u32,

    /// Minimum candidate boxes for a trusted grid estimate.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_MIN_CANDIDATES)]
    min_candidates: usize,

    /// Offset from a cell's top-left corner to its sampled pixel.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_SAMPLE_INSET)]
    sample_inset: i32,

    /// Per-channel tolerance when masking palette swatches.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_PALETTE_TOLERANCE)]
    palette_tolerance: u8,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, all other analysis parameter flags are ignored.
    /// The JSON must be a valid `AnalysisConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the grid classification as an SVG overlay.
    #[arg(long)]
    grid_svg: Option<PathBuf>,

    /// Write located swatches as an SVG overlay.
    #[arg(long)]
    palette_svg: Option<PathBuf>,

    /// Write the canvas screenshot with grid boxes drawn on it as PNG.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write the palette screenshot with swatch markers drawn on it as PNG.
    #[arg(long)]
    palette_overlay: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,
}

/// Edge detector selection.
#[derive(Clone, Copy, ValueEnum)]
enum Detector {
    /// Zero-threshold forward difference on the color image.
    ForwardDifference,
    /// Canny on the luminance image.
    Canny,
}

/// Build an [`AnalysisConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<AnalysisConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        AnalysisConfig {
            edge_detector: match cli.edge_detector {
                Detector::ForwardDifference => EdgeDetectorKind::ForwardDifference,
                Detector::Canny => EdgeDetectorKind::Canny,
            },
            fallback_cell_size: cli.fallback_cell_size,
            min_candidates: cli.min_candidates,
            sample_inset: cli.sample_inset,
            palette_tolerance: cli.palette_tolerance,
            ..AnalysisConfig::default()
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn parse_point(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad X in {s:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y in {s:?}: {e}"))?;
    Ok((x, y))
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width in {s:?}: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height in {s:?}: {e}"))?;
    Ok((w, h))
}

fn parse_color(s: &str) -> Result<ColorRgb, String> {
    let channels: Vec<u8> = s
        .split(',')
        .map(|c| c.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("bad channel in {s:?}: {e}"))?;
    match channels[..] {
        [r, g, b] => Ok(ColorRgb::new(r, g, b)),
        _ => Err(format!("expected R,G,B, got {s:?}")),
    }
}

/// Screenshots and color list loaded from disk.
struct Inputs {
    canvas: Screenshot,
    palette: Screenshot,
    palette_region: ScreenRegion,
    colors: Vec<ColorRgb>,
}

fn load_screenshot(path: &Path) -> Result<Screenshot, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    eprintln!("Image: {} ({} bytes)", path.display(), bytes.len());
    placebot_vision::decode::decode(&bytes)
        .map_err(|e| format!("Error decoding {}: {e}", path.display()))
}

fn load_inputs(cli: &Cli) -> Result<Inputs, String> {
    let canvas = load_screenshot(&cli.canvas)?;
    let palette = match cli.palette {
        Some(ref path) => load_screenshot(path)?,
        None => canvas.clone(),
    };

    let (x, y) = cli.palette_offset;
    let dims = palette.dimensions();
    let (width, height) = cli.palette_size.unwrap_or((dims.width, dims.height));
    let palette_region = ScreenRegion::new(x, y, width, height).map_err(|e| e.to_string())?;

    let mut colors = match cli.colors {
        _ if cli.palette.is_none() => Vec::new(),
        Some(ref path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
            placebot_vision::palette::parse_palette_json(&json)
                .map_err(|e| format!("Error parsing {}: {e}", path.display()))?
                .into_iter()
                .map(|c| c.rgb)
                .collect()
        }
        None => Vec::new(),
    };
    if let Some(target) = cli.target
        && cli.palette.is_some()
        && !colors.contains(&target)
    {
        colors.push(target);
    }

    Ok(Inputs {
        canvas,
        palette,
        palette_region,
        colors,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let inputs = match load_inputs(&cli) {
        Ok(inputs) => inputs,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Config: {config:#?}");
    eprintln!("Colors: {}", inputs.colors.len());
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match placebot_vision::analyze_with_diagnostics(
            &inputs.canvas,
            &inputs.palette,
            &inputs.palette_region,
            &inputs.colors,
            &config,
            &StdClock,
        ) {
            Ok((analysis, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                if run == 0 {
                    if let Some(target) = cli.target {
                        print_targets(&analysis, target, cli.tolerance);
                    }
                    write_artifacts(&cli, &config, &inputs, &analysis, &diagnostics);
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Analysis error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Print the swatch and canvas-relative cells to click for `target`.
fn print_targets(analysis: &placebot_vision::Analysis, target: ColorRgb, tolerance: u8) {
    println!();
    match analysis.swatch(target) {
        Some(swatch) => println!("Swatch for {target}: {},{}", swatch.x, swatch.y),
        None => println!("Swatch for {target}: not found"),
    }
    let targets = analysis.paint_targets(target, tolerance);
    println!("Paint targets for {target}: {}", targets.len());
    for t in targets {
        println!("  {},{}", t.x, t.y);
    }
}

/// Write whichever overlays were requested. Failures are reported but
/// do not abort the run.
fn write_artifacts(
    cli: &Cli,
    config: &AnalysisConfig,
    inputs: &Inputs,
    analysis: &placebot_vision::Analysis,
    diagnostics: &AnalysisDiagnostics,
) {
    let title = cli
        .canvas
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bench");
    let config_json = serde_json::to_string(config).ok();
    let metadata = SvgMetadata {
        title: Some(title),
        description: None,
        config_json: config_json.as_deref(),
    };

    if let Some(ref path) = cli.grid_svg {
        let svg = placebot_export::to_grid_svg(
            &diagnostics.classification,
            inputs.canvas.dimensions(),
            &metadata,
        );
        write_file(path, svg.as_bytes(), "Grid SVG");
    }
    if let Some(ref path) = cli.palette_svg {
        let svg = placebot_export::to_palette_svg(
            &analysis.color_locations,
            &inputs.palette_region,
            inputs.palette.dimensions(),
            &metadata,
        );
        write_file(path, svg.as_bytes(), "Palette SVG");
    }
    if let Some(ref path) = cli.overlay {
        let img = placebot_export::render_grid_overlay(&inputs.canvas, &diagnostics.classification);
        match placebot_export::encode_png(&img) {
            Ok(png) => write_file(path, &png, "Grid overlay"),
            Err(e) => eprintln!("Error encoding grid overlay: {e}"),
        }
    }
    if let Some(ref path) = cli.palette_overlay {
        let img = placebot_export::render_palette_overlay(
            &inputs.palette,
            &analysis.color_locations,
            &inputs.palette_region,
        );
        match placebot_export::encode_png(&img) {
            Ok(png) => write_file(path, &png, "Palette overlay"),
            Err(e) => eprintln!("Error encoding palette overlay: {e}"),
        }
    }
}

fn write_file(path: &Path, contents: &[u8], what: &str) {
    match std::fs::write(path, contents) {
        Ok(()) => eprintln!("{what} written to {} ({} bytes)", path.display(), contents.len()),
        Err(e) => eprintln!("Error writing {what} to {}: {e}", path.display()),
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&AnalysisDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[AnalysisDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Edge Detection", |d| d.edge_detection.duration),
        ("Grid Estimation", |d| d.grid_estimation.duration),
        ("Pixel Map", |d| d.pixel_map.duration),
        ("Palette", |d| d.palette.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
