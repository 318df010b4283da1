//! Glyphbench - time three ways of drawing one line of text
//!
//! Every selected benchmark draws the line `--iterations` times onto one
//! shared offscreen surface and prints how long that took. `--clear` wipes
//! the surface before each iteration; `--output` saves what the surface holds
//! at the end, composited over blue.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;

use glyphbench_core::{
    bench::{BenchReport, Benchmark, BenchmarkKind},
    config::{DEFAULT_FAMILY, SAMPLE_TEXT},
    traits::FontRef,
    BenchConfig, BenchError, Color,
};
use glyphbench_fontdb::{shared_default_font, shared_font, Font, FontDatabase};
use glyphbench_render_skia::SkiaSurface;
use glyphbench_shape_hb::{HarfBuzzShaper, HbBufferShaper};

/// Which benchmarks to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    All,
    One(BenchmarkKind),
}

impl Selection {
    fn kinds(self) -> Vec<BenchmarkKind> {
        match self {
            Selection::All => BenchmarkKind::all().to_vec(),
            Selection::One(kind) => vec![kind],
        }
    }
}

fn parse_selection(s: &str) -> Result<Selection, String> {
    if s.eq_ignore_ascii_case("all") {
        return Ok(Selection::All);
    }
    s.parse::<BenchmarkKind>()
        .map(Selection::One)
        .map_err(|e| e.to_string())
}

/// Command line arguments
#[derive(Parser)]
#[command(name = "glyphbench")]
#[command(about = "Time direct, shaped and buffer-shaped text drawing")]
#[command(version)]
struct Args {
    /// Font file to draw with (.ttf, .otf, .ttc)
    #[arg(short = 'f', long = "font")]
    font: Option<PathBuf>,

    /// Installed family to look up when no font file is given
    #[arg(long = "family", default_value = DEFAULT_FAMILY)]
    family: String,

    /// Line of text to draw
    #[arg(short = 't', long = "text", default_value = SAMPLE_TEXT)]
    text: String,

    /// Text size in pixels
    #[arg(short = 's', long = "size", default_value_t = 18.0)]
    size: f32,

    /// Iterations per benchmark
    #[arg(short = 'n', long = "iterations", default_value_t = 1000)]
    iterations: u32,

    /// Clear the surface before every iteration
    #[arg(short = 'c', long = "clear")]
    clear: bool,

    /// direct, shaper, buffer, buffer-per-glyph or all
    #[arg(short = 'b', long = "benchmark", default_value = "all", value_parser = parse_selection)]
    benchmark: Selection,

    /// Surface width in pixels
    #[arg(long = "width", default_value_t = 300)]
    width: u32,

    /// Surface height in pixels
    #[arg(long = "height", default_value_t = 100)]
    height: u32,

    /// Units per em the shaping buffer's font is scaled to
    #[arg(long = "buffer-scale", default_value_t = 512)]
    buffer_scale: u16,

    /// Save the final surface as PNG
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output results as JSON
    #[arg(short = 'j', long = "json")]
    json_output: bool,

    /// Output file for JSON results (default: stdout)
    #[arg(long = "output-json")]
    json_file: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> BenchConfig {
        BenchConfig {
            iterations: self.iterations,
            text: self.text.clone(),
            font_size: self.size,
            buffer_scale: self.buffer_scale,
            surface_width: self.width,
            surface_height: self.height,
            clear: self.clear,
        }
    }
}

/// One benchmark in the JSON output
#[derive(Debug, serde::Serialize)]
struct BenchmarkResult {
    benchmark: String,
    iterations: u32,
    cleared: bool,
    elapsed_ms: u128,
    total_time_ns: u128,
    ns_per_iteration: f64,
}

impl From<&BenchReport> for BenchmarkResult {
    fn from(report: &BenchReport) -> Self {
        Self {
            benchmark: report.kind.name().to_string(),
            iterations: report.iterations,
            cleared: report.cleared,
            elapsed_ms: report.elapsed_ms(),
            total_time_ns: report.elapsed.as_nanos(),
            ns_per_iteration: report.ns_per_iteration(),
        }
    }
}

/// JSON output structure for benchmark results
#[derive(Debug, serde::Serialize)]
struct BenchmarkOutput {
    version: String,
    timestamp: String,
    font: Option<String>,
    text: String,
    font_size: f32,
    results: Vec<BenchmarkResult>,
}

fn load_font(args: &Args) -> Result<Arc<Font>, BenchError> {
    if let Some(path) = &args.font {
        return FontDatabase::new().load_font(path);
    }

    match shared_font(&args.family) {
        Ok(font) => Ok(font),
        Err(e) => {
            log::warn!("{}, trying fallback families", e);
            shared_default_font()
        },
    }
}

fn write_json(
    output: &BenchmarkOutput,
    path: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(output)?;
    match path {
        Some(path) => fs::write(path, &json).map_err(BenchError::Io)?,
        None => println!("{}", json),
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config();
    config.validate()?;

    let font = load_font(args)?;
    let family = font.family_name();

    if !args.json_output {
        println!("{}", "Glyphbench".bold().cyan());
        println!(
            "Font: {} | Size: {} | Iterations: {} | Clear: {}",
            family.as_deref().unwrap_or("(unnamed)"),
            config.font_size,
            config.iterations,
            config.clear
        );
    }

    let mut surface = SkiaSurface::new(config.surface_width, config.surface_height)?;
    let shaper = HarfBuzzShaper::new();
    let mut buffer = HbBufferShaper::new(font.as_ref(), config.buffer_scale)?;
    let shared: Arc<dyn FontRef> = font.clone();
    let bench = Benchmark::new(config.clone(), shared)?.with_background(Color::white());

    let mut results = Vec::new();
    for kind in args.benchmark.kinds() {
        let report = bench.run(kind, &mut surface, &shaper, &mut buffer)?;
        if !args.json_output {
            println!("{:18} {}", kind.name().bold(), report.to_string().green());
        }
        results.push(BenchmarkResult::from(&report));
    }

    if let Some(path) = &args.output {
        surface.save_png(path, Color::blue())?;
        if !args.json_output {
            println!("{}", format!("Saved surface to {}", path.display()).bright_black());
        }
    }

    if args.json_output {
        let output = BenchmarkOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            font: family,
            text: config.text.clone(),
            font_size: config.font_size,
            results,
        };
        write_json(&output, args.json_file.as_ref())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_parsing() {
        assert_eq!(parse_selection("all").unwrap(), Selection::All);
        assert_eq!(parse_selection("ALL").unwrap(), Selection::All);
        assert_eq!(
            parse_selection("buffer").unwrap(),
            Selection::One(BenchmarkKind::Buffer)
        );
        assert!(parse_selection("everything").is_err());
    }

    #[test]
    fn test_selection_kinds() {
        assert_eq!(Selection::All.kinds().len(), 4);
        assert_eq!(
            Selection::One(BenchmarkKind::Direct).kinds(),
            vec![BenchmarkKind::Direct]
        );
    }

    #[test]
    fn test_args_map_onto_config() {
        let args = Args::parse_from(["glyphbench", "-n", "5", "--clear", "--size", "24"]);
        let config = args.config();
        assert_eq!(config.iterations, 5);
        assert!(config.clear);
        assert_eq!(config.font_size, 24.0);
        assert_eq!(config.text, SAMPLE_TEXT);
        assert_eq!(args.benchmark, Selection::All);
    }

    #[test]
    fn test_json_file_flag() {
        let args = Args::parse_from(["glyphbench", "--json", "--output-json", "out.json"]);
        assert!(args.json_output);
        assert_eq!(args.json_file, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
