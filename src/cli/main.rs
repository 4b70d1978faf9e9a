//! quickcut command-line interface
//!
//! Strips backgrounds from and resizes images using the unified processor.

use super::config::CliConfigBuilder;
use crate::{
    config::{OutputFormat, DEFAULT_API_ENDPOINT},
    filter::{DEFAULT_BRIGHTNESS_THRESHOLD, DEFAULT_NEAR_WHITE_THRESHOLD},
    processor::BackgroundRemovalProcessor,
    services::{ImageIOService, OutputFormatHandler, DEFAULT_DOWNLOAD_NAME},
    tracing_config::{events, spans, TracingFormat},
    types::EditResult,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Instrument;

/// Background removal and resize tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "quickcut")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image files or directories (use "-" for stdin)
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Output file (single input) or directory (batch processing). Use "-" for stdout.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = CliOutputFormat::Png)]
    pub format: CliOutputFormat,

    /// JPEG quality (0-100)
    #[arg(long, default_value_t = 90)]
    pub jpeg_quality: u8,

    /// remove.bg API key; without one only the local filter is used
    #[arg(long, env = "REMOVE_BG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Background removal API endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_ENDPOINT)]
    pub api_endpoint: String,

    /// API request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub api_timeout: u64,

    /// Never call the API, always use the local brightness filter
    #[arg(long)]
    pub local_only: bool,

    /// Fail instead of falling back to the local filter when the API fails
    #[arg(long, conflicts_with = "local_only")]
    pub no_fallback: bool,

    /// Keep the background, only resize
    #[arg(long)]
    pub no_remove: bool,

    /// Target width in pixels
    #[arg(long, value_name = "PX")]
    pub width: Option<f64>,

    /// Target height in pixels
    #[arg(long, value_name = "PX")]
    pub height: Option<f64>,

    /// Scale width and height independently
    #[arg(long)]
    pub no_aspect_lock: bool,

    /// Resampling filter for resizing
    #[arg(long, value_enum, default_value_t = CliResizeFilter::Triangle)]
    pub filter: CliResizeFilter,

    /// Shrink inputs to fit this box before editing (e.g. 500x500)
    #[arg(long, value_name = "WxH")]
    pub max_size: Option<String>,

    /// Pixels with mean RGB above this become transparent
    #[arg(long, default_value_t = DEFAULT_BRIGHTNESS_THRESHOLD)]
    pub brightness_threshold: u8,

    /// Pixels with every channel above this become transparent
    #[arg(long, default_value_t = DEFAULT_NEAR_WHITE_THRESHOLD)]
    pub white_threshold: u8,

    /// Process directory recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Pattern for batch processing (e.g., "*.jpg")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
    Rgba8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    Json,
}

/// Where one result goes
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Counts for a finished run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RunSummary {
    processed: usize,
    failed: usize,
    fallbacks: usize,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli).context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    info!("Input(s): {}", cli.input.join(", "));
    let processor = BackgroundRemovalProcessor::new(config)
        .context("Failed to create background removal processor")?;

    if !processor.config().skip_removal {
        match processor.backend_name() {
            Some(name) if processor.config().fallback_to_local => {
                info!("Removing backgrounds with {} (local filter as fallback)", name);
            },
            Some(name) => info!("Removing backgrounds with {}", name),
            None => info!("No API key configured, using the local brightness filter"),
        }
    }

    let start_time = Instant::now();
    let summary = process_inputs(&cli, &processor).await?;

    info!(
        "Processed {} image(s) in {:.2}s",
        summary.processed,
        start_time.elapsed().as_secs_f64()
    );

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} file(s) failed",
            summary.failed,
            summary.processed + summary.failed
        );
    }

    Ok(())
}

/// Initialize tracing based on verbosity level and log format
fn init_tracing(cli: &Cli) -> Result<()> {
    let format = match cli.log_format {
        CliLogFormat::Console => TracingFormat::Console,
        CliLogFormat::Compact => TracingFormat::Compact,
        CliLogFormat::Json => json_log_format()?,
    };
    crate::tracing_config::init_cli_tracing(cli.verbose, format)
}

#[cfg(feature = "tracing-json")]
fn json_log_format() -> Result<TracingFormat> {
    Ok(TracingFormat::Json)
}

#[cfg(not(feature = "tracing-json"))]
fn json_log_format() -> Result<TracingFormat> {
    anyhow::bail!("JSON logs require the tracing-json feature")
}

async fn process_inputs(cli: &Cli, processor: &BackgroundRemovalProcessor) -> Result<RunSummary> {
    // Handle stdin specially (single input)
    if cli.input.len() == 1 && cli.input.first().is_some_and(|s| s == "-") {
        return process_stdin(cli.output.as_deref(), processor).await;
    }

    let all_files = collect_input_files(&cli.input, cli.recursive, cli.pattern.as_deref())?;
    if all_files.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(RunSummary::default());
    }

    let file_count = all_files.len();
    info!("Found {} image file(s) to process", file_count);

    let output_format = processor.config().output_format;
    let output_dir = prepare_output_dir(cli.output.as_deref(), file_count)?;

    let progress = if file_count > 1 {
        let pb = ProgressBar::new(file_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut summary = RunSummary::default();
    let batch_start_time = Instant::now();
    let batch_span = spans::batch_processing(file_count);

    for input_file in &all_files {
        if let Some(ref pb) = progress {
            pb.set_message(format!("Processing {}", input_file.display()));
        }

        let target = resolve_output_target(
            input_file,
            cli.output.as_deref(),
            output_dir.as_deref(),
            output_format,
        );

        let span = spans::file_processing(input_file, OutputFormatHandler::get_extension(output_format));
        match process_single_file(processor, input_file, &target)
            .instrument(span)
            .instrument(batch_span.clone())
            .await
        {
            Ok(result) => {
                summary.processed += 1;
                if result.used_fallback() {
                    summary.fallbacks += 1;
                }
            },
            Err(e) => {
                error!("Failed to process {}: {:#}", input_file.display(), e);
                summary.failed += 1;
            },
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Completed! Processed: {}, Failed: {}",
            summary.processed, summary.failed
        ));
    }

    if file_count > 1 {
        let batch_total_time = batch_start_time.elapsed();
        info!("Batch processing summary:");
        info!("  Files processed: {}", summary.processed);
        info!("  Files failed: {}", summary.failed);
        info!("  Local fallbacks: {}", summary.fallbacks);
        info!("  Total time: {:.2}s", batch_total_time.as_secs_f64());
        if summary.processed > 0 {
            info!(
                "  Average per file: {:.2}s",
                batch_total_time.as_secs_f64() / summary.processed as f64
            );
        }
    }

    Ok(summary)
}

/// Process image from stdin
async fn process_stdin(
    output_target: Option<&str>,
    processor: &BackgroundRemovalProcessor,
) -> Result<RunSummary> {
    info!("Reading image from stdin");

    let mut result = processor
        .process_reader(tokio::io::stdin())
        .await
        .context("Failed to edit image from stdin")?;

    let config = processor.config();
    let target = match output_target {
        None | Some("-") => OutputTarget::Stdout,
        Some(path) => {
            let path = PathBuf::from(path);
            if path.is_dir() {
                let name = Path::new(DEFAULT_DOWNLOAD_NAME)
                    .with_extension(OutputFormatHandler::get_extension(config.output_format));
                OutputTarget::File(path.join(name))
            } else {
                OutputTarget::File(path)
            }
        },
    };

    write_result(&mut result, &target, config.output_format, config.jpeg_quality)?;
    report_result(&result, "stdin");

    Ok(RunSummary {
        processed: 1,
        failed: 0,
        fallbacks: usize::from(result.used_fallback()),
    })
}

/// Process a single image file using the unified processor
async fn process_single_file(
    processor: &BackgroundRemovalProcessor,
    input_path: &Path,
    target: &OutputTarget,
) -> Result<EditResult> {
    let mut result = processor
        .process_file(input_path)
        .await
        .with_context(|| format!("Failed to edit {}", input_path.display()))?;

    let config = processor.config();
    write_result(&mut result, target, config.output_format, config.jpeg_quality)?;
    report_result(&result, &input_path.display().to_string());

    Ok(result)
}

fn write_result(
    result: &mut EditResult,
    target: &OutputTarget,
    format: OutputFormat,
    quality: u8,
) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            let output_data = result.to_bytes(format, quality)?;
            write_stdout(&output_data)?;
            info!("Image written to stdout");
        },
        OutputTarget::File(path) => {
            result
                .save(path, format, quality)
                .with_context(|| format!("Failed to save result to {}", path.display()))?;
        },
    }
    Ok(())
}

fn report_result(result: &EditResult, source: &str) {
    if let Some(reason) = result.fallback_reason.as_deref() {
        events::fallback(source, reason);
    }
    events::performance_metric("edit", result.timings.total_ms, result.dimensions());
    tracing::debug!("{}: {}", source, result.timings.summary());
}

/// Write image data to stdout
fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(data)
        .context("Failed to write image data to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Expand files and directories into a sorted list of files to process
///
/// Explicit files are taken as given so unsupported ones fail with a clear
/// message; directories only contribute files with image extensions.
fn collect_input_files(
    inputs: &[String],
    recursive: bool,
    pattern: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let mut all_files = Vec::new();

    for input in inputs {
        let path = PathBuf::from(input);
        if path.is_file() {
            all_files.push(path);
        } else if path.is_dir() {
            all_files.extend(find_image_files(&path, recursive, pattern)?);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    // Sort files alphanumerically for consistent processing order
    all_files.sort();
    all_files.dedup();
    Ok(all_files)
}

/// Find image files in directory
fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let path = entry.path();
                if ImageIOService::is_supported_format(path) && matches_pattern(path, pattern) {
                    files.push(path.to_path_buf());
                }
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if ImageIOService::is_supported_format(&path) && matches_pattern(&path, pattern) {
                    files.push(path);
                }
            }
        }
    }

    Ok(files)
}

/// Check if file name matches the given glob pattern
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|filename| {
                glob::Pattern::new(pat)
                    .map(|p| p.matches(filename))
                    .unwrap_or(false)
            }),
        None => true,
    }
}

/// Validate and create the output directory for batch runs
fn prepare_output_dir(output: Option<&str>, file_count: usize) -> Result<Option<PathBuf>> {
    let Some(output) = output else {
        return Ok(None);
    };

    if file_count <= 1 {
        let path = PathBuf::from(output);
        return Ok(path.is_dir().then_some(path));
    }

    if output == "-" {
        anyhow::bail!("Cannot use stdout (-) as output when processing multiple files");
    }

    let output_path = PathBuf::from(output);
    if output_path.is_file() {
        anyhow::bail!(
            "Output path exists and is a file, not a directory: {}",
            output_path.display()
        );
    }
    std::fs::create_dir_all(&output_path).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;
    Ok(Some(output_path))
}

/// Decide where the result for `input` goes
fn resolve_output_target(
    input: &Path,
    output: Option<&str>,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> OutputTarget {
    if let Some(dir) = output_dir {
        return OutputTarget::File(ImageIOService::output_path_in_dir(input, dir, format));
    }
    match output {
        Some("-") => OutputTarget::Stdout,
        Some(path) => OutputTarget::File(PathBuf::from(path)),
        None => OutputTarget::File(ImageIOService::default_output_path(input, format)),
    }
}
