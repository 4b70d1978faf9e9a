//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliOutputFormat, CliResizeFilter};
use crate::{
    config::{EditorConfig, OutputFormat, ResizeFilter},
    filter::FilterThresholds,
    resize::ResizeRequest,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to an `EditorConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `EditorConfig` from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<EditorConfig> {
        let output_format = match cli.format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            CliOutputFormat::Webp => webp_output_format()?,
            CliOutputFormat::Tiff => OutputFormat::Tiff,
            CliOutputFormat::Rgba8 => OutputFormat::Rgba8,
        };

        let resize_filter = match cli.filter {
            CliResizeFilter::Nearest => ResizeFilter::Nearest,
            CliResizeFilter::Triangle => ResizeFilter::Triangle,
            CliResizeFilter::CatmullRom => ResizeFilter::CatmullRom,
            CliResizeFilter::Gaussian => ResizeFilter::Gaussian,
            CliResizeFilter::Lanczos3 => ResizeFilter::Lanczos3,
        };

        let max_working_size = cli
            .max_size
            .as_deref()
            .map(parse_size)
            .transpose()
            .context("Invalid --max-size")?;

        // --local-only wins over any key from the environment
        let api_key = if cli.local_only {
            None
        } else {
            cli.api_key.clone()
        };

        let config = EditorConfig::builder()
            .output_format(output_format)
            .jpeg_quality(cli.jpeg_quality)
            .thresholds(FilterThresholds {
                brightness: cli.brightness_threshold,
                near_white: cli.white_threshold,
            })
            .api_key(api_key)
            .api_endpoint(cli.api_endpoint.clone())
            .api_timeout_secs(cli.api_timeout)
            .fallback_to_local(!cli.no_fallback)
            .skip_removal(cli.no_remove)
            .resize(ResizeRequest::new(cli.width, cli.height, !cli.no_aspect_lock))
            .resize_filter(resize_filter)
            .max_working_size(max_working_size)
            .build()
            .context("Invalid configuration")?;

        Ok(config)
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.jpeg_quality > 100 {
            anyhow::bail!("JPEG quality must be between 0 and 100, got {}", cli.jpeg_quality);
        }

        for (name, value) in [("--width", cli.width), ("--height", cli.height)] {
            if let Some(value) = value {
                if !value.is_finite() || value <= 0.0 {
                    anyhow::bail!("{} must be a positive number, got {}", name, value);
                }
            }
        }

        let has_key = cli.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        if cli.no_fallback && !cli.no_remove && !has_key {
            anyhow::bail!("--no-fallback needs an API key (--api-key or REMOVE_BG_API_KEY)");
        }

        if let Some(size) = cli.max_size.as_deref() {
            parse_size(size).context("Invalid --max-size")?;
        }

        Ok(())
    }
}

#[cfg(feature = "webp-support")]
fn webp_output_format() -> Result<OutputFormat> {
    Ok(OutputFormat::WebP)
}

#[cfg(not(feature = "webp-support"))]
fn webp_output_format() -> Result<OutputFormat> {
    anyhow::bail!("WebP output requires the webp-support feature")
}

/// Parse a `WxH` box such as `500x500`
pub(crate) fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .with_context(|| format!("expected WxH, got '{}'", value))?;

    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("invalid width in '{}'", value))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid height in '{}'", value))?;

    if width == 0 || height == 0 {
        anyhow::bail!("both sides must be non-zero, got '{}'", value);
    }
    Ok((width, height))
}
