#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # quickcut
//!
//! Quick background stripping and resizing for product shots and other
//! images on a bright backdrop.
//!
//! Backgrounds are removed by a remove.bg compatible web API when an API key
//! is configured. When the API is missing or fails, a local brightness filter
//! makes near-white pixels transparent instead.
//!
//! ## Features
//!
//! - **Remote removal**: remove.bg multipart upload with the API's own error titles
//! - **Local filter**: alpha cleared for bright and near-white pixels, thresholds tunable
//! - **Aspect-aware resize**: width, height or both, with an aspect lock
//! - **Input limits**: image content only, 10 MiB by default
//! - **Format Support**: PNG export, plus JPEG, WebP and TIFF
//! - **CLI Integration**: Optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quickcut::{edit_bytes, EditorConfig, OutputFormat};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EditorConfig::builder()
//!     .api_key(std::env::var("REMOVE_BG_API_KEY").ok())
//!     .resize_width(800.0)
//!     .build()?;
//!
//! let input = tokio::fs::read("product.jpg").await?;
//! let mut result = edit_bytes(&input, &config).await?;
//! println!("background removed by {}", result.method);
//! result.save("product-background-removed.png", OutputFormat::Png, 100)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Step by step
//!
//! The processor is a thin driver over [`EditSession`], which can also be
//! used directly. Every operation consumes the session and returns the next
//! state:
//!
//! ```rust
//! use quickcut::{EditSession, FilterThresholds, ResizeRequest};
//! use image::{imageops::FilterType, DynamicImage, Rgba, RgbaImage};
//!
//! let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 4, Rgba([255, 255, 255, 255])));
//! let session = EditSession::load(&image, None, FilterType::Triangle)?
//!     .remove_background_local(FilterThresholds::default())
//!     .resize(&ResizeRequest::default().with_width(4.0), FilterType::Triangle)?;
//!
//! assert_eq!(session.current().dimensions(), (4, 2));
//! let png = session.export_png()?;
//! # Ok::<(), quickcut::EditorError>(())
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface and progress reporting (optional for library usage)
//! - `webp-support` (default): WebP image format support
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! quickcut = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod processor;
pub mod remote;
pub mod resize;
pub mod services;
pub mod session;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Internal imports for lib functions
use tokio::io::AsyncRead;

// Public API exports
pub use config::{EditorConfig, EditorConfigBuilder, OutputFormat, RemoteConfig, ResizeFilter};
pub use error::{EditorError, Result};
pub use filter::{BackgroundFilter, FilterStats, FilterThresholds};
pub use processor::{BackendFactory, BackgroundRemovalProcessor, DefaultBackendFactory};
pub use remote::{RemovalBackend, RemovalOutcome, RemoveBgClient};
pub use resize::{calculate_target, fit_within, Dimensions, ResizeRequest};
pub use services::{ImageIOService, OutputFormatHandler};
pub use session::EditSession;
pub use types::{EditResult, PixelBuffer, ProcessingTimings, RemovalMethod};

#[cfg(feature = "cli")]
pub use tracing_config::{events, init_cli_tracing, spans, TracingConfig, TracingFormat};

/// Edit an image provided as encoded bytes
///
/// The bytes must hold an image no larger than `config.max_input_bytes`.
///
/// # Examples
/// ```rust,no_run
/// use quickcut::{edit_bytes, EditorConfig};
///
/// # async fn example(upload_bytes: Vec<u8>) -> anyhow::Result<()> {
/// let config = EditorConfig::default();
/// let result = edit_bytes(&upload_bytes, &config).await?;
/// let output_bytes = result.to_bytes(config.output_format, config.jpeg_quality)?;
/// # Ok(())
/// # }
/// ```
pub async fn edit_bytes(image_bytes: &[u8], config: &EditorConfig) -> Result<EditResult> {
    BackgroundRemovalProcessor::new(config.clone())?
        .process_bytes(image_bytes)
        .await
}

/// Edit a decoded `DynamicImage`
///
/// # Examples
/// ```rust,no_run
/// use quickcut::{edit_image, EditorConfig};
/// use image::DynamicImage;
///
/// # async fn example(img: DynamicImage) -> anyhow::Result<()> {
/// let config = EditorConfig::builder().resize_height(300.0).build()?;
/// let mut result = edit_image(&img, &config).await?;
/// result.save("output.png", quickcut::OutputFormat::Png, 100)?;
/// # Ok(())
/// # }
/// ```
pub async fn edit_image(image: &image::DynamicImage, config: &EditorConfig) -> Result<EditResult> {
    BackgroundRemovalProcessor::new(config.clone())?
        .process_image(image)
        .await
}

/// Edit an image read from an async stream
///
/// Reading stops with an error once the stream exceeds `config.max_input_bytes`.
///
/// # Examples
/// ```rust,no_run
/// use quickcut::{edit_reader, EditorConfig};
/// use tokio::fs::File;
///
/// # async fn example() -> anyhow::Result<()> {
/// let file = File::open("large_image.jpg").await?;
/// let result = edit_reader(file, &EditorConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn edit_reader<R: AsyncRead + Unpin>(
    reader: R,
    config: &EditorConfig,
) -> Result<EditResult> {
    BackgroundRemovalProcessor::new(config.clone())?
        .process_reader(reader)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn white_png() -> Vec<u8> {
        let image = RgbaImage::from_pixel(6, 3, Rgba([255, 255, 255, 255]));
        OutputFormatHandler::encode(&image, OutputFormat::Png, 100).unwrap()
    }

    #[tokio::test]
    async fn test_edit_bytes_local_only() {
        let config = EditorConfig::builder().resize_width(3.0).build().unwrap();
        let result = edit_bytes(&white_png(), &config).await.unwrap();

        assert_eq!(result.method, RemovalMethod::Local);
        assert_eq!(result.dimensions(), (3, 1));
        assert!(result.image.pixels().all(|p| p[3] == 0));
    }

    #[tokio::test]
    async fn test_edit_reader_matches_edit_bytes() {
        let config = EditorConfig::default();
        let bytes = white_png();

        let from_bytes = edit_bytes(&bytes, &config).await.unwrap();
        let from_reader = edit_reader(std::io::Cursor::new(bytes), &config).await.unwrap();
        assert_eq!(from_bytes.image, from_reader.image);
    }

    #[tokio::test]
    async fn test_edit_image_skip_removal() {
        let config = EditorConfig::builder().skip_removal(true).build().unwrap();
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])));
        let result = edit_image(&image, &config).await.unwrap();
        assert_eq!(result.method, RemovalMethod::Skipped);
        assert_eq!(result.image, image.to_rgba8());
    }
}
