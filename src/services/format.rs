//! Output format handling service
//!
//! This module separates output encoding from the editing logic.

use crate::{config::OutputFormat, error::Result};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Service for encoding edited images
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Encode an RGBA image in the requested format
    ///
    /// JPEG drops the alpha channel; `Rgba8` returns the raw pixel bytes.
    ///
    /// # Examples
    /// ```rust
    /// use quickcut::{services::OutputFormatHandler, OutputFormat};
    /// use image::RgbaImage;
    ///
    /// let image = RgbaImage::new(4, 4);
    /// let png = OutputFormatHandler::encode(&image, OutputFormat::Png, 90)?;
    /// assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn encode(image: &RgbaImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        match format {
            OutputFormat::Rgba8 => return Ok(image.as_raw().clone()),
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
                let mut cursor = Cursor::new(&mut buffer);
                let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.min(100));
                encoder.encode_image(&rgb)?;
            },
            other => {
                let image_format = Self::to_image_format(other).unwrap_or(ImageFormat::Png);
                image.write_to(&mut Cursor::new(&mut buffer), image_format)?;
            },
        }
        Ok(buffer)
    }

    /// Map to the `image` crate format, `None` for raw output
    pub fn to_image_format(format: OutputFormat) -> Option<ImageFormat> {
        match format {
            OutputFormat::Png => Some(ImageFormat::Png),
            OutputFormat::Jpeg => Some(ImageFormat::Jpeg),
            #[cfg(feature = "webp-support")]
            OutputFormat::WebP => Some(ImageFormat::WebP),
            OutputFormat::Tiff => Some(ImageFormat::Tiff),
            OutputFormat::Rgba8 => None,
        }
    }

    /// Get the appropriate file extension for a given output format
    ///
    /// # Examples
    /// ```rust
    /// use quickcut::{services::OutputFormatHandler, OutputFormat};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpg");
    /// ```
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            #[cfg(feature = "webp-support")]
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Rgba8 => "raw",
        }
    }

    /// Check if a format supports transparency (alpha channel)
    pub fn supports_transparency(format: OutputFormat) -> bool {
        !matches!(format, OutputFormat::Jpeg)
    }

    /// Warn when a removal result is about to lose its transparency
    pub fn validate_for_background_removal(format: OutputFormat) {
        if let Some(warning) = Self::transparency_warning(format) {
            log::warn!("{}", warning);
        }
    }

    /// Message for formats that drop the alpha channel
    ///
    /// Removal only ever clears alpha, so dropping it brings back the original
    /// background pixels unchanged.
    #[must_use]
    pub fn transparency_warning(format: OutputFormat) -> Option<String> {
        if Self::supports_transparency(format) {
            return None;
        }
        Some(format!(
            "Output format {:?} does not support transparency. The original background will reappear in the exported image.",
            format
        ))
    }
}
