//! Core types for image editing operations

use crate::{
    config::OutputFormat,
    error::{EditorError, Result},
    services::{ImageIOService, OutputFormatHandler},
};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of channels in a pixel buffer (R, G, B, A)
pub const CHANNELS: usize = 4;

/// Flat row-major RGBA8 pixel data together with its dimensions
///
/// The length of the data is always `width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, checking them against the given dimensions
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::expected_len(width, height)?;
        if data.len() != expected {
            return Err(EditorError::invalid_buffer(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a buffer where every pixel has the same value
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Result<Self> {
        let pixel_count = Self::expected_len(width, height)? / CHANNELS;
        let data = pixel.repeat(pixel_count);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn expected_len(width: u32, height: u32) -> Result<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(CHANNELS))
            .ok_or_else(|| {
                EditorError::invalid_buffer(format!("{}x{} RGBA buffer overflows usize", width, height))
            })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (not bytes)
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the channel values; the length cannot change
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value of the pixel at `(x, y)`, if in bounds
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let px = self.data.get(offset..offset + CHANNELS)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert into an `image` crate buffer without copying
    pub fn into_image(self) -> Result<RgbaImage> {
        let (width, height) = (self.width, self.height);
        RgbaImage::from_raw(width, height, self.data).ok_or_else(|| {
            EditorError::internal(format!("pixel buffer does not fit {}x{}", width, height))
        })
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

/// How the background of an edit result was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalMethod {
    /// Removed by the remote API
    Remote,
    /// Removed by the local brightness filter
    Local,
    /// Background removal was not requested
    Skipped,
}

impl std::fmt::Display for RemovalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-stage timings in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Input decoding (zero when an already decoded image was passed in)
    pub decode_ms: u64,

    /// Background removal, remote call plus any local fallback
    pub removal_ms: u64,

    /// Resize stage
    pub resize_ms: u64,

    /// Final encoding, only known once the result was written out
    pub encode_ms: Option<u64>,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl ProcessingTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line human readable breakdown
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "decode {}ms, removal {}ms, resize {}ms",
            self.decode_ms, self.removal_ms, self.resize_ms
        );
        if let Some(encode) = self.encode_ms {
            summary.push_str(&format!(", encode {}ms", encode));
        }
        summary.push_str(&format!(" (total {}ms)", self.total_ms));
        summary
    }
}

/// Result of an edit run: the output image and how it was produced
#[derive(Debug, Clone)]
pub struct EditResult {
    /// The edited image
    pub image: RgbaImage,

    /// How the background was handled
    pub method: RemovalMethod,

    /// Why the remote API was not used, when the local filter ran instead
    pub fallback_reason: Option<String>,

    /// Dimensions of the decoded input, before any fitting or resizing
    pub original_dimensions: (u32, u32),

    /// Stage timings
    pub timings: ProcessingTimings,

    /// Original input path (for logging purposes)
    pub input_path: Option<String>,
}

impl EditResult {
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether the remote API was asked but the local filter produced the result
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.method == RemovalMethod::Local && self.fallback_reason.is_some()
    }

    /// Encode the result in the given format
    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        OutputFormatHandler::encode(&self.image, format, quality)
    }

    /// Encode and write the result to `path`, recording the encode time
    pub fn save<P: AsRef<Path>>(&mut self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        let encode_start = instant::Instant::now();
        ImageIOService::save_image(&self.image, path.as_ref(), format, quality)?;
        let encode_ms = encode_start.elapsed().as_millis() as u64;
        self.timings.encode_ms = Some(encode_ms);
        log::info!(
            "Saved {} -> {} ({}x{}, {})",
            self.input_path.as_deref().unwrap_or("input"),
            path.as_ref().display(),
            self.image.width(),
            self.image.height(),
            self.method
        );
        Ok(())
    }
}
