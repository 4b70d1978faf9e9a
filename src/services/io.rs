//! Image I/O operations service
//!
//! This module separates reading, validating and writing image files from the
//! editing logic, making the system more testable and maintainable.

use crate::{
    config::OutputFormat,
    error::{EditorError, Result},
    services::OutputFormatHandler,
};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File name used when there is no input name to derive one from
pub const DEFAULT_DOWNLOAD_NAME: &str = "background-removed-image.png";

/// Suffix appended to the input stem for derived output names
const OUTPUT_SUFFIX: &str = "-background-removed";

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Check that `bytes` look like an acceptable image upload
    ///
    /// Rejects data larger than `max_bytes` and data whose content is not a
    /// recognised image. File names are never trusted: every supported format
    /// carries a signature, so content the sniffer misses cannot be decoded.
    ///
    /// # Returns
    /// The detected image format.
    ///
    /// # Errors
    /// `EditorError::InvalidInput` for oversized or non-image data.
    pub fn validate_input(bytes: &[u8], max_bytes: u64) -> Result<ImageFormat> {
        Self::check_size(bytes.len() as u64, max_bytes)?;

        image::guess_format(bytes).map_err(|e| {
            log::debug!("Content sniffing failed for {} bytes: {}", bytes.len(), e);
            EditorError::invalid_input("Please select an image file!")
        })
    }

    fn check_size(len: u64, max_bytes: u64) -> Result<()> {
        if len > max_bytes {
            let limit_mb = max_bytes as f64 / (1024.0 * 1024.0);
            return Err(EditorError::invalid_input(format!(
                "File size should be less than {}MB! ({} bytes given)",
                limit_mb, len
            )));
        }
        Ok(())
    }

    /// Read an input file, enforcing the size limit before reading it whole
    pub async fn read_input<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();

        let metadata = tokio::fs::metadata(path_ref)
            .await
            .map_err(|e| EditorError::file_io_error("read image file", path_ref, &e))?;
        if !metadata.is_file() {
            return Err(EditorError::invalid_input(format!(
                "{} is not a file",
                path_ref.display()
            )));
        }
        Self::check_size(metadata.len(), max_bytes)?;

        let bytes = tokio::fs::read(path_ref)
            .await
            .map_err(|e| EditorError::file_io_error("read image data", path_ref, &e))?;
        Self::validate_input(&bytes, max_bytes)?;
        Ok(bytes)
    }

    /// Read from an async reader, failing once more than `max_bytes` arrive
    pub async fn read_from_reader<R: tokio::io::AsyncRead + Unpin>(
        reader: R,
        max_bytes: u64,
    ) -> Result<Vec<u8>> {
        use tokio::io::AsyncReadExt;

        // One extra byte tells an exactly-full stream apart from an oversized one
        let mut limited = reader.take(max_bytes.saturating_add(1));
        let mut buffer = Vec::new();
        limited
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| EditorError::processing(format!("Failed to read from stream: {}", e)))?;

        Self::validate_input(&buffer, max_bytes)?;
        Ok(buffer)
    }

    /// Read, validate and decode an image file
    pub async fn load_image<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<DynamicImage> {
        let bytes = Self::read_input(path, max_bytes).await?;
        Self::load_from_bytes(&bytes)
    }

    /// Decode an image from bytes
    ///
    /// # Examples
    /// ```rust,no_run
    /// use quickcut::services::ImageIOService;
    ///
    /// let image_data = std::fs::read("input.jpg")?;
    /// let image = ImageIOService::load_from_bytes(&image_data)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            EditorError::processing_stage_error(
                "image decoding",
                &e.to_string(),
                Some(&format!("{} bytes", bytes.len())),
            )
        })
    }

    /// Save an image to a file in the given format
    ///
    /// Parent directories are created as needed.
    pub fn save_image<P: AsRef<Path>>(
        image: &RgbaImage,
        path: P,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                EditorError::file_io_error("create output directory", parent, &e)
            })?;
        }

        let bytes = OutputFormatHandler::encode(image, format, quality)?;
        std::fs::write(path_ref, bytes)
            .map_err(|e| EditorError::file_io_error("write output image", path_ref, &e))
    }

    /// Check if a file path has a supported image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| {
                matches!(
                    ext.as_str(),
                    "jpg" | "jpeg" | "png" | "webp" | "tiff" | "tif" | "bmp" | "gif"
                )
            })
    }

    /// Output path next to `input`: `<stem>-background-removed.<ext>`
    pub fn default_output_path<P: AsRef<Path>>(input: P, format: OutputFormat) -> PathBuf {
        let input = input.as_ref();
        let extension = OutputFormatHandler::get_extension(format);
        match input.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => input.with_file_name(format!("{}{}.{}", stem, OUTPUT_SUFFIX, extension)),
            None => PathBuf::from(DEFAULT_DOWNLOAD_NAME).with_extension(extension),
        }
    }

    /// Output path for `input` inside the batch output directory `dir`
    pub fn output_path_in_dir<P: AsRef<Path>, D: AsRef<Path>>(
        input: P,
        dir: D,
        format: OutputFormat,
    ) -> PathBuf {
        let derived = Self::default_output_path(input, format);
        let file_name = derived.file_name().map_or_else(
            || OsString::from(DEFAULT_DOWNLOAD_NAME),
            std::ffi::OsStr::to_os_string,
        );
        dir.as_ref().join(file_name)
    }
}
