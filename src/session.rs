//! Explicit edit state for one loaded image
//!
//! An [`EditSession`] holds the working original and the current edit. Every
//! operation consumes the session and returns the next one, so there is no
//! shared "current image" anywhere.
//!
//! Background removal always starts from the working original; resizing
//! applies to the current edit. Resetting drops all edits.

use crate::{
    config::OutputFormat,
    error::{EditorError, Result},
    filter::{BackgroundFilter, FilterThresholds},
    resize::{self, ResizeRequest},
    services::OutputFormatHandler,
    types::RemovalMethod,
};
use image::{imageops::FilterType, DynamicImage, RgbaImage};

#[derive(Debug, Clone)]
pub struct EditSession {
    original: RgbaImage,
    current: RgbaImage,
    source_dimensions: (u32, u32),
    removal: Option<RemovalMethod>,
}

impl EditSession {
    /// Start a session from a decoded image
    ///
    /// When `max_working_size` is given the image is first shrunk to fit that
    /// box (never enlarged); the fitted image becomes the working original.
    ///
    /// # Errors
    /// - Zero-sized images
    /// - Zero-sized working box
    pub fn load(
        image: &DynamicImage,
        max_working_size: Option<(u32, u32)>,
        filter: FilterType,
    ) -> Result<Self> {
        let rgba = image.to_rgba8();
        let source_dimensions = rgba.dimensions();
        if source_dimensions.0 == 0 || source_dimensions.1 == 0 {
            return Err(EditorError::invalid_dimensions(format!(
                "cannot edit a {}x{} image",
                source_dimensions.0, source_dimensions.1
            )));
        }

        let working = match max_working_size {
            Some((max_width, max_height)) => {
                resize::fit_image(&rgba, max_width, max_height, filter)?
            },
            None => rgba,
        };

        Ok(Self {
            current: working.clone(),
            original: working,
            source_dimensions,
            removal: None,
        })
    }

    /// The image edits start from
    #[must_use]
    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// The image as currently edited
    #[must_use]
    pub fn current(&self) -> &RgbaImage {
        &self.current
    }

    /// Dimensions of the decoded input before fitting
    #[must_use]
    pub fn source_dimensions(&self) -> (u32, u32) {
        self.source_dimensions
    }

    /// How the background was removed, if it was
    #[must_use]
    pub fn removal(&self) -> Option<RemovalMethod> {
        self.removal
    }

    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.removal.is_some() || self.current != self.original
    }

    /// Replace the current edit with the local brightness filter applied to the original
    #[must_use]
    pub fn remove_background_local(self, thresholds: FilterThresholds) -> Self {
        let current = BackgroundFilter::new(thresholds).apply_image(&self.original);
        Self {
            current,
            removal: Some(RemovalMethod::Local),
            ..self
        }
    }

    /// Replace the current edit with an image returned by the removal API
    ///
    /// The API may answer with a different size than was uploaded; the result
    /// is taken as-is.
    #[must_use]
    pub fn with_remote_result(self, image: RgbaImage) -> Self {
        Self {
            current: image,
            removal: Some(RemovalMethod::Remote),
            ..self
        }
    }

    /// Resize the current edit
    pub fn resize(self, request: &ResizeRequest, filter: FilterType) -> Result<Self> {
        let current = resize::resize_image(&self.current, request, filter)?;
        Ok(Self { current, ..self })
    }

    /// Drop all edits and return to the working original
    #[must_use]
    pub fn reset(self) -> Self {
        Self {
            current: self.original.clone(),
            removal: None,
            ..self
        }
    }

    /// Encode the current edit as PNG
    pub fn export_png(&self) -> Result<Vec<u8>> {
        self.export(OutputFormat::Png, 100)
    }

    /// Encode the current edit in any output format
    pub fn export(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        OutputFormatHandler::encode(&self.current, format, quality)
    }

    /// Take the current edit out of the session
    #[must_use]
    pub fn into_current(self) -> RgbaImage {
        self.current
    }
}
