//! Configuration types for editing operations

use crate::{filter::FilterThresholds, resize::ResizeRequest};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Default remove.bg compatible endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Largest accepted input file (10 MiB)
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG (no transparency, alpha is dropped)
    Jpeg,
    /// WebP with alpha channel transparency
    #[cfg(feature = "webp-support")]
    WebP,
    /// TIFF with alpha channel transparency and lossless compression
    Tiff,
    /// Raw RGBA8 pixel data (4 bytes per pixel)
    Rgba8,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

/// Resampling filter used when the image is resized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeFilter {
    Nearest,
    /// Bilinear, closest to what a browser canvas does when drawing scaled
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl Default for ResizeFilter {
    fn default() -> Self {
        Self::Triangle
    }
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Settings for the remote removal API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// API key sent as `X-Api-Key`; without one the API is never called
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Endpoint accepting a multipart `image_file` upload
    pub endpoint: String,

    /// Value of the `size` form field
    pub size: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_API_ENDPOINT.to_string(),
            size: "auto".to_string(),
            timeout_secs: 60,
        }
    }
}

impl RemoteConfig {
    /// Whether a non-blank API key is present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

/// Configuration for an edit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Output format
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// Thresholds for the local background filter
    pub thresholds: FilterThresholds,

    /// Remote removal API settings
    pub remote: RemoteConfig,

    /// Run the local filter when the remote API is unavailable or fails (default: true)
    pub fallback_to_local: bool,

    /// Only resize, leave the background alone
    pub skip_removal: bool,

    /// Requested output size
    pub resize: ResizeRequest,

    /// Resampling filter for resizing and fitting
    pub resize_filter: ResizeFilter,

    /// Shrink the input to fit this box before editing (None = keep full size)
    pub max_working_size: Option<(u32, u32)>,

    /// Largest accepted input file in bytes
    pub max_input_bytes: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
            thresholds: FilterThresholds::default(),
            remote: RemoteConfig::default(),
            fallback_to_local: true,
            skip_removal: false,
            resize: ResizeRequest::default(),
            resize_filter: ResizeFilter::default(),
            max_working_size: None,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl EditorConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use quickcut::{EditorConfig, OutputFormat};
    ///
    /// let config = EditorConfig::builder()
    ///     .output_format(OutputFormat::Png)
    ///     .resize_width(800.0)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.resize.width, Some(800.0));
    /// ```
    #[must_use]
    pub fn builder() -> EditorConfigBuilder {
        EditorConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - JPEG quality above 100
    /// - Zero timeout or an endpoint that is not an http(s) URL
    /// - Non-positive resize targets
    /// - Zero-sized working box or zero input limit
    pub fn validate(&self) -> crate::Result<()> {
        if self.jpeg_quality > 100 {
            return Err(crate::error::EditorError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
                Some(90),
            ));
        }

        if self.remote.timeout_secs == 0 {
            return Err(crate::error::EditorError::config_value_error(
                "API timeout",
                self.remote.timeout_secs,
                "> 0 seconds",
                Some(60),
            ));
        }

        if !(self.remote.endpoint.starts_with("http://")
            || self.remote.endpoint.starts_with("https://"))
        {
            return Err(crate::error::EditorError::invalid_config(format!(
                "API endpoint must be an http(s) URL, got '{}'",
                self.remote.endpoint
            )));
        }

        self.resize.validate()?;

        if let Some((width, height)) = self.max_working_size {
            if width == 0 || height == 0 {
                return Err(crate::error::EditorError::invalid_config(format!(
                    "Working size box must be non-zero, got {}x{}",
                    width, height
                )));
            }
        }

        if self.max_input_bytes == 0 {
            return Err(crate::error::EditorError::invalid_config(
                "Maximum input size must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Builder for `EditorConfig`
#[derive(Debug, Default)]
pub struct EditorConfigBuilder {
    config: EditorConfig,
}

impl EditorConfigBuilder {
    /// Set output format
    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Set JPEG quality
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    /// Set both filter thresholds
    #[must_use]
    pub fn thresholds(mut self, thresholds: FilterThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn brightness_threshold(mut self, threshold: u8) -> Self {
        self.config.thresholds.brightness = threshold;
        self
    }

    #[must_use]
    pub fn near_white_threshold(mut self, threshold: u8) -> Self {
        self.config.thresholds.near_white = threshold;
        self
    }

    /// Set the remote API key; blank keys count as unconfigured
    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, key: Option<S>) -> Self {
        self.config.remote.api_key = key.map(Into::into);
        self
    }

    #[must_use]
    pub fn api_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.remote.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.remote.timeout_secs = secs;
        self
    }

    /// Enable or disable the local fallback after a remote failure
    #[must_use]
    pub fn fallback_to_local(mut self, fallback: bool) -> Self {
        self.config.fallback_to_local = fallback;
        self
    }

    #[must_use]
    pub fn skip_removal(mut self, skip: bool) -> Self {
        self.config.skip_removal = skip;
        self
    }

    /// Set the whole resize request
    #[must_use]
    pub fn resize(mut self, request: ResizeRequest) -> Self {
        self.config.resize = request;
        self
    }

    #[must_use]
    pub fn resize_width(mut self, width: f64) -> Self {
        self.config.resize.width = Some(width);
        self
    }

    #[must_use]
    pub fn resize_height(mut self, height: f64) -> Self {
        self.config.resize.height = Some(height);
        self
    }

    #[must_use]
    pub fn lock_aspect(mut self, lock: bool) -> Self {
        self.config.resize.lock_aspect = lock;
        self
    }

    #[must_use]
    pub fn resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.config.resize_filter = filter;
        self
    }

    #[must_use]
    pub fn max_working_size(mut self, size: Option<(u32, u32)>) -> Self {
        self.config.max_working_size = size;
        self
    }

    #[must_use]
    pub fn max_input_bytes(mut self, bytes: u64) -> Self {
        self.config.max_input_bytes = bytes;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// Any rule checked by [`EditorConfig::validate`].
    pub fn build(self) -> crate::Result<EditorConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}
