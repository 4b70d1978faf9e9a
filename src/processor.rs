//! Unified edit processor
//!
//! This module provides the `BackgroundRemovalProcessor` that runs a whole
//! edit: fit to the working size, strip the background and resize. The CLI
//! and library callers share it so they behave the same.

use crate::{
    config::{EditorConfig, RemoteConfig},
    error::{EditorError, Result},
    remote::{RemovalBackend, RemovalOutcome, RemoveBgClient},
    services::{ImageIOService, OutputFormatHandler},
    session::EditSession,
    types::{EditResult, ProcessingTimings, RemovalMethod},
};
use image::{imageops::FilterType, DynamicImage};
use instant::Instant;
use log::{debug, info, warn};
use std::path::Path;
use tracing::{instrument, span, Instrument, Level};

/// Factory trait for creating removal backends
pub trait BackendFactory: Send + Sync {
    /// Create the backend for the given remote settings
    ///
    /// `Ok(None)` means no remote backend is configured and the local filter
    /// is the only removal method.
    ///
    /// # Errors
    /// Backend initialization failures.
    fn create_backend(&self, config: &RemoteConfig) -> Result<Option<Box<dyn RemovalBackend>>>;
}

/// Default backend factory: a remove.bg client when an API key is set
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    fn create_backend(&self, config: &RemoteConfig) -> Result<Option<Box<dyn RemovalBackend>>> {
        if !config.is_configured() {
            debug!("No API key configured, local filter only");
            return Ok(None);
        }
        let client = RemoveBgClient::new(config)?;
        debug!("Using removal API at {}", client.endpoint());
        Ok(Some(Box::new(client)))
    }
}

/// Runs edits according to an [`EditorConfig`]
pub struct BackgroundRemovalProcessor {
    config: EditorConfig,
    backend: Option<Box<dyn RemovalBackend>>,
}

impl std::fmt::Debug for BackgroundRemovalProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRemovalProcessor")
            .field("config", &self.config)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl BackgroundRemovalProcessor {
    /// Create a new processor with the default backend factory
    ///
    /// # Errors
    ///
    /// Returns `EditorError` for:
    /// - Invalid configuration
    /// - HTTP client initialization failures
    pub fn new(config: EditorConfig) -> Result<Self> {
        Self::with_factory(config, &DefaultBackendFactory)
    }

    /// Create a new processor with a custom backend factory
    ///
    /// # Errors
    ///
    /// Returns `EditorError` for:
    /// - Invalid configuration
    /// - Backend factory failures
    pub fn with_factory(config: EditorConfig, factory: &dyn BackendFactory) -> Result<Self> {
        config.validate()?;
        let backend = factory.create_backend(&config.remote)?;
        Ok(Self { config, backend })
    }

    /// Create a processor around an already built backend
    ///
    /// # Errors
    /// Invalid configuration.
    pub fn with_backend(config: EditorConfig, backend: Box<dyn RemovalBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            backend: Some(backend),
        })
    }

    /// Get current configuration
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Name of the remote backend, if one is in use
    #[must_use]
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().map(RemovalBackend::name)
    }

    fn filter_type(&self) -> FilterType {
        self.config.resize_filter.into()
    }

    /// Process an image file
    ///
    /// The file must be an image no larger than the configured input limit.
    ///
    /// # Errors
    ///
    /// Returns `EditorError` for:
    /// - File I/O errors when reading input
    /// - Oversized or non-image input
    /// - Decoding and editing failures
    pub async fn process_file<P: AsRef<Path>>(&self, input_path: P) -> Result<EditResult> {
        let input_path = input_path.as_ref();
        let bytes = ImageIOService::read_input(input_path, self.config.max_input_bytes).await?;

        let mut result = self.process_bytes(&bytes).await?;
        result.input_path = Some(input_path.display().to_string());
        Ok(result)
    }

    /// Process encoded image data
    ///
    /// # Examples
    /// ```rust,no_run
    /// use quickcut::{BackgroundRemovalProcessor, EditorConfig, OutputFormat};
    ///
    /// # async fn example(image_data: Vec<u8>) -> anyhow::Result<()> {
    /// let config = EditorConfig::builder().resize_width(800.0).build()?;
    /// let processor = BackgroundRemovalProcessor::new(config)?;
    /// let result = processor.process_bytes(&image_data).await?;
    /// let png = result.to_bytes(OutputFormat::Png, 100)?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `EditorError` for:
    /// - Oversized or non-image input
    /// - Decoding and editing failures
    pub async fn process_bytes(&self, image_bytes: &[u8]) -> Result<EditResult> {
        ImageIOService::validate_input(image_bytes, self.config.max_input_bytes)?;

        let decode_start = Instant::now();
        let image = ImageIOService::load_from_bytes(image_bytes)?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        let mut result = self.process_image(&image).await?;
        result.timings.decode_ms = decode_ms;
        result.timings.total_ms += decode_ms;
        Ok(result)
    }

    /// Process image data from an async reader
    ///
    /// # Errors
    ///
    /// Returns `EditorError` for:
    /// - Stream reading failures
    /// - Oversized or non-image input
    /// - Decoding and editing failures
    pub async fn process_reader<R: tokio::io::AsyncRead + Unpin>(
        &self,
        reader: R,
    ) -> Result<EditResult> {
        let bytes = ImageIOService::read_from_reader(reader, self.config.max_input_bytes).await?;
        self.process_bytes(&bytes).await
    }

    /// Process an already decoded image
    ///
    /// # Errors
    ///
    /// Returns `EditorError` for:
    /// - Zero-sized images
    /// - Remote failures when the local fallback is disabled
    /// - Resize failures
    #[instrument(
        skip(self, image),
        fields(
            backend = self.backend_name().unwrap_or("local"),
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    pub async fn process_image(&self, image: &DynamicImage) -> Result<EditResult> {
        let total_start = Instant::now();
        let mut timings = ProcessingTimings::new();
        let filter = self.filter_type();

        if !self.config.skip_removal {
            OutputFormatHandler::validate_for_background_removal(self.config.output_format);
        }

        let session = EditSession::load(image, self.config.max_working_size, filter)?;
        let original_dimensions = session.source_dimensions();
        if session.original().dimensions() != original_dimensions {
            debug!(
                "Fitted {}x{} input to {}x{} working size",
                original_dimensions.0,
                original_dimensions.1,
                session.original().width(),
                session.original().height()
            );
        }

        let removal_start = Instant::now();
        let (session, fallback_reason) = self.remove_background(session).await?;
        timings.removal_ms = removal_start.elapsed().as_millis() as u64;
        let method = session.removal().unwrap_or(RemovalMethod::Skipped);

        let resize_start = Instant::now();
        let session = if self.config.resize.is_noop() {
            session
        } else {
            let _span = span!(
                Level::DEBUG,
                "resize",
                width = ?self.config.resize.width,
                height = ?self.config.resize.height,
                lock_aspect = self.config.resize.lock_aspect
            )
            .entered();
            session.resize(&self.config.resize, filter)?
        };
        timings.resize_ms = resize_start.elapsed().as_millis() as u64;
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        let image = session.into_current();
        info!(
            "Edited {}x{} -> {}x{} ({}, {})",
            original_dimensions.0,
            original_dimensions.1,
            image.width(),
            image.height(),
            method,
            timings.summary()
        );

        Ok(EditResult {
            image,
            method,
            fallback_reason,
            original_dimensions,
            timings,
            input_path: None,
        })
    }

    /// Strip the background following the configured policy
    ///
    /// Returns the session and, when the local filter stood in for the API,
    /// the reason the API was not used.
    async fn remove_background(
        &self,
        session: EditSession,
    ) -> Result<(EditSession, Option<String>)> {
        if self.config.skip_removal {
            debug!("Background removal skipped");
            return Ok((session, None));
        }

        let Some(backend) = self.backend.as_deref() else {
            return Ok((self.remove_locally(session), None));
        };

        let (width, height) = session.original().dimensions();
        let outcome = backend
            .remove(session.original())
            .instrument(span!(
                Level::INFO,
                "remote_removal",
                backend = backend.name(),
                width,
                height
            ))
            .await;

        let reason = match outcome {
            RemovalOutcome::Success(image) => {
                debug!("{} returned {}x{}", backend.name(), image.width(), image.height());
                return Ok((session.with_remote_result(image), None));
            },
            failure => failure
                .reason()
                .unwrap_or_else(|| "remote removal failed".to_string()),
        };

        if !self.config.fallback_to_local {
            return Err(EditorError::remote_api(reason));
        }

        warn!("Remote removal failed ({}), falling back to local filter", reason);
        Ok((self.remove_locally(session), Some(reason)))
    }

    fn remove_locally(&self, session: EditSession) -> EditSession {
        let _span = span!(
            Level::DEBUG,
            "local_filter",
            brightness = self.config.thresholds.brightness,
            near_white = self.config.thresholds.near_white
        )
        .entered();
        session.remove_background_local(self.config.thresholds)
    }
}
