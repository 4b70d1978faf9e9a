//! Target-size calculation with optional aspect-ratio lock

use crate::error::{EditorError, Result};
use image::{imageops, imageops::FilterType, RgbaImage};
use serde::{Deserialize, Serialize};

/// Width and height, possibly fractional while ratios are being computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether either side is zero (aspect-locked scaling is undefined then)
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// Whole pixels, truncating any fraction, never below one pixel per side
    #[must_use]
    pub fn rounded(&self) -> (u32, u32) {
        (round_side(self.width), round_side(self.height))
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}

fn round_side(value: f64) -> u32 {
    if !value.is_finite() {
        return 1;
    }
    value.trunc().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// A requested output size
///
/// Both sides absent means "keep the current size".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeRequest {
    /// Requested width in pixels
    pub width: Option<f64>,
    /// Requested height in pixels
    pub height: Option<f64>,
    /// Scale both sides proportionally
    pub lock_aspect: bool,
}

impl Default for ResizeRequest {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            lock_aspect: true,
        }
    }
}

impl ResizeRequest {
    #[must_use]
    pub fn new(width: Option<f64>, height: Option<f64>, lock_aspect: bool) -> Self {
        Self {
            width,
            height,
            lock_aspect,
        }
    }

    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_lock_aspect(mut self, lock_aspect: bool) -> Self {
        self.lock_aspect = lock_aspect;
        self
    }

    /// No side requested
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    /// Reject non-positive or non-finite requested sides
    pub fn validate(&self) -> Result<()> {
        for (name, side) in [("width", self.width), ("height", self.height)] {
            if let Some(value) = side {
                if !value.is_finite() || value <= 0.0 {
                    return Err(EditorError::config_value_error(
                        &format!("resize {}", name),
                        value,
                        "> 0",
                        None,
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Compute the output size for `request` applied to an image of size `current`
///
/// With the aspect lock and both sides requested, the more constraining ratio
/// wins so the result fits inside the requested box. A zero-sized source skips
/// the aspect computation and behaves as if the lock were off.
#[must_use]
pub fn calculate_target(current: Dimensions, request: &ResizeRequest) -> Dimensions {
    let width = request.width.unwrap_or(current.width);
    let height = request.height.unwrap_or(current.height);

    if !request.lock_aspect || current.is_degenerate() {
        return Dimensions::new(width, height);
    }

    let aspect = current.aspect_ratio();
    match (request.width, request.height) {
        (Some(w), None) => Dimensions::new(w, w / aspect),
        (None, Some(h)) => Dimensions::new(h * aspect, h),
        (Some(w), Some(h)) => {
            let ratio = (w / current.width).min(h / current.height);
            Dimensions::new(current.width * ratio, current.height * ratio)
        },
        (None, None) => current,
    }
}

/// Scale `current` down to fit inside `max_width` x `max_height`
///
/// Images already inside the box are returned unchanged; nothing is enlarged.
#[must_use]
pub fn fit_within(current: Dimensions, max_width: f64, max_height: f64) -> Dimensions {
    if current.width <= max_width && current.height <= max_height {
        return current;
    }
    let ratio = (max_width / current.width).min(max_height / current.height);
    Dimensions::new(current.width * ratio, current.height * ratio)
}

/// Resize an image according to `request`
///
/// The calculated target is rounded to whole pixels. A no-op request returns a
/// copy of the input.
pub fn resize_image(
    image: &RgbaImage,
    request: &ResizeRequest,
    filter: FilterType,
) -> Result<RgbaImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EditorError::invalid_dimensions(format!(
            "cannot resize a {}x{} image",
            width, height
        )));
    }
    request.validate()?;

    if request.is_noop() {
        return Ok(image.clone());
    }

    let target = calculate_target(Dimensions::from((width, height)), request);
    let (target_width, target_height) = target.rounded();

    tracing::debug!(
        from_width = width,
        from_height = height,
        to_width = target_width,
        to_height = target_height,
        lock_aspect = request.lock_aspect,
        "Resizing image"
    );

    if (target_width, target_height) == (width, height) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, target_width, target_height, filter))
}

/// Shrink an image so it fits inside the given box, keeping its aspect ratio
pub fn fit_image(
    image: &RgbaImage,
    max_width: u32,
    max_height: u32,
    filter: FilterType,
) -> Result<RgbaImage> {
    if max_width == 0 || max_height == 0 {
        return Err(EditorError::invalid_dimensions(format!(
            "fit box {}x{} must be non-zero",
            max_width, max_height
        )));
    }

    let current = Dimensions::from(image.dimensions());
    let target = fit_within(current, f64::from(max_width), f64::from(max_height));
    if target == current {
        return Ok(image.clone());
    }
    let (width, height) = target.rounded();
    Ok(imageops::resize(image, width, height, filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: f64, h: f64) -> Dimensions {
        Dimensions::new(w, h)
    }

    #[test]
    fn test_identity_when_nothing_requested() {
        let current = dims(123.0, 45.0);
        for lock in [true, false] {
            let request = ResizeRequest::new(None, None, lock);
            assert!(request.is_noop());
            assert_eq!(calculate_target(current, &request), current);
        }
    }

    #[test]
    fn test_locked_width_only() {
        let request = ResizeRequest::default().with_width(200.0);
        assert_eq!(calculate_target(dims(100.0, 50.0), &request), dims(200.0, 100.0));
    }

    #[test]
    fn test_locked_height_only() {
        let request = ResizeRequest::default().with_height(25.0);
        assert_eq!(calculate_target(dims(100.0, 50.0), &request), dims(50.0, 25.0));
    }

    #[test]
    fn test_locked_both_uses_narrower_ratio() {
        let request = ResizeRequest::default().with_width(50.0).with_height(200.0);
        assert_eq!(calculate_target(dims(100.0, 100.0), &request), dims(50.0, 50.0));

        // Height is the constraining side here
        let request = ResizeRequest::default().with_width(400.0).with_height(100.0);
        assert_eq!(calculate_target(dims(200.0, 100.0), &request), dims(200.0, 100.0));
    }

    #[test]
    fn test_unlocked_is_independent() {
        let request = ResizeRequest::new(Some(30.0), Some(40.0), false);
        for current in [dims(100.0, 50.0), dims(1.0, 1000.0), dims(0.0, 0.0)] {
            assert_eq!(calculate_target(current, &request), dims(30.0, 40.0));
        }

        let request = ResizeRequest::new(Some(30.0), None, false);
        assert_eq!(calculate_target(dims(100.0, 50.0), &request), dims(30.0, 50.0));
    }

    #[test]
    fn test_degenerate_source_skips_aspect_lock() {
        let request = ResizeRequest::default().with_width(80.0);
        let target = calculate_target(dims(0.0, 50.0), &request);
        assert_eq!(target, dims(80.0, 50.0));
        assert!(target.width.is_finite() && target.height.is_finite());
    }

    #[test]
    fn test_fractional_results_truncate() {
        // 3:1 source, width 100 -> height 33.33
        let request = ResizeRequest::default().with_width(100.0);
        let target = calculate_target(dims(300.0, 100.0), &request);
        assert!((target.height - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(target.rounded(), (100, 33));

        assert_eq!(dims(0.4, 2.5).rounded(), (1, 2));
        assert_eq!(dims(99.99, 7.5).rounded(), (99, 7));
        assert_eq!(dims(f64::NAN, 10.0).rounded(), (1, 10));
    }

    #[test]
    fn test_half_pixel_results_truncate() {
        // 2:3 source, width 101 -> height 151.5
        let request = ResizeRequest::default().with_width(101.0);
        let target = calculate_target(dims(200.0, 300.0), &request);
        assert_eq!(target, dims(101.0, 151.5));
        assert_eq!(target.rounded(), (101, 151));

        // 1000 * (500 / 1003) = 498.50...
        let fitted = fit_within(dims(1000.0, 1003.0), 500.0, 500.0);
        assert_eq!(fitted.rounded(), (498, 500));

        let image = RgbaImage::new(200, 300);
        let resized = resize_image(&image, &request, FilterType::Nearest).unwrap();
        assert_eq!(resized.dimensions(), (101, 151));
    }

    #[test]
    fn test_fit_within_never_enlarges() {
        assert_eq!(fit_within(dims(100.0, 80.0), 500.0, 500.0), dims(100.0, 80.0));
        assert_eq!(fit_within(dims(1000.0, 500.0), 500.0, 500.0), dims(500.0, 250.0));
        assert_eq!(fit_within(dims(400.0, 800.0), 500.0, 500.0), dims(250.0, 500.0));
    }

    #[test]
    fn test_request_validation() {
        assert!(ResizeRequest::default().validate().is_ok());
        assert!(ResizeRequest::default().with_width(10.0).validate().is_ok());
        assert!(ResizeRequest::default().with_width(0.0).validate().is_err());
        assert!(ResizeRequest::default().with_height(-3.0).validate().is_err());
        assert!(ResizeRequest::default().with_height(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_resize_image_applies_rounded_target() {
        let image = RgbaImage::from_pixel(100, 50, image::Rgba([1, 2, 3, 255]));
        let request = ResizeRequest::default().with_height(25.0);
        let resized = resize_image(&image, &request, FilterType::Triangle).unwrap();
        assert_eq!(resized.dimensions(), (50, 25));

        let unlocked = ResizeRequest::new(Some(30.0), Some(40.0), false);
        let resized = resize_image(&image, &unlocked, FilterType::Nearest).unwrap();
        assert_eq!(resized.dimensions(), (30, 40));
    }

    #[test]
    fn test_resize_image_noop_and_errors() {
        let image = RgbaImage::from_pixel(8, 6, image::Rgba([9, 9, 9, 9]));
        let same = resize_image(&image, &ResizeRequest::default(), FilterType::Triangle).unwrap();
        assert_eq!(same, image);

        let empty = RgbaImage::new(0, 6);
        let err = resize_image(&empty, &ResizeRequest::default().with_width(4.0), FilterType::Triangle)
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidDimensions(_)));

        let bad = ResizeRequest::default().with_width(-1.0);
        assert!(resize_image(&image, &bad, FilterType::Triangle).is_err());
    }

    #[test]
    fn test_fit_image() {
        let image = RgbaImage::new(1000, 400);
        let fitted = fit_image(&image, 500, 500, FilterType::Triangle).unwrap();
        assert_eq!(fitted.dimensions(), (500, 200));

        let small = RgbaImage::new(20, 10);
        assert_eq!(fit_image(&small, 500, 500, FilterType::Triangle).unwrap().dimensions(), (20, 10));
        assert!(fit_image(&small, 0, 500, FilterType::Triangle).is_err());
    }
}
