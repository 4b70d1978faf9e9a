//! Local brightness-threshold background filter
//!
//! A crude heuristic for images shot against a white or very light backdrop:
//! every pixel that is bright enough is made fully transparent. It has no
//! notion of foreground/background topology, only pixel intensity, and is the
//! fallback when the remote removal API is not available.

use crate::types::{PixelBuffer, CHANNELS};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Default mean-brightness threshold above which a pixel is background
pub const DEFAULT_BRIGHTNESS_THRESHOLD: u8 = 240;

/// Default per-channel threshold for the near-white override
pub const DEFAULT_NEAR_WHITE_THRESHOLD: u8 = 250;

/// Tunable thresholds for the background filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterThresholds {
    /// Pixels whose mean of R, G and B is strictly above this become transparent
    pub brightness: u8,

    /// Pixels whose R, G and B are all strictly above this become transparent
    pub near_white: u8,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS_THRESHOLD,
            near_white: DEFAULT_NEAR_WHITE_THRESHOLD,
        }
    }
}

/// Counters reported by a filter pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Pixels inspected
    pub pixels: usize,
    /// Pixels whose alpha was set to zero
    pub cleared: usize,
}

impl FilterStats {
    /// Fraction of pixels that were cleared (0.0 for an empty image)
    #[must_use]
    pub fn cleared_ratio(&self) -> f64 {
        if self.pixels == 0 {
            0.0
        } else {
            self.cleared as f64 / self.pixels as f64
        }
    }
}

/// Brightness-threshold background filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackgroundFilter {
    thresholds: FilterThresholds,
}

impl BackgroundFilter {
    #[must_use]
    pub fn new(thresholds: FilterThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> FilterThresholds {
        self.thresholds
    }

    /// Whether a pixel with these color channels counts as background
    #[must_use]
    pub fn is_background(&self, r: u8, g: u8, b: u8) -> bool {
        let brightness = (f32::from(r) + f32::from(g) + f32::from(b)) / 3.0;
        if brightness > f32::from(self.thresholds.brightness) {
            return true;
        }

        let white = self.thresholds.near_white;
        r > white && g > white && b > white
    }

    /// Return a copy of `buffer` with background pixels made transparent
    ///
    /// Only the alpha channel is ever written; R, G and B are copied through.
    #[must_use]
    pub fn apply(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let mut output = buffer.clone();
        self.apply_in_place(output.as_bytes_mut());
        output
    }

    /// Filter raw RGBA bytes in place
    ///
    /// A trailing partial pixel (length not a multiple of four) is left untouched.
    pub fn apply_in_place(&self, rgba: &mut [u8]) -> FilterStats {
        let mut stats = FilterStats::default();

        for pixel in rgba.chunks_exact_mut(CHANNELS) {
            stats.pixels += 1;
            if let [r, g, b, a] = pixel {
                if self.is_background(*r, *g, *b) {
                    *a = 0;
                    stats.cleared += 1;
                }
            }
        }

        log::debug!(
            "Background filter cleared {}/{} pixels ({:.1}%)",
            stats.cleared,
            stats.pixels,
            stats.cleared_ratio() * 100.0
        );
        stats
    }

    /// Return a filtered copy of an `image` crate buffer
    #[must_use]
    pub fn apply_image(&self, image: &RgbaImage) -> RgbaImage {
        let mut output = image.clone();
        self.apply_in_place(&mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(pixel: [u8; 4]) -> PixelBuffer {
        PixelBuffer::from_raw(1, 1, pixel.to_vec()).unwrap()
    }

    fn filtered(pixel: [u8; 4]) -> [u8; 4] {
        let out = BackgroundFilter::default().apply(&single(pixel));
        out.pixel(0, 0).unwrap()
    }

    #[test]
    fn test_pure_white_becomes_transparent() {
        assert_eq!(filtered([255, 255, 255, 255]), [255, 255, 255, 0]);
        assert_eq!(filtered([255, 255, 255, 17]), [255, 255, 255, 0]);
    }

    #[test]
    fn test_brightness_threshold_is_strict() {
        // Mean exactly 240 stays
        assert_eq!(filtered([240, 240, 240, 255]), [240, 240, 240, 255]);
        // Mean 241 goes
        assert_eq!(filtered([241, 241, 241, 255]), [241, 241, 241, 0]);
        // Fractional mean 240.33 is above the threshold
        assert_eq!(filtered([241, 240, 240, 200]), [241, 240, 240, 0]);
    }

    #[test]
    fn test_near_white_override() {
        // All channels above 250 is always background
        assert_eq!(filtered([251, 251, 251, 255])[3], 0);
        // One channel at exactly 250 with a low mean stays opaque
        assert_eq!(filtered([250, 0, 0, 255]), [250, 0, 0, 255]);
    }

    #[test]
    fn test_near_white_clause_alone() {
        // Brightness can never exceed 255, so only the per-channel rule can fire
        let filter = BackgroundFilter::new(FilterThresholds {
            brightness: 255,
            near_white: 100,
        });
        assert!(filter.is_background(150, 150, 150));
        let out = filter.apply(&single([150, 150, 150, 255]));
        assert_eq!(out.pixel(0, 0), Some([150, 150, 150, 0]));

        // One channel at the threshold keeps the pixel
        assert!(!filter.is_background(150, 100, 150));
        let out = filter.apply(&single([150, 100, 150, 255]));
        assert_eq!(out.pixel(0, 0), Some([150, 100, 150, 255]));
    }

    #[test]
    fn test_dark_and_saturated_pixels_unchanged() {
        for pixel in [
            [0, 0, 0, 255],
            [255, 0, 0, 255],
            [255, 255, 0, 128],
            [200, 200, 200, 255],
            [255, 255, 200, 255], // mean 236.7
        ] {
            assert_eq!(filtered(pixel), pixel, "pixel {:?} should be kept", pixel);
        }
    }

    #[test]
    fn test_only_alpha_changes() {
        let mut data = Vec::new();
        for v in (0u16..=255).step_by(5) {
            let v = v as u8;
            data.extend_from_slice(&[v, v.wrapping_mul(3), 255 - v, 200]);
        }
        let width = (data.len() / 4) as u32;
        let input = PixelBuffer::from_raw(width, 1, data).unwrap();
        let output = BackgroundFilter::default().apply(&input);

        assert_eq!(output.as_bytes().len(), input.as_bytes().len());
        for (before, after) in input
            .as_bytes()
            .chunks_exact(4)
            .zip(output.as_bytes().chunks_exact(4))
        {
            assert_eq!(&before[..3], &after[..3]);
            assert!(after[3] == before[3] || after[3] == 0);
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let filter = BackgroundFilter::new(FilterThresholds {
            brightness: 100,
            near_white: 250,
        });
        let out = filter.apply(&single([150, 150, 150, 255]));
        assert_eq!(out.pixel(0, 0), Some([150, 150, 150, 0]));

        let strict = BackgroundFilter::new(FilterThresholds {
            brightness: 255,
            near_white: 255,
        });
        // Nothing can exceed 255, so the strictest filter never clears anything
        let out = strict.apply(&single([255, 255, 255, 255]));
        assert_eq!(out.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_apply_in_place_stats() {
        let mut data = vec![
            255, 255, 255, 255, // cleared
            10, 20, 30, 255, // kept
            245, 245, 245, 255, // cleared
            1, 2, // trailing partial pixel
        ];
        let stats = BackgroundFilter::default().apply_in_place(&mut data);
        assert_eq!(stats.pixels, 3);
        assert_eq!(stats.cleared, 2);
        assert_eq!(&data[12..], &[1, 2]);
        assert!((stats.cleared_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_image_matches_buffer_path() {
        let mut image = RgbaImage::new(3, 1);
        image.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        image.put_pixel(1, 0, image::Rgba([90, 60, 30, 255]));
        image.put_pixel(2, 0, image::Rgba([252, 251, 253, 255]));

        let filter = BackgroundFilter::default();
        let via_image = filter.apply_image(&image);
        let via_buffer = filter.apply(&PixelBuffer::from(image));
        assert_eq!(via_image.as_raw(), via_buffer.as_bytes());
        assert_eq!(via_image.get_pixel(1, 0)[3], 255);
        assert_eq!(via_image.get_pixel(2, 0)[3], 0);
    }

    #[test]
    fn test_empty_stats_ratio() {
        assert_eq!(FilterStats::default().cleared_ratio(), 0.0);
    }
}
