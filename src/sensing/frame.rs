use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

/// Perceptual luminance weights. Scores are only comparable across builds if
/// these stay exactly as they are.
pub const LUMA_R: f64 = 0.299;
pub const LUMA_G: f64 = 0.587;
pub const LUMA_B: f64 = 0.114;

/// Largest possible per-pixel luminance difference.
pub const MAX_LUMA_DELTA: f64 = 255.0;

/// A small, immutable luminance grid used for motion heuristics.
///
/// Built once per sampling tick from a camera frame and dropped as soon as the
/// evidence has been derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    luma: Vec<f64>,
}

impl Frame {
    /// Downsample a camera frame to `width` x `height` and convert to luminance.
    pub fn downsample(image: &DynamicImage, width: u32, height: u32) -> Self {
        let rgb = image.to_rgb8();
        let small = if rgb.width() == width && rgb.height() == height {
            rgb
        } else {
            imageops::resize(&rgb, width, height, FilterType::Triangle)
        };
        Self::from_rgb(&small)
    }

    pub fn from_rgb(image: &RgbImage) -> Self {
        let luma = image
            .pixels()
            .map(|p| luminance(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            luma,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn area(&self) -> usize {
        self.luma.len()
    }

    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Luminance values in row-major order.
    pub fn luma(&self) -> &[f64] {
        &self.luma
    }
}

pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    r as f64 * LUMA_R + g as f64 * LUMA_G + b as f64 * LUMA_B
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn luminance_uses_perceptual_weights() {
        assert!((luminance(255, 255, 255) - 255.0).abs() < 1e-9);
        assert!((luminance(100, 0, 0) - 29.9).abs() < 1e-9);
        assert!((luminance(0, 100, 0) - 58.7).abs() < 1e-9);
        assert!((luminance(0, 0, 100) - 11.4).abs() < 1e-9);
    }

    #[test]
    fn downsample_produces_requested_shape() {
        let big = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 360, Rgb([10, 20, 30])));
        let frame = Frame::downsample(&big, 96, 54);
        assert_eq!((frame.width(), frame.height()), (96, 54));
        assert_eq!(frame.area(), 96 * 54);
        let expected = luminance(10, 20, 30);
        assert!(frame.luma().iter().all(|v| (v - expected).abs() < 1.0));
    }
}
