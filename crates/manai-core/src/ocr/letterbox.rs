//! Aspect-preserving fit of an arbitrary image into a square model input.

use serde::{Deserialize, Serialize};

/// Scale and padding that place an image inside a square model input.
///
/// Padding is split with integer division, so the right/bottom margin can
/// be one pixel wider than the left/top one. Use `pad_left..pad_left +
/// new_width` (and the vertical equivalent) as the content interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LetterboxParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub new_width: u32,
    pub new_height: u32,
    pub pad_left: u32,
    pub pad_top: u32,
}

/// Compute the letterbox for an `orig_width x orig_height` image and a
/// square input of side `input_size`.
///
/// Both dimensions must be non-zero.
pub fn compute_letterbox_params(orig_width: u32, orig_height: u32, input_size: u32) -> LetterboxParams {
    let size = input_size as f32;
    let scale = (size / orig_width as f32).min(size / orig_height as f32);
    let new_width = ((orig_width as f32 * scale).round() as u32).min(input_size);
    let new_height = ((orig_height as f32 * scale).round() as u32).min(input_size);

    LetterboxParams {
        orig_width,
        orig_height,
        scale,
        new_width,
        new_height,
        pad_left: (input_size - new_width) / 2,
        pad_top: (input_size - new_height) / 2,
    }
}

impl LetterboxParams {
    /// Right edge (exclusive) of the content area in model space.
    pub fn content_right(&self) -> u32 {
        self.pad_left + self.new_width
    }

    /// Bottom edge (exclusive) of the content area in model space.
    pub fn content_bottom(&self) -> u32 {
        self.pad_top + self.new_height
    }

    /// Whether a model-space pixel lies in the content area.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.pad_left && x < self.content_right() && y >= self.pad_top && y < self.content_bottom()
    }

    /// Map a model-space x coordinate back to the original image.
    pub fn to_original_x(&self, x: f32) -> f32 {
        ((x - self.pad_left as f32) / self.scale).clamp(0.0, self.orig_width as f32)
    }

    /// Map a model-space y coordinate back to the original image.
    pub fn to_original_y(&self, y: f32) -> f32 {
        ((y - self.pad_top as f32) / self.scale).clamp(0.0, self.orig_height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_landscape() {
        let lb = compute_letterbox_params(1280, 720, 640);
        assert_eq!(lb.orig_width, 1280);
        assert_eq!(lb.orig_height, 720);
        assert!((lb.scale - 0.5).abs() < 1e-4);
        assert_eq!(lb.new_width, 640);
        assert_eq!(lb.new_height, 360);
        assert_eq!(lb.pad_left, 0);
        assert_eq!(lb.pad_top, 140);
    }

    #[test]
    fn test_portrait() {
        let lb = compute_letterbox_params(480, 960, 640);
        assert!((lb.scale - 0.6667).abs() < 1e-3);
        assert_eq!(lb.new_width, 320);
        assert_eq!(lb.new_height, 640);
        assert_eq!(lb.pad_left, 160);
        assert_eq!(lb.pad_top, 0);
    }

    #[test]
    fn test_square_is_identity() {
        let lb = compute_letterbox_params(640, 640, 640);
        assert_eq!(lb.scale, 1.0);
        assert_eq!((lb.new_width, lb.new_height), (640, 640));
        assert_eq!((lb.pad_left, lb.pad_top), (0, 0));
    }

    #[test]
    fn test_odd_padding_is_asymmetric() {
        // 100x97 -> 640x621, leaving 19 rows: 9 on top, 10 below.
        let lb = compute_letterbox_params(100, 97, 640);
        assert_eq!(lb.new_height, 621);
        assert_eq!(lb.pad_top, 9);
        assert_eq!(640 - lb.content_bottom(), 10);
    }

    #[test]
    fn test_upscales_small_images() {
        let lb = compute_letterbox_params(320, 160, 640);
        assert_eq!(lb.scale, 2.0);
        assert_eq!((lb.new_width, lb.new_height), (640, 320));
        assert_eq!(lb.pad_top, 160);
    }

    #[test]
    fn test_contains_uses_content_interval() {
        let lb = compute_letterbox_params(1280, 720, 640);
        assert!(!lb.contains(0, 139));
        assert!(lb.contains(0, 140));
        assert!(lb.contains(639, 499));
        assert!(!lb.contains(639, 500));
    }

    #[test]
    fn test_inverse_mapping_clamps() {
        let lb = compute_letterbox_params(1280, 720, 640);
        assert_eq!(lb.to_original_x(150.0), 300.0);
        assert_eq!(lb.to_original_y(200.0), 120.0);
        assert_eq!(lb.to_original_y(100.0), 0.0);
        assert_eq!(lb.to_original_y(600.0), 720.0);
        assert_eq!(lb.to_original_x(-5.0), 0.0);
    }
}
