// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for YOLO plate detectors

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default square model input size
pub const DETECTION_INPUT_SIZE: u32 = 640;

/// Grey used by YOLO for letterbox padding
pub const LETTERBOX_FILL: u8 = 114;

/// Scale and padding applied while letterboxing.
/// Needed to map model-space boxes back onto the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl LetterboxInfo {
    pub fn new(original_width: u32, original_height: u32, target_size: u32) -> Self {
        if original_width == 0 || original_height == 0 {
            return Self {
                scale: 1.0,
                pad_x: 0,
                pad_y: 0,
                original_width,
                original_height,
            };
        }

        let scale = (target_size as f32 / original_width as f32)
            .min(target_size as f32 / original_height as f32);
        let (new_w, new_h) = Self::scaled_dims(original_width, original_height, scale);

        Self {
            scale,
            pad_x: (target_size - new_w) / 2,
            pad_y: (target_size - new_h) / 2,
            original_width,
            original_height,
        }
    }

    fn scaled_dims(width: u32, height: u32, scale: f32) -> (u32, u32) {
        (
            ((width as f32 * scale).round() as u32).max(1),
            ((height as f32 * scale).round() as u32).max(1),
        )
    }

    /// Map a point from model input space back to original image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.scale,
            (y - self.pad_y as f32) / self.scale,
        )
    }
}

/// Letterbox `image` into a `target_size` square tensor.
///
/// Steps:
/// 1. Resize preserving aspect ratio
/// 2. Centre on a grey (114) canvas
/// 3. Scale RGB to [0, 1]
/// 4. Lay out as NCHW `[1, 3, target_size, target_size]`
pub fn letterbox(image: &DynamicImage, target_size: u32) -> (Array4<f32>, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let info = LetterboxInfo::new(orig_w, orig_h, target_size);
    let size = target_size as usize;

    let mut canvas = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([LETTERBOX_FILL, LETTERBOX_FILL, LETTERBOX_FILL]),
    );

    if orig_w > 0 && orig_h > 0 {
        let (new_w, new_h) = LetterboxInfo::scaled_dims(orig_w, orig_h, info.scale);
        let resized = image
            .resize_exact(new_w, new_h, FilterType::Triangle)
            .to_rgb8();
        image::imageops::replace(&mut canvas, &resized, info.pad_x as i64, info.pad_y as i64);
    }

    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, info)
}
