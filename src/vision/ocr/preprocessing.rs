// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for PaddleOCR

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::Array4;

/// Longest side allowed for the text detection input
pub const DET_LIMIT_SIDE: u32 = 960;

/// Shortest side the text detection input is upscaled to
pub const DET_MIN_SIDE: u32 = 64;

/// DB detection works on multiples of 32
const DET_STRIDE: u32 = 32;

/// Recognition model input height (PP-OCR English models use 48)
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 320;

/// Mean values for detection normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for detection normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Ratios between the detection input and the original crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetResizeInfo {
    pub ratio_x: f32,
    pub ratio_y: f32,
    pub original_width: u32,
    pub original_height: u32,
}

impl DetResizeInfo {
    /// Map a point from detection input space back to the crop
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x / self.ratio_x).clamp(0.0, self.original_width as f32),
            (y / self.ratio_y).clamp(0.0, self.original_height as f32),
        )
    }
}

/// Target size for the detection input: the shortest side lifted to
/// `DET_MIN_SIDE`, both rounded to a multiple of 32. The longest side never
/// exceeds `DET_LIMIT_SIDE`, which wins over the minimum for very thin crops.
pub fn detection_target_size(width: u32, height: u32) -> (u32, u32) {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let mut ratio = 1.0_f32;

    if w.max(h) > DET_LIMIT_SIDE as f32 {
        ratio = DET_LIMIT_SIDE as f32 / w.max(h);
    }
    if w.min(h) * ratio < DET_MIN_SIDE as f32 {
        ratio = DET_MIN_SIDE as f32 / w.min(h);
    }
    ratio = ratio.min(DET_LIMIT_SIDE as f32 / w.max(h));

    let round = |v: f32| -> u32 {
        let stride = DET_STRIDE as f32;
        (((v / stride).round() * stride) as u32).max(DET_STRIDE)
    };

    (round(w * ratio), round(h * ratio))
}

/// Preprocess a plate crop for text detection
///
/// Steps:
/// 1. Resize to `detection_target_size` (aspect ratio roughly preserved)
/// 2. Normalize with ImageNet mean/std: (pixel/255 - mean) / std
/// 3. Convert to NCHW tensor format [1, 3, H, W]
pub fn preprocess_for_detection(image: &DynamicImage) -> (Array4<f32>, DetResizeInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let (target_w, target_h) = detection_target_size(orig_w, orig_h);

    let rgb = image
        .resize_exact(target_w, target_h, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Array4::zeros((1, 3, target_h as usize, target_w as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    let info = DetResizeInfo {
        ratio_x: target_w as f32 / orig_w.max(1) as f32,
        ratio_y: target_h as f32 / orig_h.max(1) as f32,
        original_width: orig_w,
        original_height: orig_h,
    };

    (tensor, info)
}

/// Preprocess a text region for recognition
///
/// Resizes to height 48 with dynamic width (max 320) and normalizes each
/// channel to `[-1, 1]`.
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();

    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).round() as u32)
        .min(REC_MAX_WIDTH)
        .max(4);

    let rgb = image
        .resize_exact(new_width, REC_INPUT_HEIGHT, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Array4::zeros((1, 3, REC_INPUT_HEIGHT as usize, new_width as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    tensor
}
