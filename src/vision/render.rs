// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Annotated result image rendering

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::vision::detection::Detection;

/// Box colour for detections that were not read
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Box colour for the detection passed to OCR
pub const SELECTED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Outline width in pixels
pub const BOX_THICKNESS: u32 = 3;

/// Draw every detection onto a copy of `image`.
///
/// The `selected` detection is outlined in [`SELECTED_COLOR`].
pub fn draw_detections(
    image: &DynamicImage,
    detections: &[Detection],
    selected: Option<usize>,
) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for (i, detection) in detections.iter().enumerate() {
        let color = if Some(i) == selected {
            SELECTED_COLOR
        } else {
            BOX_COLOR
        };

        let b = detection.bbox;
        // Nested 1px rectangles grown inwards give the outline its width
        for t in 0..BOX_THICKNESS {
            let inset = t as f32;
            let w = (b.width() - 2.0 * inset).round();
            let h = (b.height() - 2.0 * inset).round();
            if w < 1.0 || h < 1.0 {
                break;
            }
            let rect = Rect::at((b.x1 + inset) as i32, (b.y1 + inset) as i32)
                .of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    canvas
}
