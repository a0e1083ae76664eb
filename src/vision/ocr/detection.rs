// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text detection model
//!
//! Finds text regions in a plate crop. The DB model outputs a per-pixel text
//! probability map; regions are recovered by thresholding it and grouping the
//! surviving pixels into 4-connected components.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{ArrayView2, Axis, Ix2};
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

use super::preprocessing::preprocess_for_detection;
use crate::vision::session::OnnxModel;

/// Boxes whose tops differ by less than this are treated as one line
const SAME_LINE_TOLERANCE: f32 = 10.0;

/// DB post-processing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbConfig {
    /// Pixel probability needed to count as text
    pub binary_threshold: f32,
    /// Mean probability a region needs to be kept
    pub box_threshold: f32,
    /// Components with fewer pixels are noise
    pub min_region_pixels: usize,
    /// Outward expansion of each box, relative to area / perimeter
    pub unclip_ratio: f32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 0.3,
            box_threshold: 0.6,
            min_region_pixels: 10,
            unclip_ratio: 1.5,
        }
    }
}

/// A detected text box in crop pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Mean text probability inside the region (0.0-1.0)
    pub confidence: f32,
}

impl TextBox {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Corners clockwise from top-left
    pub fn polygon(&self) -> [[f32; 2]; 4] {
        [
            [self.x1, self.y1],
            [self.x2, self.y1],
            [self.x2, self.y2],
            [self.x1, self.y2],
        ]
    }
}

/// PaddleOCR text detection model (CPU only)
#[derive(Debug)]
pub struct TextRegionDetector {
    model: OnnxModel,
    config: DbConfig,
}

impl TextRegionDetector {
    pub fn load<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model = OnnxModel::load("OCR detection", model_path, intra_threads)?;
        Ok(Self {
            model,
            config: DbConfig::default(),
        })
    }

    /// Detect text boxes in `crop`, in reading order
    pub fn detect(&self, crop: &DynamicImage) -> Result<Vec<TextBox>> {
        let (input, info) = preprocess_for_detection(crop);
        let output = self.model.run(input)?;

        // [1, 1, H, W] or [1, H, W]
        let mut prob = output.view();
        while prob.ndim() > 2 {
            prob = prob.index_axis_move(Axis(0), 0);
        }
        let prob = prob
            .into_dimensionality::<Ix2>()
            .with_context(|| format!("Unexpected OCR detection output shape: {:?}", output.shape()))?;

        let boxes = extract_text_boxes(prob, &self.config)
            .into_iter()
            .filter_map(|b| {
                let (x1, y1) = info.map_to_original(b.x1, b.y1);
                let (x2, y2) = info.map_to_original(b.x2, b.y2);
                let mapped = TextBox {
                    x1,
                    y1,
                    x2,
                    y2,
                    confidence: b.confidence,
                };
                (mapped.width() >= 1.0 && mapped.height() >= 1.0).then_some(mapped)
            })
            .collect::<Vec<_>>();

        let boxes = sort_reading_order(boxes);
        debug!("Detected {} text region(s)", boxes.len());
        Ok(boxes)
    }
}

/// DB post-processing on a probability map.
///
/// Returned boxes are in probability map coordinates (pixel edges, so a
/// single pixel at `(x, y)` spans `x..x+1`), expanded by the unclip ratio and
/// clamped to the map.
pub fn extract_text_boxes(prob: ArrayView2<f32>, config: &DbConfig) -> Vec<TextBox> {
    let (height, width) = prob.dim();
    let mut visited = vec![false; width * height];
    let mut boxes = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] || prob[[y, x]] < config.binary_threshold {
                continue;
            }

            let region = flood_fill(&prob, &mut visited, x, y, config.binary_threshold);
            if region.count < config.min_region_pixels {
                continue;
            }

            let score = region.sum / region.count as f32;
            if score < config.box_threshold {
                continue;
            }

            let x1 = region.min_x as f32;
            let y1 = region.min_y as f32;
            let x2 = (region.max_x + 1) as f32;
            let y2 = (region.max_y + 1) as f32;

            let area = (x2 - x1) * (y2 - y1);
            let perimeter = 2.0 * ((x2 - x1) + (y2 - y1));
            let d = area * config.unclip_ratio / perimeter;

            boxes.push(TextBox {
                x1: (x1 - d).max(0.0),
                y1: (y1 - d).max(0.0),
                x2: (x2 + d).min(width as f32),
                y2: (y2 + d).min(height as f32),
                confidence: score.min(1.0),
            });
        }
    }

    boxes
}

/// Top-to-bottom, then left-to-right within a line
pub fn sort_reading_order(mut boxes: Vec<TextBox>) -> Vec<TextBox> {
    boxes.sort_by(|a, b| a.y1.partial_cmp(&b.y1).unwrap_or(Ordering::Equal));

    // Bubble neighbours on the same line into left-to-right order
    for i in 0..boxes.len() {
        let mut j = i;
        while j > 0
            && (boxes[j].y1 - boxes[j - 1].y1).abs() < SAME_LINE_TOLERANCE
            && boxes[j].x1 < boxes[j - 1].x1
        {
            boxes.swap(j, j - 1);
            j -= 1;
        }
    }

    boxes
}

struct Region {
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
    count: usize,
    sum: f32,
}

/// 4-connected flood fill from `(start_x, start_y)`
fn flood_fill(
    prob: &ArrayView2<f32>,
    visited: &mut [bool],
    start_x: usize,
    start_y: usize,
    threshold: f32,
) -> Region {
    let (height, width) = prob.dim();
    let mut region = Region {
        min_x: start_x,
        max_x: start_x,
        min_y: start_y,
        max_y: start_y,
        count: 0,
        sum: 0.0,
    };
    let mut stack = vec![(start_x, start_y)];

    while let Some((x, y)) = stack.pop() {
        let idx = y * width + x;
        if visited[idx] {
            continue;
        }
        let p = prob[[y, x]];
        if p < threshold {
            continue;
        }

        visited[idx] = true;
        region.count += 1;
        region.sum += p;
        region.min_x = region.min_x.min(x);
        region.max_x = region.max_x.max(x);
        region.min_y = region.min_y.min(y);
        region.max_y = region.max_y.max(y);

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
    }

    region
}
