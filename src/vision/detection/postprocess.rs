// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO output decoding, non-max suppression and rescaling

use anyhow::{Context, Result};
use ndarray::{ArrayViewD, Axis, Ix2};
use std::cmp::Ordering;

use super::{BoundingBox, Detection, LetterboxInfo};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

/// Thresholds applied after inference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostprocessConfig {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }
}

/// Layout of a raw YOLO prediction tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLayout {
    /// `[1, anchors, 5 + classes]`: cx, cy, w, h, objectness, class scores
    AnchorsFirst { num_classes: usize },
    /// `[1, 4 + classes, anchors]`: cx, cy, w, h, class scores (no objectness)
    ChannelsFirst { num_classes: usize },
}

impl RawLayout {
    /// Infer the layout from an output shape.
    ///
    /// Anchor counts (thousands) always dwarf the per-anchor attribute count,
    /// so the smaller trailing dimension is the attribute axis.
    pub fn infer(shape: &[usize]) -> Result<Self> {
        if shape.len() != 3 || shape[0] != 1 {
            anyhow::bail!("Unexpected detector output shape: {:?}, expected [1, A, B]", shape);
        }

        let (rows, cols) = (shape[1], shape[2]);
        if cols >= rows {
            if rows < 5 {
                anyhow::bail!("Detector output has too few channels: {:?}", shape);
            }
            Ok(RawLayout::ChannelsFirst {
                num_classes: rows - 4,
            })
        } else {
            if cols < 6 {
                anyhow::bail!("Detector output has too few attributes: {:?}", shape);
            }
            Ok(RawLayout::AnchorsFirst {
                num_classes: cols - 5,
            })
        }
    }
}

/// Decode raw per-anchor predictions into candidates above the threshold.
///
/// Boxes stay in model input space.
pub fn decode_raw(output: ArrayViewD<f32>, confidence_threshold: f32) -> Result<Vec<Detection>> {
    let layout = RawLayout::infer(output.shape())?;
    let preds = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()
        .context("Detector output is not a batch of 2-D predictions")?;
    let mut candidates = Vec::new();

    match layout {
        RawLayout::AnchorsFirst { num_classes } => {
            for row in preds.axis_iter(Axis(0)) {
                let objectness = row[4];
                if objectness <= confidence_threshold {
                    continue;
                }
                let (class_id, class_score) = argmax((0..num_classes).map(|c| row[5 + c]));
                let confidence = objectness * class_score;
                if confidence > confidence_threshold {
                    candidates.push(Detection {
                        bbox: BoundingBox::from_center(row[0], row[1], row[2], row[3]),
                        confidence,
                        class_id,
                    });
                }
            }
        }
        RawLayout::ChannelsFirst { num_classes } => {
            for anchor in preds.axis_iter(Axis(1)) {
                let (class_id, confidence) = argmax((0..num_classes).map(|c| anchor[4 + c]));
                if confidence > confidence_threshold {
                    candidates.push(Detection {
                        bbox: BoundingBox::from_center(anchor[0], anchor[1], anchor[2], anchor[3]),
                        confidence,
                        class_id,
                    });
                }
            }
        }
    }

    Ok(candidates)
}

/// Decode an end-to-end export: rows of `x1, y1, x2, y2, score, class`.
///
/// Accepts `[1, N, 6]` or `[N, 6]`. Rows keep model order.
pub fn decode_end_to_end(output: ArrayViewD<f32>, confidence_threshold: f32) -> Result<Vec<Detection>> {
    let rows = match output.shape() {
        [1, _, 6] => output.index_axis(Axis(0), 0),
        [_, 6] => output.view(),
        shape => anyhow::bail!(
            "Unexpected packaged detector output shape: {:?}, expected [1, N, 6]",
            shape
        ),
    };
    let rows = rows
        .into_dimensionality::<Ix2>()
        .context("Packaged detector output is not 2-D")?;

    let mut detections = Vec::new();
    for row in rows.axis_iter(Axis(0)) {
        let confidence = row[4];
        if confidence < confidence_threshold {
            continue;
        }
        detections.push(Detection {
            bbox: BoundingBox::new(row[0], row[1], row[2], row[3]),
            confidence,
            class_id: row[5].max(0.0).round() as usize,
        });
    }

    Ok(detections)
}

/// Class-aware greedy NMS, highest confidence first, capped at `max_detections`
pub fn non_max_suppression(
    mut candidates: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        if kept.len() >= max_detections {
            break;
        }
        if suppressed[i] {
            continue;
        }
        kept.push(candidates[i]);
        for j in (i + 1)..candidates.len() {
            if !suppressed[j]
                && candidates[j].class_id == candidates[i].class_id
                && candidates[i].bbox.iou(&candidates[j].bbox) > iou_threshold
            {
                suppressed[j] = true;
            }
        }
    }

    kept
}

/// Map detections from letterboxed model space back to the original image,
/// clipping to its bounds and dropping boxes that collapse to nothing
pub fn rescale(detections: Vec<Detection>, info: &LetterboxInfo) -> Vec<Detection> {
    detections
        .into_iter()
        .filter_map(|d| {
            let (x1, y1) = info.map_to_original(d.bbox.x1, d.bbox.y1);
            let (x2, y2) = info.map_to_original(d.bbox.x2, d.bbox.y2);
            let bbox = BoundingBox::new(x1, y1, x2, y2)
                .clip(info.original_width, info.original_height);
            if bbox.area() > 0.0 {
                Some(Detection { bbox, ..d })
            } else {
                None
            }
        })
        .collect()
}

/// Full raw-head post-processing: decode, threshold, NMS, cap, then map
/// back to the original image
pub fn postprocess_raw(
    output: ArrayViewD<f32>,
    info: &LetterboxInfo,
    config: &PostprocessConfig,
) -> Result<Vec<Detection>> {
    let candidates = decode_raw(output, config.confidence_threshold)?;
    let kept = non_max_suppression(candidates, config.iou_threshold, config.max_detections);
    Ok(rescale(kept, info))
}

fn argmax(scores: impl Iterator<Item = f32>) -> (usize, f32) {
    scores
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(bi, bs), (i, s)| {
            if s > bs {
                (i, s)
            } else {
                (bi, bs)
            }
        })
}
