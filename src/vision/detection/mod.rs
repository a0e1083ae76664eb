// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Number plate detection
//!
//! Two interchangeable backends implement [`PlateDetector`]:
//! - `packaged` - an end-to-end YOLO export with NMS inside the graph
//! - `raw` - a plain YOLO export; NMS and rescaling happen here
//!
//! Both return boxes in original image pixel coordinates.

pub mod packaged;
pub mod postprocess;
pub mod preprocessing;
pub mod yolo;

use anyhow::Result;
use image::DynamicImage;
use serde::Serialize;

pub use packaged::PackagedPlateDetector;
pub use postprocess::PostprocessConfig;
pub use preprocessing::{letterbox, LetterboxInfo, DETECTION_INPUT_SIZE};
pub use yolo::RawYoloDetector;

/// Axis-aligned box, corners in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from YOLO centre/size encoding
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter <= 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    /// Clip to `[0, width] x [0, height]`
    pub fn clip(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }
}

/// A single plate candidate produced by a detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class_id: usize,
}

/// Which detector implementation to load at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DetectorBackend {
    /// End-to-end export, NMS baked into the graph
    Packaged,
    /// Raw per-anchor predictions, NMS done in Rust
    Raw,
}

impl DetectorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorBackend::Packaged => "packaged",
            DetectorBackend::Raw => "raw",
        }
    }
}

/// How one detection is picked for OCR when several are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SelectionPolicy {
    /// Highest confidence wins
    #[default]
    Best,
    /// First detection in model output order
    First,
}

/// Plate detector capability shared by both backends
#[cfg_attr(test, mockall::automock)]
pub trait PlateDetector: Send + Sync {
    /// Detect plates; boxes are in `image` pixel coordinates
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;

    /// Backend identifier reported by `/health`
    fn backend(&self) -> DetectorBackend;
}

/// Pick the detection that goes to OCR, returning its index
pub fn select_detection(detections: &[Detection], policy: SelectionPolicy) -> Option<usize> {
    match policy {
        SelectionPolicy::First => {
            if detections.is_empty() {
                None
            } else {
                Some(0)
            }
        }
        // Ties keep the earliest detection
        SelectionPolicy::Best => detections
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
                Some((_, conf)) if conf >= d.confidence => best,
                _ => Some((i, d.confidence)),
            })
            .map(|(i, _)| i),
    }
}
