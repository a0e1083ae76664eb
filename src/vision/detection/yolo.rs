// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Raw YOLO plate detector
//!
//! Runs a plain YOLO export (v5 `[1, anchors, 5 + nc]` or v8
//! `[1, 4 + nc, anchors]`) and performs thresholding, class-aware NMS and
//! letterbox rescaling in Rust.

use anyhow::Result;
use image::DynamicImage;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::postprocess::{postprocess_raw, PostprocessConfig};
use super::preprocessing::letterbox;
use super::{Detection, DetectorBackend, PlateDetector};
use crate::vision::session::OnnxModel;

#[derive(Debug)]
pub struct RawYoloDetector {
    model: OnnxModel,
    input_size: u32,
    config: PostprocessConfig,
}

impl RawYoloDetector {
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        input_size: u32,
        config: PostprocessConfig,
        intra_threads: usize,
    ) -> Result<Self> {
        let model = OnnxModel::load("plate detector", model_path, intra_threads)?;
        Ok(Self {
            model,
            input_size,
            config,
        })
    }
}

impl PlateDetector for RawYoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let start = Instant::now();
        let (tensor, info) = letterbox(image, self.input_size);
        let output = self.model.run(tensor)?;

        let detections = postprocess_raw(output.view(), &info, &self.config)?;

        debug!(
            "Raw detector: {} detections in {}ms",
            detections.len(),
            start.elapsed().as_millis()
        );

        Ok(detections)
    }

    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Raw
    }
}
