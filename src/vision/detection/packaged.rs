// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Packaged plate detector
//!
//! Wraps a YOLO export with NMS inside the graph. The model emits rows of
//! `x1, y1, x2, y2, score, class` in letterboxed input space, already ordered
//! by the exporter.

use anyhow::Result;
use image::DynamicImage;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::postprocess::{decode_end_to_end, rescale, PostprocessConfig};
use super::preprocessing::letterbox;
use super::{Detection, DetectorBackend, PlateDetector};
use crate::vision::session::OnnxModel;

#[derive(Debug)]
pub struct PackagedPlateDetector {
    model: OnnxModel,
    input_size: u32,
    config: PostprocessConfig,
}

impl PackagedPlateDetector {
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

impl PlateDetector for PackagedPlateDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let start = Instant::now();
        let (tensor, info) = letterbox(image, self.input_size);
        let output = self.model.run(tensor)?;

        let mut detections = decode_end_to_end(output.view(), self.config.confidence_threshold)?;
        detections.truncate(self.config.max_detections);
        let detections = rescale(detections, &info);

        debug!(
            "Packaged detector found {} plate(s) in {}ms",
            detections.len(),
            start.elapsed().as_millis()
        );

        Ok(detections)
    }

    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Packaged
    }
}
