// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate recognition pipeline: detect, select, read, annotate, persist
//!
//! Everything here is synchronous and CPU-bound; the HTTP layer calls it from
//! `tokio::task::spawn_blocking`.

use anyhow::{Context, Result};
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::storage::FileStore;
use crate::vision::detection::{select_detection, Detection, PlateDetector, SelectionPolicy};
use crate::vision::image_utils::{crop_region, encode_jpeg, load_image_file};
use crate::vision::ocr::TextReader;
use crate::vision::render::draw_detections;

/// Text reported when no plate (or no plate text) was found
pub const PLATE_NOT_DETECTED: &str = "Plate not detected";

/// Outcome of one recognition run
#[derive(Debug, Clone, Serialize)]
pub struct Recognition {
    /// Plate text or [`PLATE_NOT_DETECTED`]
    pub text: String,
    pub selected: Option<Detection>,
    pub detection_count: usize,
    /// Result image name inside the static directory
    pub result_file: String,
    pub processing_time_ms: u64,
}

impl Recognition {
    pub fn plate_found(&self) -> bool {
        self.text != PLATE_NOT_DETECTED
    }
}

/// Owns the loaded models and the file store
pub struct PlateRecognizer {
    detector: Arc<dyn PlateDetector>,
    reader: Arc<dyn TextReader>,
    store: FileStore,
    policy: SelectionPolicy,
}

impl PlateRecognizer {
    pub fn new(
        detector: Arc<dyn PlateDetector>,
        reader: Arc<dyn TextReader>,
        store: FileStore,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            detector,
            reader,
            store,
            policy,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.backend().as_str()
    }

    pub fn reader_name(&self) -> &'static str {
        self.reader.name()
    }

    /// Save an upload under its (sanitized) filename and recognize it
    pub fn process_upload(&self, filename: &str, bytes: &[u8]) -> Result<Recognition> {
        let path = self.store.save_upload(filename, bytes)?;
        self.recognize_file(&path)
    }

    /// Recognize an image already on disk
    pub fn recognize_file(&self, path: &Path) -> Result<Recognition> {
        let (image, info) = load_image_file(path)
            .with_context(|| format!("Failed to load image {}", path.display()))?;
        debug!(
            "Loaded {} ({}x{}, {:?})",
            path.display(),
            info.width,
            info.height,
            info.format
        );
        self.recognize(&image)
    }

    /// Run the full pipeline on a decoded image
    pub fn recognize(&self, image: &DynamicImage) -> Result<Recognition> {
        let start = Instant::now();

        let detections = self.detector.detect(image).context("Plate detection failed")?;
        let selected = select_detection(&detections, self.policy);

        let text = match selected {
            Some(index) => self.read_plate(image, &detections[index])?,
            None => None,
        };

        let annotated = DynamicImage::ImageRgb8(draw_detections(image, &detections, selected));
        let jpeg = encode_jpeg(&annotated).context("Failed to encode result image")?;
        let result_file = self.store.save_result(&jpeg)?;

        let recognition = Recognition {
            text: text.unwrap_or_else(|| PLATE_NOT_DETECTED.to_string()),
            selected: selected.map(|i| detections[i]),
            detection_count: detections.len(),
            result_file,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Recognized '{}' ({} detection(s), {}ms)",
            recognition.text, recognition.detection_count, recognition.processing_time_ms
        );

        Ok(recognition)
    }

    /// Crop the plate and take the first OCR reading, if it has any text
    fn read_plate(&self, image: &DynamicImage, detection: &Detection) -> Result<Option<String>> {
        let b = detection.bbox;
        let Some(crop) = crop_region(image, b.x1, b.y1, b.x2, b.y2) else {
            debug!("Selected detection crops to an empty region");
            return Ok(None);
        };

        let mut readings = self.reader.read_text(&crop).context("Text reading failed")?;
        let first = match readings.next() {
            Some(reading) => reading.context("Text recognition failed")?,
            None => return Ok(None),
        };

        let text = first.text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}
