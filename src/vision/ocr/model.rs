// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text reader combining PaddleOCR detection and recognition

use anyhow::Result;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use super::detection::{TextBox, TextRegionDetector};
use super::recognition::TextRecognizer;
use crate::vision::image_utils::crop_region;

/// One piece of recognized text inside a plate crop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrReading {
    /// Corners clockwise from top-left, in crop pixel coordinates
    pub polygon: [[f32; 2]; 4],
    pub text: String,
    pub confidence: f32,
}

/// Lazy sequence of readings; each `next()` recognizes one more region
pub type Readings<'a> = Box<dyn Iterator<Item = Result<OcrReading>> + Send + 'a>;

/// OCR engine capability
///
/// `read_text` locates text regions up front and recognizes them on demand,
/// in reading order.
pub trait TextReader: Send + Sync {
    fn read_text<'a>(&'a self, crop: &'a DynamicImage) -> Result<Readings<'a>>;

    /// Engine identifier reported by `/health`
    fn name(&self) -> &'static str;
}

/// PaddleOCR (ONNX) text reader
#[derive(Debug)]
pub struct PaddleTextReader {
    detector: TextRegionDetector,
    recognizer: TextRecognizer,
}

impl PaddleTextReader {
    /// Load detection and recognition models plus dictionary
    pub fn load<P: AsRef<Path>>(
        det_model: P,
        rec_model: P,
        dictionary: P,
        intra_threads: usize,
    ) -> Result<Self> {
        let detector = TextRegionDetector::load(det_model, intra_threads)?;
        let recognizer = TextRecognizer::load(rec_model, dictionary, intra_threads)?;
        debug!(
            "PaddleOCR reader ready ({} dictionary entries)",
            recognizer.dictionary_size()
        );
        Ok(Self {
            detector,
            recognizer,
        })
    }
}

impl TextReader for PaddleTextReader {
    fn read_text<'a>(&'a self, crop: &'a DynamicImage) -> Result<Readings<'a>> {
        let (width, height) = crop.dimensions();
        if width == 0 || height == 0 {
            return Ok(Box::new(std::iter::empty()));
        }

        let mut boxes = self.detector.detect(crop)?;
        if boxes.is_empty() {
            debug!("No text regions found, reading whole {}x{} crop", width, height);
            boxes.push(whole_crop_box(width, height));
        }

        Ok(Box::new(boxes.into_iter().filter_map(move |b| {
            let region = crop_region(crop, b.x1, b.y1, b.x2, b.y2)?;
            Some(self.recognizer.recognize(&region).map(|r| OcrReading {
                polygon: b.polygon(),
                text: r.text,
                confidence: r.confidence,
            }))
        })))
    }

    fn name(&self) -> &'static str {
        "paddleocr"
    }
}

fn whole_crop_box(width: u32, height: u32) -> TextBox {
    TextBox {
        x1: 0.0,
        y1: 0.0,
        x2: width as f32,
        y2: height as f32,
        confidence: 1.0,
    }
}
