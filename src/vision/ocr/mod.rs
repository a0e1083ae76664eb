// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR integration for reading plate text
//!
//! CPU-only OCR using PaddleOCR ONNX models.
//!
//! Components:
//! - `detection` - Text region detection (DB probability map)
//! - `recognition` - CTC text recognition of each region
//! - `preprocessing` - Image preprocessing for both models
//! - `model` - The lazy [`TextReader`] combining the two

pub mod detection;
pub mod model;
pub mod preprocessing;
pub mod recognition;

pub use detection::{TextBox, TextRegionDetector};
pub use model::{OcrReading, PaddleTextReader, Readings, TextReader};
pub use recognition::{RecognizedText, TextRecognizer};
