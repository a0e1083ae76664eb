// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based plate reading
//!
//! This module provides:
//! - Plate detection via YOLO (packaged or raw ONNX exports)
//! - OCR (Optical Character Recognition) via PaddleOCR
//! - Result image rendering
//!
//! All models run on CPU through ONNX Runtime.

pub mod detection;
pub mod image_utils;
pub mod model_manager;
pub mod ocr;
pub mod render;
pub mod session;

pub use detection::{
    BoundingBox, Detection, DetectorBackend, PlateDetector, SelectionPolicy,
};
pub use image_utils::{crop_region, decode_image_bytes, encode_jpeg, ImageError, ImageInfo};
pub use model_manager::{VisionModelConfig, VisionModelInfo, VisionModelManager};
pub use ocr::{OcrReading, Readings, TextReader};
