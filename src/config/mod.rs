// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration
//!
//! Every option can be passed as a flag or through a `PLATE_*` environment
//! variable (a `.env` file is loaded first by `main`).

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::storage::{FileStore, ResultNaming};
use crate::vision::detection::{DetectorBackend, PostprocessConfig, SelectionPolicy};
use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::vision::model_manager::VisionModelConfig;

/// Number plate detection and OCR backend
#[derive(Parser, Debug, Clone)]
#[command(name = "plate-reader-node")]
#[command(version)]
#[command(about = "HTTP backend that detects number plates and reads them with OCR", long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "PLATE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PLATE_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Where raw uploads are written
    #[arg(long, env = "PLATE_UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Where annotated results are written and served from under /static
    #[arg(long, env = "PLATE_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Plate detector ONNX weights
    #[arg(long, env = "PLATE_DETECTOR_MODEL", default_value = "models/best.onnx")]
    pub detector_model: PathBuf,

    /// Detector export flavour
    #[arg(long, env = "PLATE_DETECTOR_BACKEND", value_enum, default_value_t = DetectorBackend::Packaged)]
    pub detector_backend: DetectorBackend,

    /// Square detector input size in pixels
    #[arg(long, env = "PLATE_INPUT_SIZE", default_value_t = 640)]
    pub input_size: u32,

    #[arg(long, env = "PLATE_CONFIDENCE", default_value_t = 0.25)]
    pub confidence_threshold: f32,

    #[arg(long, env = "PLATE_IOU", default_value_t = 0.45)]
    pub iou_threshold: f32,

    #[arg(long, env = "PLATE_MAX_DETECTIONS", default_value_t = 300)]
    pub max_detections: usize,

    /// Which detection is read when several are found
    #[arg(long, env = "PLATE_SELECTION", value_enum, default_value_t = SelectionPolicy::Best)]
    pub selection: SelectionPolicy,

    /// Directory containing the PaddleOCR ONNX models
    #[arg(long, env = "PLATE_OCR_DIR", default_value = "models/paddleocr-onnx")]
    pub ocr_model_dir: PathBuf,

    #[arg(long, env = "PLATE_OCR_DET_FILE", default_value = "det_model.onnx")]
    pub ocr_det_file: String,

    #[arg(long, env = "PLATE_OCR_REC_FILE", default_value = "rec_model.onnx")]
    pub ocr_rec_file: String,

    #[arg(long, env = "PLATE_OCR_DICT_FILE", default_value = "en_dict.txt")]
    pub ocr_dict_file: String,

    /// `unique` writes result-<uuid>.jpg per request, `fixed` overwrites result.jpg
    #[arg(long, env = "PLATE_RESULT_NAMING", value_enum, default_value_t = ResultNaming::Unique)]
    pub result_naming: ResultNaming,

    /// Maximum request body size in bytes
    #[arg(long, env = "PLATE_MAX_UPLOAD_BYTES", default_value_t = MAX_IMAGE_SIZE)]
    pub max_upload_bytes: usize,

    /// ONNX Runtime intra-op threads per model
    #[arg(long, env = "PLATE_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl ServerConfig {
    /// Reject out-of-range values before anything is loaded
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("confidence threshold", self.confidence_threshold),
            ("IoU threshold", self.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be within [0, 1], got {}", name, value));
            }
        }

        for (name, value) in [
            ("input size", self.input_size as usize),
            ("max detections", self.max_detections),
            ("max upload bytes", self.max_upload_bytes),
            ("intra threads", self.intra_threads),
        ] {
            if value == 0 {
                return Err(anyhow!("{} must be greater than zero", name));
            }
        }

        if self.max_upload_bytes > MAX_IMAGE_SIZE {
            return Err(anyhow!(
                "max upload bytes ({}) exceeds the image decoder limit ({})",
                self.max_upload_bytes,
                MAX_IMAGE_SIZE
            ));
        }

        if self.input_size % 32 != 0 {
            return Err(anyhow!(
                "input size must be a multiple of 32, got {}",
                self.input_size
            ));
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn postprocess(&self) -> PostprocessConfig {
        PostprocessConfig {
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        }
    }

    pub fn vision_model_config(&self) -> VisionModelConfig {
        VisionModelConfig {
            detector_backend: self.detector_backend,
            detector_model: self.detector_model.clone(),
            detector_input_size: self.input_size,
            postprocess: self.postprocess(),
            ocr_model_dir: self.ocr_model_dir.clone(),
            ocr_det_file: self.ocr_det_file.clone(),
            ocr_rec_file: self.ocr_rec_file.clone(),
            ocr_dict_file: self.ocr_dict_file.clone(),
            intra_threads: self.intra_threads,
        }
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(
            self.uploads_dir.clone(),
            self.static_dir.clone(),
            self.result_naming,
        )
    }
}
