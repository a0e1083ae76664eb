// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for loading the plate detector and OCR models

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

use crate::vision::detection::{
    DetectorBackend, PackagedPlateDetector, PlateDetector, PostprocessConfig, RawYoloDetector,
    DETECTION_INPUT_SIZE,
};
use crate::vision::ocr::{PaddleTextReader, TextReader};
use crate::vision::session::DEFAULT_INTRA_THREADS;

/// Configuration for loading vision models
#[derive(Debug, Clone)]
pub struct VisionModelConfig {
    pub detector_backend: DetectorBackend,
    pub detector_model: PathBuf,
    /// Square letterbox size fed to the detector
    pub detector_input_size: u32,
    pub postprocess: PostprocessConfig,
    /// Directory holding the PaddleOCR files below
    pub ocr_model_dir: PathBuf,
    pub ocr_det_file: String,
    pub ocr_rec_file: String,
    pub ocr_dict_file: String,
    pub intra_threads: usize,
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            detector_backend: DetectorBackend::Packaged,
            detector_model: PathBuf::from("models/best.onnx"),
            detector_input_size: DETECTION_INPUT_SIZE,
            postprocess: PostprocessConfig::default(),
            ocr_model_dir: PathBuf::from("models/paddleocr-onnx"),
            ocr_det_file: "det_model.onnx".to_string(),
            ocr_rec_file: "rec_model.onnx".to_string(),
            ocr_dict_file: "en_dict.txt".to_string(),
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }
}

impl VisionModelConfig {
    pub fn ocr_det_path(&self) -> PathBuf {
        self.ocr_model_dir.join(&self.ocr_det_file)
    }

    pub fn ocr_rec_path(&self) -> PathBuf {
        self.ocr_model_dir.join(&self.ocr_rec_file)
    }

    pub fn ocr_dict_path(&self) -> PathBuf {
        self.ocr_model_dir.join(&self.ocr_dict_file)
    }
}

/// Information about a loaded vision model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionModelInfo {
    pub name: String,
    /// `detector` or `ocr`
    pub model_type: String,
    pub path: String,
}

/// Holds the loaded plate detector and text reader.
///
/// Both are required; construction fails if either cannot be loaded.
pub struct VisionModelManager {
    detector: Arc<dyn PlateDetector>,
    text_reader: Arc<dyn TextReader>,
    config: VisionModelConfig,
}

impl VisionModelManager {
    /// Load every model named in `config`
    ///
    /// # Errors
    /// Returns the first model that is missing or fails to load.
    pub fn new(config: VisionModelConfig) -> anyhow::Result<Self> {
        let detector: Arc<dyn PlateDetector> = match config.detector_backend {
            DetectorBackend::Packaged => Arc::new(PackagedPlateDetector::load(
                &config.detector_model,
                config.detector_input_size,
                config.postprocess,
                config.intra_threads,
            )?),
            DetectorBackend::Raw => Arc::new(RawYoloDetector::load(
                &config.detector_model,
                config.detector_input_size,
                config.postprocess,
                config.intra_threads,
            )?),
        };
        tracing::info!(
            "✅ Plate detector ({}) loaded from {}",
            config.detector_backend.as_str(),
            config.detector_model.display()
        );

        let text_reader = PaddleTextReader::load(
            config.ocr_det_path(),
            config.ocr_rec_path(),
            config.ocr_dict_path(),
            config.intra_threads,
        )
        .with_context(|| {
            format!(
                "Failed to load PaddleOCR models from {}",
                config.ocr_model_dir.display()
            )
        })?;
        tracing::info!(
            "✅ PaddleOCR models loaded from {}",
            config.ocr_model_dir.display()
        );

        Ok(Self {
            detector,
            text_reader: Arc::new(text_reader),
            config,
        })
    }

    pub fn detector(&self) -> Arc<dyn PlateDetector> {
        Arc::clone(&self.detector)
    }

    pub fn text_reader(&self) -> Arc<dyn TextReader> {
        Arc::clone(&self.text_reader)
    }

    /// List all loaded vision models
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        vec![
            VisionModelInfo {
                name: format!("yolo-{}", self.detector.backend().as_str()),
                model_type: "detector".to_string(),
                path: self.config.detector_model.display().to_string(),
            },
            VisionModelInfo {
                name: self.text_reader.name().to_string(),
                model_type: "ocr".to_string(),
                path: self.config.ocr_model_dir.display().to_string(),
            },
        ]
    }
}
