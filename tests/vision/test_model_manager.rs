// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Vision Model Manager tests
//!
//! These tests verify that the VisionModelManager:
//! - Points at the expected model files by default
//! - Refuses to start when any model is missing or unreadable
//! - Reports both loaded models (real-model tests, ignored by default)

use plate_reader_node::vision::detection::{DetectorBackend, PostprocessConfig};
use plate_reader_node::vision::{VisionModelConfig, VisionModelManager};
use std::path::{Path, PathBuf};

// Model paths (downloaded by the model fetch script)
const DETECTOR_MODEL: &str = "models/best.onnx";
const OCR_MODEL_DIR: &str = "models/paddleocr-onnx";

/// Helper: config rooted in a scratch directory
fn config_in(dir: &Path, backend: DetectorBackend) -> VisionModelConfig {
    VisionModelConfig {
        detector_backend: backend,
        detector_model: dir.join("best.onnx"),
        ocr_model_dir: dir.join("paddleocr-onnx"),
        intra_threads: 1,
        ..VisionModelConfig::default()
    }
}

#[cfg(test)]
mod model_manager_tests {
    use super::*;

    // =============================================================================
    // VisionModelConfig Tests
    // =============================================================================

    /// Test 1: Default config has expected paths
    #[test]
    fn test_default_config_has_expected_paths() {
        let config = VisionModelConfig::default();

        assert_eq!(config.detector_model, PathBuf::from(DETECTOR_MODEL));
        assert_eq!(config.ocr_model_dir, PathBuf::from(OCR_MODEL_DIR));
        assert!(config.ocr_rec_path().ends_with("rec_model.onnx"));
        assert_eq!(config.postprocess, PostprocessConfig::default());
    }

    /// Test 2: OCR paths follow a custom directory
    #[test]
    fn test_ocr_paths_follow_model_dir() {
        let config = VisionModelConfig {
            ocr_model_dir: PathBuf::from("/custom/ocr"),
            ocr_dict_file: "plates_dict.txt".to_string(),
            ..VisionModelConfig::default()
        };

        assert_eq!(config.ocr_det_path(), PathBuf::from("/custom/ocr/det_model.onnx"));
        assert_eq!(config.ocr_dict_path(), PathBuf::from("/custom/ocr/plates_dict.txt"));
    }

    // =============================================================================
    // Loading failures
    // =============================================================================

    /// Test 3: Missing detector is fatal for both backends
    #[test]
    fn test_missing_detector_fails() {
        let dir = tempfile::tempdir().unwrap();

        for backend in [DetectorBackend::Packaged, DetectorBackend::Raw] {
            let result = VisionModelManager::new(config_in(dir.path(), backend));
            let err = result.err().expect("missing detector must fail");
            assert!(err.to_string().contains("plate detector model not found"));
        }
    }

    /// Test 4: A file that is not an ONNX graph is fatal
    #[test]
    fn test_corrupt_detector_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("best.onnx"), b"not an onnx graph").unwrap();

        let result = VisionModelManager::new(config_in(dir.path(), DetectorBackend::Packaged));
        let err = result.err().expect("corrupt detector must fail");
        assert!(format!("{:#}", err).contains("Failed to load plate detector model"));
    }

    // =============================================================================
    // Real models (require downloaded files)
    // =============================================================================

    /// Test 5: Both models load and are listed
    #[test]
    #[ignore] // Requires models/best.onnx and models/paddleocr-onnx
    fn test_real_models_load() {
        let manager = VisionModelManager::new(VisionModelConfig::default())
            .expect("Failed to load vision models");

        let models = manager.list_models();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].model_type, "detector");
        assert_eq!(models[0].name, "yolo-packaged");
        assert_eq!(models[1].model_type, "ocr");
        assert_eq!(models[1].name, "paddleocr");
        assert_eq!(manager.detector().backend(), DetectorBackend::Packaged);
    }

    /// Test 6: Missing OCR files are fatal even with a valid detector
    #[test]
    #[ignore] // Requires models/best.onnx
    fn test_missing_ocr_models_fail() {
        let config = VisionModelConfig {
            ocr_model_dir: PathBuf::from("/nonexistent/paddleocr-onnx"),
            ..VisionModelConfig::default()
        };

        let err = VisionModelManager::new(config).err().expect("missing OCR must fail");
        assert!(format!("{:#}", err).contains("Failed to load PaddleOCR models"));
    }
}
