// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared ONNX Runtime session wrapper
//!
//! Every model in the pipeline (plate detector, OCR text detector, OCR
//! recognizer) takes a single NCHW `f32` tensor and we only read the first
//! output, so they all go through this wrapper.

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayD};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Default number of intra-op threads per session
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// A loaded ONNX model with a single tensor input
pub struct OnnxModel {
    /// Runtime session; `run` needs `&mut`, so access is serialized
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    /// Human readable label used in logs and errors
    label: String,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("label", &self.label)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl OnnxModel {
    /// Load an ONNX model from disk with CPU-only execution
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime rejects the graph.
    pub fn load<P: AsRef<Path>>(label: &str, model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("{} model not found: {}", label, model_path.display());
        }

        info!("Loading {} model from {}", label, model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads.max(1))
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("Failed to load {} model from {}", label, model_path.display())
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .with_context(|| format!("{} model declares no inputs", label))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .with_context(|| format!("{} model declares no outputs", label))?;

        if let Some(input) = session.inputs.first() {
            debug!("{} model input type: {:?}", label, input.input_type);
        }

        info!(
            "✅ {} model loaded (input: {}, output: {})",
            label, input_name, output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            label: label.to_string(),
        })
    }

    /// Run the model on one NCHW tensor and return its first output
    pub fn run(&self, input: Array4<f32>) -> Result<ArrayD<f32>> {
        let shape = input.shape().to_vec();
        let tensor = Tensor::from_array(input)
            .with_context(|| format!("Failed to create {} input tensor", self.label))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("{} session lock poisoned: {}", self.label, e))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .with_context(|| format!("{} inference failed for input {:?}", self.label, shape))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .with_context(|| format!("Failed to extract {} output tensor", self.label))?
            .to_owned();

        debug!(
            "{} output '{}' shape: {:?}",
            self.label,
            self.output_name,
            output.shape()
        );

        Ok(output)
    }
}
