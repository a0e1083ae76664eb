// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition model
//!
//! Recognizes the characters of one cropped text region with a CRNN-style
//! model and CTC greedy decoding.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{ArrayViewD, Axis, Ix2};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use super::preprocessing::preprocess_for_recognition;
use crate::vision::session::OnnxModel;

/// CTC blank token index
pub const CTC_BLANK: usize = 0;

/// Recognized text with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Mean probability of the emitted characters (0.0-1.0)
    pub confidence: f32,
    pub char_confidences: Vec<f32>,
}

impl RecognizedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// PaddleOCR text recognition model (CPU only)
pub struct TextRecognizer {
    model: OnnxModel,
    /// Index 0 is the CTC blank placeholder
    dictionary: Vec<char>,
}

impl std::fmt::Debug for TextRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRecognizer")
            .field("model", &self.model)
            .field("dictionary_size", &self.dictionary.len())
            .finish()
    }
}

impl TextRecognizer {
    /// Load the recognition model and its character dictionary
    ///
    /// # Errors
    /// Returns error if either file is missing or the model fails to load.
    pub fn load<P: AsRef<Path>>(model_path: P, dict_path: P, intra_threads: usize) -> Result<Self> {
        let dict_path = dict_path.as_ref();
        if !dict_path.exists() {
            anyhow::bail!("OCR character dictionary not found: {}", dict_path.display());
        }

        let model = OnnxModel::load("OCR recognition", model_path, intra_threads)?;
        let dictionary = load_dictionary(dict_path)?;
        info!("Loaded character dictionary with {} entries", dictionary.len());

        Ok(Self { model, dictionary })
    }

    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Recognize the text in one region crop
    pub fn recognize(&self, region: &DynamicImage) -> Result<RecognizedText> {
        let input = preprocess_for_recognition(region);
        let output = self.model.run(input)?;
        let recognized = ctc_greedy_decode(output.view(), &self.dictionary)?;
        debug!(
            "Recognized '{}' (confidence {:.3})",
            recognized.text, recognized.confidence
        );
        Ok(recognized)
    }
}

/// Load a PaddleOCR character dictionary, one character per line.
///
/// The returned table has the CTC blank at index 0, the file's characters
/// from index 1 and a trailing space entry.
pub fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Vec<char>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

    let mut dictionary = vec!['\0'];
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read dictionary line")?;
        let line = line.trim_end_matches('\r');
        if let Some(ch) = line.chars().next() {
            dictionary.push(ch);
        }
    }

    if dictionary.len() == 1 {
        anyhow::bail!("OCR character dictionary is empty: {}", path.display());
    }

    dictionary.push(' ');
    Ok(dictionary)
}

/// CTC greedy (best path) decoding.
///
/// Takes the arg-max class per timestep, collapses repeats and drops blanks.
/// Accepts `[1, T, C]` or `[T, C]` probabilities.
pub fn ctc_greedy_decode(output: ArrayViewD<f32>, dictionary: &[char]) -> Result<RecognizedText> {
    let probs = match output.ndim() {
        3 => output.index_axis(Axis(0), 0),
        2 => output.view(),
        _ => anyhow::bail!("Unexpected recognition output shape: {:?}", output.shape()),
    };
    let probs = probs
        .into_dimensionality::<Ix2>()
        .context("Recognition output is not 2-D")?;

    let mut text = String::new();
    let mut char_confidences = Vec::new();
    let mut prev_index = CTC_BLANK;

    for step in probs.axis_iter(Axis(0)) {
        let (max_index, max_prob) = step.iter().enumerate().fold(
            (CTC_BLANK, f32::NEG_INFINITY),
            |(bi, bp), (i, &p)| if p > bp { (i, p) } else { (bi, bp) },
        );

        if max_index != CTC_BLANK && max_index != prev_index {
            if let Some(&ch) = dictionary.get(max_index) {
                text.push(ch);
                char_confidences.push(max_prob);
            }
        }
        prev_index = max_index;
    }

    let confidence = if char_confidences.is_empty() {
        0.0
    } else {
        (char_confidences.iter().sum::<f32>() / char_confidences.len() as f32).clamp(0.0, 1.0)
    };

    Ok(RecognizedText {
        text,
        confidence,
        char_confidences,
    })
}
