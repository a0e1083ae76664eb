// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload response types

use serde::{Deserialize, Serialize};

use crate::pipeline::Recognition;

/// URL prefix under which result images are served
pub const STATIC_URL_PREFIX: &str = "/static";

/// Response from plate recognition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    /// Plate text, or "Plate not detected"
    pub text: String,
    /// Where the annotated image can be fetched
    pub image_url: String,
}

impl From<Recognition> for UploadResponse {
    fn from(recognition: Recognition) -> Self {
        Self {
            image_url: format!("{}/{}", STATIC_URL_PREFIX, recognition.result_file),
            text: recognition.text,
        }
    }
}
