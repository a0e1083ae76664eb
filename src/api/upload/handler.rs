// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload endpoint handler

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use std::sync::Arc;
use tracing::{debug, info};

use super::response::UploadResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::storage::sanitize_filename;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// POST /upload - Detect a number plate and read it
///
/// # Request
/// `multipart/form-data` with a `file` part holding the image.
///
/// # Response
/// - `text`: plate text, or "Plate not detected"
/// - `image_url`: `/static/<file>` with every detection drawn
///
/// # Errors
/// - 400 Bad Request: no `file` part, empty filename, malformed multipart
/// - 413 Payload Too Large: body over the configured limit
/// - 500 Internal Server Error: undecodable image or inference failure
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Multipart rejected: {}", e);
        ApiError::NoFile
    })?;

    let (filename, bytes) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_bytes))?
            .ok_or(ApiError::NoFile)?;

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Plain form values named `file` are not uploads
        let Some(raw_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if raw_name.is_empty() {
            return Err(ApiError::EmptyFilename);
        }
        let filename =
            sanitize_filename(&raw_name).ok_or_else(|| ApiError::InvalidFilename(raw_name.clone()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_bytes))?;
        break (filename, bytes);
    };

    debug!("Upload '{}' received ({} bytes)", filename, bytes.len());

    let recognizer = Arc::clone(&state.recognizer);
    let recognition = tokio::task::spawn_blocking(move || recognizer.process_upload(&filename, &bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("Recognition task failed: {}", e)))??;

    if recognition.plate_found() {
        info!(
            "Plate read: '{}' in {}ms",
            recognition.text, recognition.processing_time_ms
        );
    } else {
        info!(
            "No plate read ({} detections) in {}ms",
            recognition.detection_count, recognition.processing_time_ms
        );
    }

    Ok(Json(UploadResponse::from(recognition)))
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(limit)
    } else {
        ApiError::InvalidMultipart(err.body_text())
    }
}
