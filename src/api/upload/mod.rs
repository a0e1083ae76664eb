// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate upload endpoint module
//!
//! Provides POST /upload taking a multipart `file` field.

pub mod handler;
pub mod response;

pub use handler::upload_handler;
pub use response::{UploadResponse, STATIC_URL_PREFIX};
