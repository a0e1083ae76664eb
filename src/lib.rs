// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod pipeline;
pub mod storage;
pub mod version;
pub mod vision;

pub use config::ServerConfig;
pub use pipeline::{PlateRecognizer, Recognition, PLATE_NOT_DETECTED};
