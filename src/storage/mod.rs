// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod file_store;

pub use file_store::{sanitize_filename, FileStore, ResultNaming, FIXED_RESULT_NAME};
