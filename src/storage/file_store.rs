// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local filesystem storage for uploads and annotated results

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// File name used by [`ResultNaming::Fixed`]
pub const FIXED_RESULT_NAME: &str = "result.jpg";

/// How annotated result images are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ResultNaming {
    /// `result-<uuid>.jpg`, one file per request
    #[default]
    Unique,
    /// Single `result.jpg`, overwritten by every request
    Fixed,
}

/// Reduce a client-supplied filename to its final path component.
///
/// Handles both `/` and `\` separators. Returns `None` when nothing usable
/// remains (empty, `.` or `..`).
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match base {
        "" | "." | ".." => None,
        _ => Some(base.to_string()),
    }
}

/// Upload and result directories
#[derive(Debug, Clone)]
pub struct FileStore {
    uploads_dir: PathBuf,
    static_dir: PathBuf,
    naming: ResultNaming,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(uploads_dir: P, static_dir: P, naming: ResultNaming) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            static_dir: static_dir.into(),
            naming,
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Create both directories if missing
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.uploads_dir, &self.static_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// Persist raw upload bytes under `filename` (already sanitized).
    ///
    /// Same-named uploads overwrite each other.
    pub fn save_upload(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.uploads_dir.join(filename);
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to save upload {}", path.display()))?;
        debug!("Saved upload {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Next result image file name
    pub fn result_file_name(&self) -> String {
        match self.naming {
            ResultNaming::Unique => format!("result-{}.jpg", Uuid::new_v4()),
            ResultNaming::Fixed => FIXED_RESULT_NAME.to_string(),
        }
    }

    /// Write encoded result bytes into the static directory, returning the
    /// file name relative to it
    pub fn save_result(&self, jpeg: &[u8]) -> Result<String> {
        let name = self.result_file_name();
        let path = self.static_dir.join(&name);
        std::fs::write(&path, jpeg)
            .with_context(|| format!("Failed to write result image {}", path.display()))?;
        debug!("Saved result image {}", path.display());
        Ok(name)
    }
}
