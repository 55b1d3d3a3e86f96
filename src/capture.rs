// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Snapshot capture: the video frame with the overlay on top, saved as PNG.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, RgbaImage, imageops};

use crate::error::{OverlayError, Result};

/// Default snapshot file prefix.
pub const DEFAULT_PREFIX: &str = "luxe-vto";

/// Default parent directory for capture runs.
pub const DEFAULT_SAVE_DIR: &str = "runs/tryon";

/// Composite the overlay over the video frame.
#[must_use]
pub fn compose_snapshot(frame: &DynamicImage, overlay: &RgbaImage) -> RgbaImage {
    let mut composite = frame.to_rgba8();
    imageops::overlay(&mut composite, overlay, 0, 0);
    composite
}

/// `<prefix>-<unix-millis>.png`
#[must_use]
pub fn snapshot_filename(prefix: &str, unix_millis: u128) -> String {
    format!("{prefix}-{unix_millis}.png")
}

/// Find the next available run directory (capture, capture2, capture3, etc.)
#[must_use]
pub fn find_next_run_dir(base: &Path, prefix: &str) -> PathBuf {
    let first = base.join(prefix);
    if !first.exists() {
        return first;
    }

    (2..)
        .map(|i| base.join(format!("{prefix}{i}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// First free snapshot path in `dir`: `<prefix>-<millis>.png`, then
/// `<prefix>-<millis>-2.png`, `<prefix>-<millis>-3.png`, etc.
#[must_use]
pub fn next_snapshot_path(dir: &Path, prefix: &str, unix_millis: u128) -> PathBuf {
    let first = dir.join(snapshot_filename(prefix, unix_millis));
    if !first.exists() {
        return first;
    }

    (2..)
        .map(|i| dir.join(format!("{prefix}-{unix_millis}-{i}.png")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

/// Writes snapshots into a run directory chosen on the first capture.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    base: PathBuf,
    prefix: String,
    run_dir: Option<PathBuf>,
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DIR)
    }
}

impl SnapshotWriter {
    /// Writer rooted at `base`, e.g. `runs/tryon`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            run_dir: None,
        }
    }

    /// Use a different file prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Run directory, once the first snapshot has been written.
    #[must_use]
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }

    /// Composite and save one snapshot. Returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::CaptureError`] if the directory or file cannot
    /// be written.
    pub fn save(&mut self, frame: &DynamicImage, overlay: &RgbaImage) -> Result<PathBuf> {
        let dir = match &self.run_dir {
            Some(dir) => dir.clone(),
            None => {
                let dir = find_next_run_dir(&self.base, "capture");
                std::fs::create_dir_all(&dir).map_err(|e| {
                    OverlayError::CaptureError(format!(
                        "Failed to create {}: {e}",
                        dir.display()
                    ))
                })?;
                self.run_dir = Some(dir.clone());
                dir
            }
        };

        let path = next_snapshot_path(&dir, &self.prefix, unix_millis());
        compose_snapshot(frame, overlay)
            .save(&path)
            .map_err(|e| {
                OverlayError::CaptureError(format!("Failed to save {}: {e}", path.display()))
            })?;
        Ok(path)
    }
}
