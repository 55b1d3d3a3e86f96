// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Garment Overlay
//!
//! Real-time garment overlay alignment for virtual try-on. Each video frame
//! goes through a pose model that returns body keypoints; the crate decides
//! whether the torso is tracked reliably, infers which way the person faces,
//! and draws the matching garment view pinned to the shoulders on a
//! transparent overlay the size of the frame.
//!
//! ## Pipeline
//!
//! ```text
//! frame ─▶ KeypointExtractor ─▶ OrientationClassifier ─▶ compute_transform ─▶ OverlayRenderer
//!             (MoveNet ONNX)       (front/back/left/right)   (anchor, angle, scale)   (Surface)
//! ```
//!
//! - Nothing is drawn unless both shoulders and both hips exceed the torso
//!   confidence threshold.
//! - The garment view switches immediately when the inferred orientation
//!   changes. There is no smoothing.
//! - The garment is anchored at the shoulder midpoint, rotated with the
//!   shoulder line and scaled by shoulder width.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use garment_overlay::{
//!     GarmentCatalog, LoopSignal, PoseModel, Source, SourceIterator, TrackingConfig,
//!     TryOnSession,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = TryOnSession::new(TrackingConfig::default());
//!     session.initialize(
//!         |config| PoseModel::load_with_config("movenet_singlepose_lightning.onnx", config.clone()),
//!         &GarmentCatalog::load("catalog/tee.json")?,
//!     )?;
//!
//!     let frames = SourceIterator::new(Source::from("clip.mp4"))?;
//!     let summary = session.run(frames, |view| {
//!         if let Some(orientation) = view.report.changed {
//!             println!("now showing the {orientation} view");
//!         }
//!         LoopSignal::Continue
//!     })?;
//!     println!("{} of {} frames tracked", summary.reliable, summary.frames);
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Live camera with a window (Space/C saves a snapshot, Esc/Q quits)
//! garment-overlay run --source 0 --show --mirror
//!
//! # A video file with a custom garment
//! garment-overlay run -m movenet_singlepose_lightning.onnx -s clip.mp4 -g catalog/tee.json --show
//!
//! # Replay recorded keypoints over a directory of frames, no model needed
//! garment-overlay run -s frames/ --keypoints session.jsonl
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`keypoint`] | Landmark names, keypoints and bodies |
//! | [`orientation`] | Torso gating and facing-direction classifier |
//! | [`transform`] | Shoulder-anchored garment placement |
//! | [`render`] | Overlay [`Surface`] and [`OverlayRenderer`] |
//! | [`session`] | [`TryOnSession`] lifecycle and frame loop |
//! | [`garment`] | Garment catalog and preloaded variants |
//! | [`extractor`] | [`KeypointExtractor`] seam and recorded keypoints |
//! | [`model`] | MoveNet ONNX pose model |
//! | [`source`] | Frame sources ([`Source`], [`SourceIterator`]) |
//! | [`capture`] | Snapshot compositing and saving |
//! | [`config`] | [`TrackingConfig`] thresholds |
//! | [`error`] | Error types ([`OverlayError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `annotate` | Live fps/confidence readout (default) |
//! | `visualize` | Real-time window display (default) |
//! | `video` | Video file and camera support |

// Modules
#[cfg(feature = "annotate")]
pub mod annotate;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod garment;
pub mod keypoint;
pub mod model;
pub mod orientation;
pub mod render;
pub mod session;
pub mod source;
pub mod transform;
pub mod visualizer;

// Re-export main types for convenience
pub use capture::SnapshotWriter;
pub use config::TrackingConfig;
pub use error::{OverlayError, Result};
pub use extractor::{KeypointExtractor, RecordedExtractor};
pub use garment::{GarmentAsset, GarmentCatalog};
pub use keypoint::{Body, Keypoint, KeypointName, KeypointSet, Point};
pub use model::{InputKind, PoseModel};
pub use orientation::{Classification, Orientation, OrientationClassifier, OrientationState, Torso};
pub use render::{Overlay, OverlayRenderer, Surface};
pub use session::{
    CloseHandle, FrameMetrics, FrameReport, FrameView, LoopSignal, RunSummary, SessionSnapshot,
    SessionState, TryOnSession,
};
pub use source::{FrameMeta, Source, SourceIterator};
pub use transform::{Calibration, TorsoFrame, compute_transform, draw_offset};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
