// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The try-on session: lifecycle, per-frame pipeline and frame loop.
//!
//! A [`TryOnSession`] owns the overlay surface, the orientation state and the
//! live metrics. Each [`TryOnSession::tick`] runs one frame through
//! extract → classify → transform → render. [`TryOnSession::run`] drives
//! ticks from a frame source until the source ends or the session is closed.
//!
//! ```no_run
//! use garment_overlay::{
//!     GarmentCatalog, LoopSignal, PoseModel, Source, SourceIterator, TryOnSession,
//!     TrackingConfig,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = TryOnSession::new(TrackingConfig::default());
//!     session.initialize(
//!         |config| PoseModel::load_with_config("movenet_singlepose_lightning.onnx", config.clone()),
//!         &GarmentCatalog::default(),
//!     )?;
//!
//!     let frames = SourceIterator::new(Source::from("frames/"))?;
//!     session.run(frames, |view| {
//!         println!("{} {:.1} fps", view.report.orientation, view.report.metrics.fps);
//!         LoopSignal::Continue
//!     })?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;

use image::DynamicImage;

use crate::capture::SnapshotWriter;
use crate::config::TrackingConfig;
use crate::error::{OverlayError, Result};
use crate::extractor::KeypointExtractor;
use crate::garment::{GarmentAsset, GarmentCatalog};
use crate::orientation::{Classification, Orientation, OrientationClassifier, OrientationState};
use crate::render::{GarmentDraw, Overlay, OverlayRenderer, Surface};
use crate::source::FrameMeta;
use crate::transform::{compute_transform, draw_offset};
use crate::warn;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created, nothing loaded.
    #[default]
    Uninitialized,
    /// Extractor loading.
    Loading,
    /// Processing frames.
    Ready,
    /// Stopped; terminal.
    Closed,
    /// Extractor failed to load; terminal.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Live readout values, overwritten every frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameMetrics {
    /// Extractor throughput, 1000 / extractor milliseconds.
    pub fps: f32,
    /// Pose score as a percentage; 0 when tracking is lost.
    pub confidence: u8,
}

/// Read-only view of the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSnapshot {
    /// Lifecycle state.
    pub state: SessionState,
    /// Current garment view.
    pub orientation: Orientation,
    /// Latest metrics.
    pub metrics: FrameMetrics,
    /// Frames processed so far.
    pub frame_index: u64,
}

/// Cloneable handle that closes a session from anywhere, including another
/// thread or a callback while a frame is in flight.
#[derive(Debug, Clone)]
pub struct CloseHandle(Arc<AtomicBool>);

impl CloseHandle {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Request the session to stop. Takes effect before the next frame, and
    /// results of an in-flight extractor call are discarded.
    pub fn close(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Whether the session is still live.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one processed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Bodies returned by the extractor.
    pub bodies: usize,
    /// Whether the first body passed torso gating.
    pub reliable: bool,
    /// Orientation after this frame.
    pub orientation: Orientation,
    /// Set when this frame switched the garment view.
    pub changed: Option<Orientation>,
    /// Whether the garment was drawn.
    pub garment_drawn: bool,
    /// Metrics after this frame.
    pub metrics: FrameMetrics,
}

/// What the loop callback wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSignal {
    /// Process the next frame.
    Continue,
    /// Close the session and stop.
    Stop,
}

/// Everything the loop callback sees for one frame.
pub struct FrameView<'a> {
    /// The video frame.
    pub frame: &'a DynamicImage,
    /// Source metadata for the frame.
    pub meta: &'a FrameMeta,
    /// The freshly rendered overlay.
    pub surface: &'a Surface,
    /// Pipeline outcome.
    pub report: FrameReport,
}

/// Totals for one [`TryOnSession::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Frames processed.
    pub frames: usize,
    /// Frames that passed torso gating.
    pub reliable: usize,
}

/// One try-on session over a keypoint extractor.
pub struct TryOnSession<E: KeypointExtractor> {
    config: TrackingConfig,
    state: SessionState,
    extractor: Option<E>,
    garment: Option<Arc<GarmentAsset>>,
    preload: Vec<JoinHandle<()>>,
    classifier: OrientationClassifier,
    orientation: OrientationState,
    renderer: OverlayRenderer,
    surface: Surface,
    metrics: FrameMetrics,
    frame_index: u64,
    alive: CloseHandle,
}

impl<E: KeypointExtractor> TryOnSession<E> {
    /// Create an uninitialized session.
    #[must_use]
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            classifier: OrientationClassifier::new(&config),
            renderer: OverlayRenderer::new(&config),
            config,
            state: SessionState::Uninitialized,
            extractor: None,
            garment: None,
            preload: Vec::new(),
            orientation: OrientationState::default(),
            surface: Surface::new(0, 0),
            metrics: FrameMetrics::default(),
            frame_index: 0,
            alive: CloseHandle::new(),
        }
    }

    /// Load the extractor, then start loading every garment variant in the
    /// background. The session is ready as soon as the extractor is loaded;
    /// variants appear on screen as they arrive.
    ///
    /// # Errors
    ///
    /// Returns the loader's error after moving to [`SessionState::Failed`],
    /// or [`OverlayError::SessionError`] if the session was already
    /// initialized.
    pub fn initialize<F>(&mut self, loader: F, catalog: &GarmentCatalog) -> Result<()>
    where
        F: FnOnce(&TrackingConfig) -> Result<E>,
    {
        if !self.load_extractor(loader)? {
            return Ok(());
        }
        let (asset, handles) = GarmentAsset::preload(catalog);
        self.garment = Some(asset);
        self.preload = handles;
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Like [`initialize`](Self::initialize) with an already prepared asset.
    ///
    /// # Errors
    ///
    /// Same as [`initialize`](Self::initialize).
    pub fn initialize_with_asset<F>(&mut self, loader: F, asset: Arc<GarmentAsset>) -> Result<()>
    where
        F: FnOnce(&TrackingConfig) -> Result<E>,
    {
        if !self.load_extractor(loader)? {
            return Ok(());
        }
        self.garment = Some(asset);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Returns `false` if the session was closed while loading.
    fn load_extractor<F>(&mut self, loader: F) -> Result<bool>
    where
        F: FnOnce(&TrackingConfig) -> Result<E>,
    {
        if self.state != SessionState::Uninitialized {
            return Err(OverlayError::SessionError(format!(
                "Cannot initialize a session that is {}",
                self.state
            )));
        }
        if !self.alive.is_open() {
            self.state = SessionState::Closed;
            return Ok(false);
        }

        self.state = SessionState::Loading;
        let extractor = match loader(&self.config) {
            Ok(extractor) => extractor,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e);
            }
        };

        if !self.alive.is_open() {
            self.state = SessionState::Closed;
            return Ok(false);
        }
        self.extractor = Some(extractor);
        Ok(true)
    }

    /// Run one video frame through the pipeline.
    ///
    /// Returns `Ok(None)` once the session is closed, including when it was
    /// closed while the extractor was running; that frame's results are
    /// dropped and nothing is drawn.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::SessionError`] if the session is not ready,
    /// or the extractor's error.
    #[allow(clippy::cast_possible_truncation)]
    pub fn tick(&mut self, frame: &DynamicImage) -> Result<Option<FrameReport>> {
        if !self.alive.is_open() {
            self.shutdown();
        }
        match self.state {
            SessionState::Ready => {}
            SessionState::Closed => return Ok(None),
            state => {
                return Err(OverlayError::SessionError(format!(
                    "Cannot process frames while {state}"
                )));
            }
        }
        let Some(extractor) = self.extractor.as_mut() else {
            return Err(OverlayError::SessionError("No extractor loaded".to_string()));
        };

        self.surface.resize(frame.width(), frame.height());

        let start = Instant::now();
        let bodies = extractor.estimate(frame)?;
        let elapsed = start.elapsed().as_secs_f32();

        if !self.alive.is_open() {
            self.shutdown();
            return Ok(None);
        }

        let fps = if elapsed > 0.0 { 1.0 / elapsed } else { 0.0 };
        let mut report = FrameReport {
            bodies: bodies.len(),
            reliable: false,
            orientation: self.orientation.current(),
            changed: None,
            garment_drawn: false,
            metrics: FrameMetrics { fps, confidence: 0 },
        };

        match bodies.first() {
            None => self.renderer.render(&mut self.surface, None),
            Some(body) => {
                let classification = self.classifier.classify(&body.keypoints);
                report.changed = self.orientation.observe(&classification);
                report.orientation = self.orientation.current();

                match classification {
                    Classification::Unreliable => self.renderer.render(&mut self.surface, None),
                    Classification::Reliable { orientation, torso } => {
                        let garment = self.garment.as_deref().and_then(|asset| {
                            let image = asset.image(orientation)?;
                            let placement =
                                compute_transform(&torso, &asset.calibration, image.width());
                            placement.is_drawable().then(|| GarmentDraw {
                                image,
                                frame: placement,
                                offset: draw_offset(image.dimensions(), &asset.calibration),
                            })
                        });
                        report.garment_drawn = garment.is_some();
                        report.reliable = true;
                        report.metrics.confidence = body.confidence_percent();

                        let overlay = Overlay {
                            keypoints: &body.keypoints,
                            garment,
                        };
                        self.renderer.render(&mut self.surface, Some(&overlay));
                    }
                }
            }
        }

        self.metrics = report.metrics;
        self.frame_index += 1;
        Ok(Some(report))
    }

    /// Drive the session from a frame source until it ends, the callback
    /// returns [`LoopSignal::Stop`], or the session is closed.
    ///
    /// The source is consumed and dropped on return, releasing the capture
    /// device.
    ///
    /// # Errors
    ///
    /// Returns source, extractor and session errors; the loop stops on the
    /// first one.
    pub fn run<I, F>(&mut self, frames: I, mut on_frame: F) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<(DynamicImage, FrameMeta)>>,
        F: FnMut(&FrameView<'_>) -> LoopSignal,
    {
        let mut summary = RunSummary::default();
        let mut frames = frames.into_iter();

        while self.alive.is_open() {
            let Some(next) = frames.next() else {
                break;
            };
            let (frame, meta) = next?;

            let Some(report) = self.tick(&frame)? else {
                break;
            };
            summary.frames += 1;
            if report.reliable {
                summary.reliable += 1;
            }

            let view = FrameView {
                frame: &frame,
                meta: &meta,
                surface: &self.surface,
                report,
            };
            if on_frame(&view) == LoopSignal::Stop {
                self.close();
            }
        }

        if !self.alive.is_open() {
            self.shutdown();
        }
        Ok(summary)
    }

    /// Save the current overlay composited over `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::CaptureError`] if the snapshot cannot be written.
    pub fn capture(&self, frame: &DynamicImage, writer: &mut SnapshotWriter) -> Result<PathBuf> {
        writer.save(frame, self.surface.image())
    }

    /// Close the session. Idempotent.
    pub fn close(&mut self) {
        self.alive.close();
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.state = SessionState::Closed;
        self.extractor = None;
    }

    /// A handle that can close this session from elsewhere.
    #[must_use]
    pub fn close_handle(&self) -> CloseHandle {
        self.alive.clone()
    }

    /// Block until every garment variant has finished loading or failed.
    ///
    /// Returns the number of loaded variants.
    pub fn wait_for_garment(&mut self) -> usize {
        for handle in self.preload.drain(..) {
            if handle.join().is_err() {
                warn!("Garment preload thread panicked");
            }
        }
        self.garment.as_ref().map_or(0, |asset| asset.loaded())
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current garment view.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation.current()
    }

    /// Latest metrics.
    #[must_use]
    pub const fn metrics(&self) -> FrameMetrics {
        self.metrics
    }

    /// The overlay surface.
    #[must_use]
    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The garment asset, once initialized.
    #[must_use]
    pub fn garment(&self) -> Option<&GarmentAsset> {
        self.garment.as_deref()
    }

    /// Tracking configuration.
    #[must_use]
    pub const fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Read-only view of the session.
    #[must_use]
    pub const fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            orientation: self.orientation.current(),
            metrics: self.metrics,
            frame_index: self.frame_index,
        }
    }
}
