// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Tracking configuration.
//!
//! This module defines the [`TrackingConfig`] struct, which holds the
//! confidence thresholds that gate orientation classification and skeleton
//! drawing, plus the pose model's runtime options.

/// Configuration for the tracking pipeline.
///
/// It uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use garment_overlay::TrackingConfig;
///
/// let config = TrackingConfig::new()
///     .with_torso_confidence(0.5)
///     .with_face_confidence(0.7)
///     .with_imgsz(256);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Shoulders and hips must all exceed this confidence before anything is drawn.
    pub torso_confidence: f32,
    /// Nose, eyes and ears must exceed this confidence to count as facial evidence.
    pub face_confidence: f32,
    /// Normalized nose offset beyond which the body is classified as turned.
    pub nose_offset: f32,
    /// Skeleton segments are drawn only when both endpoints exceed this confidence.
    pub skeleton_confidence: f32,
    /// Bodies scoring below this are dropped by the pose model.
    pub min_pose_score: f32,
    /// Square model input size in pixels.
    pub imgsz: usize,
    /// Number of intra-op threads for ONNX Runtime (`0` = runtime default).
    pub num_threads: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            torso_confidence: 0.4,
            face_confidence: 0.6,
            nose_offset: 0.6,
            skeleton_confidence: 0.3,
            min_pose_score: 0.25,
            imgsz: 192,
            num_threads: 0,
        }
    }
}

impl TrackingConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the torso gating threshold.
    #[must_use]
    pub const fn with_torso_confidence(mut self, threshold: f32) -> Self {
        self.torso_confidence = threshold;
        self
    }

    /// Set the facial landmark threshold.
    #[must_use]
    pub const fn with_face_confidence(mut self, threshold: f32) -> Self {
        self.face_confidence = threshold;
        self
    }

    /// Set the normalized nose offset used to detect a turned body.
    #[must_use]
    pub const fn with_nose_offset(mut self, offset: f32) -> Self {
        self.nose_offset = offset;
        self
    }

    /// Set the skeleton drawing threshold.
    #[must_use]
    pub const fn with_skeleton_confidence(mut self, threshold: f32) -> Self {
        self.skeleton_confidence = threshold;
        self
    }

    /// Set the minimum pose score.
    #[must_use]
    pub const fn with_min_pose_score(mut self, score: f32) -> Self {
        self.min_pose_score = score;
        self
    }

    /// Set the model input size.
    ///
    /// MoveNet Lightning expects 192, Thunder expects 256.
    #[must_use]
    pub const fn with_imgsz(mut self, size: usize) -> Self {
        self.imgsz = size;
        self
    }

    /// Set the number of threads for inference.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }
}
