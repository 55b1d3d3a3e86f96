// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Facing-direction classification from body keypoints.
//!
//! Classification is single-frame: the result depends only on the keypoints
//! passed in, and [`OrientationState`] adopts it as soon as it differs from
//! the current view. Confidence thresholds are the only damping.

use std::fmt;
use std::str::FromStr;

use crate::config::TrackingConfig;
use crate::error::OverlayError;
use crate::keypoint::{KeypointName, KeypointSet, Point};

/// Facing direction of the tracked person, used to pick the garment variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Facing the camera.
    #[default]
    Front,
    /// Back to the camera.
    Back,
    /// Turned so the left side faces the camera.
    Left,
    /// Turned so the right side faces the camera.
    Right,
}

impl Orientation {
    /// All orientations.
    pub const ALL: [Self; 4] = [Self::Front, Self::Back, Self::Left, Self::Right];

    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Position in [`Orientation::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Front => 0,
            Self::Back => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(OverlayError::ConfigError(format!("Unknown orientation: {s}"))),
        }
    }
}

/// Positions of the four torso landmarks of a body that passed gating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torso {
    pub left_shoulder: Point,
    pub right_shoulder: Point,
    pub left_hip: Point,
    pub right_hip: Point,
}

impl Torso {
    /// Midpoint between the shoulders.
    #[must_use]
    pub fn shoulder_center(&self) -> Point {
        self.left_shoulder.midpoint(self.right_shoulder)
    }

    /// Vector from the left to the right shoulder.
    #[must_use]
    pub fn shoulder_span(&self) -> Point {
        self.right_shoulder - self.left_shoulder
    }
}

/// Outcome of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// Torso landmarks missing or below threshold; nothing may be drawn.
    Unreliable,
    /// Torso landmarks qualified.
    Reliable {
        /// Facing direction inferred from this frame alone.
        orientation: Orientation,
        /// Torso landmarks used for garment placement.
        torso: Torso,
    },
}

impl Classification {
    /// The inferred orientation, if reliable.
    #[must_use]
    pub const fn orientation(&self) -> Option<Orientation> {
        match self {
            Self::Unreliable => None,
            Self::Reliable { orientation, .. } => Some(*orientation),
        }
    }

    /// Whether the frame passed torso gating.
    #[must_use]
    pub const fn is_reliable(&self) -> bool {
        matches!(self, Self::Reliable { .. })
    }
}

/// Classifies facing direction from a [`KeypointSet`].
#[derive(Debug, Clone)]
pub struct OrientationClassifier {
    torso_confidence: f32,
    face_confidence: f32,
    nose_offset: f32,
}

impl Default for OrientationClassifier {
    fn default() -> Self {
        Self::new(&TrackingConfig::default())
    }
}

impl OrientationClassifier {
    /// Create a classifier using the thresholds in `config`.
    #[must_use]
    pub const fn new(config: &TrackingConfig) -> Self {
        Self {
            torso_confidence: config.torso_confidence,
            face_confidence: config.face_confidence,
            nose_offset: config.nose_offset,
        }
    }

    /// Extract the torso if all four landmarks qualify.
    #[must_use]
    pub fn torso(&self, keypoints: &KeypointSet) -> Option<Torso> {
        let t = self.torso_confidence;
        Some(Torso {
            left_shoulder: keypoints.confident(KeypointName::LeftShoulder, t)?.position,
            right_shoulder: keypoints.confident(KeypointName::RightShoulder, t)?.position,
            left_hip: keypoints.confident(KeypointName::LeftHip, t)?.position,
            right_hip: keypoints.confident(KeypointName::RightHip, t)?.position,
        })
    }

    /// Classify one frame.
    #[must_use]
    pub fn classify(&self, keypoints: &KeypointSet) -> Classification {
        match self.torso(keypoints) {
            Some(torso) => Classification::Reliable {
                orientation: self.facing(keypoints, &torso),
                torso,
            },
            None => Classification::Unreliable,
        }
    }

    fn facing(&self, keypoints: &KeypointSet, torso: &Torso) -> Orientation {
        let f = self.face_confidence;
        let nose = keypoints.confident(KeypointName::Nose, f);
        let has_left_eye = keypoints.qualifies(KeypointName::LeftEye, f);
        let has_right_eye = keypoints.qualifies(KeypointName::RightEye, f);
        let has_left_ear = keypoints.qualifies(KeypointName::LeftEar, f);
        let has_right_ear = keypoints.qualifies(KeypointName::RightEar, f);

        let face_points = [nose.is_some(), has_left_eye, has_right_eye]
            .iter()
            .filter(|&&b| b)
            .count();
        let ear_points = [has_left_ear, has_right_ear].iter().filter(|&&b| b).count();

        if face_points == 0 && ear_points == 0 {
            return Orientation::Back;
        }

        if let Some(nose) = nose {
            let center = torso.shoulder_center();
            let half_width = (torso.right_shoulder.x - torso.left_shoulder.x).abs() / 2.0;
            let offset = (nose.position.x - center.x) / half_width;
            if offset > self.nose_offset {
                Orientation::Right
            } else if offset < -self.nose_offset {
                Orientation::Left
            } else {
                Orientation::Front
            }
        } else if face_points >= 1 {
            Orientation::Front
        } else if ear_points == 1 {
            if has_left_ear {
                Orientation::Left
            } else {
                Orientation::Right
            }
        } else {
            // Dead branch: reached only with both ears and no face point.
            Orientation::Front
        }
    }
}

/// The current garment view, carried across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrientationState {
    current: Orientation,
}

impl OrientationState {
    /// Start from a given view.
    #[must_use]
    pub const fn new(initial: Orientation) -> Self {
        Self { current: initial }
    }

    /// The current view.
    #[must_use]
    pub const fn current(&self) -> Orientation {
        self.current
    }

    /// Fold a classification into the state.
    ///
    /// Returns the new orientation when it changed. Unreliable frames never
    /// change the state.
    pub fn observe(&mut self, classification: &Classification) -> Option<Orientation> {
        let detected = classification.orientation()?;
        if detected == self.current {
            return None;
        }
        self.current = detected;
        Some(detected)
    }
}
