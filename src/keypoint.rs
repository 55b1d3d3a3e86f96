// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Body keypoint types.
//!
//! A [`KeypointSet`] stores one body's landmarks in an array indexed by
//! [`KeypointName`], so lookups are O(1) and every landmark the pipeline reads
//! is checked at compile time.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::OverlayError;

/// A 2D position in frame pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Euclidean length of the point treated as a vector.
    #[must_use]
    pub fn norm(self) -> f32 {
        self.x.hypot(self.y)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// The 17 COCO / MoveNet anatomical landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointName {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointName {
    /// Number of landmarks.
    pub const COUNT: usize = 17;

    /// All landmarks in model output order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Landmark at a model output index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Index in model output order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Snake-case label as emitted by pose-detection runtimes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl fmt::Display for KeypointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeypointName {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| OverlayError::ConfigError(format!("Unknown keypoint name: {s}")))
    }
}

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Position in frame pixels.
    pub position: Point,
    /// Detection confidence (0.0 to 1.0).
    pub confidence: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self {
            position: Point::new(x, y),
            confidence,
        }
    }

    /// Whether the confidence is strictly above `threshold`.
    #[must_use]
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }
}

/// The keypoints of one body in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointSet {
    points: [Option<Keypoint>; KeypointName::COUNT],
}

impl KeypointSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: KeypointName, keypoint: Keypoint) -> Self {
        self.insert(name, keypoint);
        self
    }

    /// Insert or replace a landmark.
    pub fn insert(&mut self, name: KeypointName, keypoint: Keypoint) {
        self.points[name.index()] = Some(keypoint);
    }

    /// Remove a landmark.
    pub fn remove(&mut self, name: KeypointName) -> Option<Keypoint> {
        self.points[name.index()].take()
    }

    /// Look up a landmark.
    #[must_use]
    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.points[name.index()].as_ref()
    }

    /// The landmark if present with confidence strictly above `threshold`.
    #[must_use]
    pub fn confident(&self, name: KeypointName, threshold: f32) -> Option<&Keypoint> {
        self.get(name).filter(|k| k.exceeds(threshold))
    }

    /// Whether the landmark is present with confidence strictly above `threshold`.
    #[must_use]
    pub fn qualifies(&self, name: KeypointName, threshold: f32) -> bool {
        self.confident(name, threshold).is_some()
    }

    /// Number of present landmarks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// Whether no landmark is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    /// Iterate over present landmarks in model order.
    pub fn iter(&self) -> impl Iterator<Item = (KeypointName, &Keypoint)> {
        KeypointName::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(name, point)| point.as_ref().map(|k| (*name, k)))
    }
}

impl FromIterator<(KeypointName, Keypoint)> for KeypointSet {
    fn from_iter<I: IntoIterator<Item = (KeypointName, Keypoint)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, keypoint) in iter {
            set.insert(name, keypoint);
        }
        set
    }
}

/// One detected body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// Landmarks for this body.
    pub keypoints: KeypointSet,
    /// Overall pose score (0.0 to 1.0).
    pub score: f32,
}

impl Body {
    /// Create a new body.
    #[must_use]
    pub const fn new(keypoints: KeypointSet, score: f32) -> Self {
        Self { keypoints, score }
    }

    /// Confidence as an integer percentage, clamped to 0..=100.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn confidence_percent(&self) -> u8 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
