// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint extraction seam.
//!
//! The pose model is a black box behind [`KeypointExtractor`]. The crate
//! ships the ONNX MoveNet model in [`crate::model`] and a
//! [`RecordedExtractor`] that replays keypoints dumped as JSON lines, which is
//! handy for reproducing a session without a model.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use image::DynamicImage;
use serde::Deserialize;

use crate::error::{OverlayError, Result};
use crate::keypoint::{Body, Keypoint, KeypointName, KeypointSet};

/// Produces zero or more bodies per video frame, highest priority first.
pub trait KeypointExtractor {
    /// Estimate the bodies visible in `frame`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model fails.
    fn estimate(&mut self, frame: &DynamicImage) -> Result<Vec<Body>>;
}

impl<E: KeypointExtractor + ?Sized> KeypointExtractor for Box<E> {
    fn estimate(&mut self, frame: &DynamicImage) -> Result<Vec<Body>> {
        (**self).estimate(frame)
    }
}

#[derive(Debug, Deserialize)]
struct RecordedKeypoint {
    name: String,
    x: f32,
    y: f32,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RecordedBody {
    #[serde(default)]
    score: Option<f32>,
    keypoints: Vec<RecordedKeypoint>,
}

impl RecordedBody {
    fn into_body(self) -> Result<Body> {
        let mut keypoints = KeypointSet::new();
        for kp in self.keypoints {
            let name: KeypointName = kp.name.parse()?;
            keypoints.insert(name, Keypoint::new(kp.x, kp.y, kp.score.unwrap_or(1.0)));
        }
        Ok(Body::new(keypoints, self.score.unwrap_or(0.0)))
    }
}

/// Replays recorded detections, one frame per JSON line.
///
/// Each line is an array of bodies shaped like pose-detection output:
/// `[{"score": 0.8, "keypoints": [{"name": "nose", "x": 1, "y": 2, "score": 0.9}]}]`.
/// Once the recording is exhausted every further frame yields no bodies.
#[derive(Debug, Default)]
pub struct RecordedExtractor {
    frames: VecDeque<Vec<Body>>,
}

impl RecordedExtractor {
    /// Create from already-parsed frames.
    #[must_use]
    pub fn new(frames: impl IntoIterator<Item = Vec<Body>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Parse JSON lines. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending line if any line is malformed.
    pub fn from_jsonl(text: &str) -> Result<Self> {
        let mut frames = VecDeque::new();
        for (i, line) in text.lines().enumerate() {
            frames.extend(Self::parse_line(line, i + 1)?);
        }
        Ok(Self { frames })
    }

    /// Load a JSON-lines recording from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            OverlayError::IoError(format!("Failed to open recording {}: {e}", path.display()))
        })?;

        let mut frames = VecDeque::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            frames.extend(Self::parse_line(&line?, i + 1)?);
        }
        Ok(Self { frames })
    }

    fn parse_line(line: &str, line_no: usize) -> Result<Option<Vec<Body>>> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        let bodies: Vec<RecordedBody> = serde_json::from_str(line)
            .map_err(|e| OverlayError::ConfigError(format!("Recording line {line_no}: {e}")))?;
        bodies
            .into_iter()
            .map(RecordedBody::into_body)
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Frames left to replay.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl KeypointExtractor for RecordedExtractor {
    fn estimate(&mut self, _frame: &DynamicImage) -> Result<Vec<Body>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING: &str = r#"
[{"score": 0.8, "keypoints": [{"name": "nose", "x": 10, "y": 20, "score": 0.9}, {"name": "left_hip", "x": 5, "y": 50}]}]
[]
"#;

    #[test]
    fn test_replay_in_order() {
        let mut extractor = RecordedExtractor::from_jsonl(RECORDING).unwrap();
        assert_eq!(extractor.remaining(), 2);
        let frame = DynamicImage::new_rgb8(1, 1);

        let bodies = extractor.estimate(&frame).unwrap();
        assert_eq!(bodies.len(), 1);
        let nose = bodies[0].keypoints.get(KeypointName::Nose).unwrap();
        assert!((nose.confidence - 0.9).abs() < f32::EPSILON);
        let hip = bodies[0].keypoints.get(KeypointName::LeftHip).unwrap();
        assert!((hip.confidence - 1.0).abs() < f32::EPSILON);

        assert!(extractor.estimate(&frame).unwrap().is_empty());
        // Exhausted recordings keep yielding nothing.
        assert!(extractor.estimate(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_bad_line_is_reported() {
        let err = RecordedExtractor::from_jsonl("[]\n{oops").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = RecordedExtractor::from_jsonl(r#"[{"keypoints": [{"name": "tail", "x": 0, "y": 0}]}]"#)
            .unwrap_err();
        assert!(matches!(err, OverlayError::ConfigError(_)));
    }
}
