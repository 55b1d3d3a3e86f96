// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::keypoint::KeypointName;

/// A polyline through landmarks, drawn only when every landmark qualifies.
#[derive(Debug, Clone, Copy)]
pub struct TrackingPath {
    /// Landmarks visited in order.
    pub points: &'static [KeypointName],
    /// Whether the last point connects back to the first.
    pub closed: bool,
}

const fn open(points: &'static [KeypointName]) -> TrackingPath {
    TrackingPath {
        points,
        closed: false,
    }
}

/// Debug tracking lines: shoulders, torso box, both arms, face outline.
pub const TRACKING_PATHS: [TrackingPath; 11] = [
    // shoulder line
    open(&[KeypointName::LeftShoulder, KeypointName::RightShoulder]),
    // torso box
    TrackingPath {
        points: &[
            KeypointName::LeftShoulder,
            KeypointName::LeftHip,
            KeypointName::RightHip,
            KeypointName::RightShoulder,
        ],
        closed: true,
    },
    // arms
    open(&[KeypointName::LeftShoulder, KeypointName::LeftElbow]),
    open(&[KeypointName::LeftElbow, KeypointName::LeftWrist]),
    open(&[KeypointName::RightShoulder, KeypointName::RightElbow]),
    open(&[KeypointName::RightElbow, KeypointName::RightWrist]),
    // face
    open(&[KeypointName::Nose, KeypointName::LeftEye]),
    open(&[KeypointName::Nose, KeypointName::RightEye]),
    open(&[KeypointName::LeftEye, KeypointName::LeftEar]),
    open(&[KeypointName::RightEye, KeypointName::RightEar]),
    open(&[KeypointName::LeftEye, KeypointName::RightEye]),
];

/// Tracking line width in pixels.
pub const LINE_WIDTH: u32 = 3;
