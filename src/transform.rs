// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Garment placement on a tracked torso.
//!
//! The garment is treated as a flat image under a 2D similarity transform:
//! it is shifted so its collar band sits at the origin, scaled by the
//! measured shoulder width, rotated to the shoulder line and translated to
//! the shoulder midpoint.

use serde::Deserialize;

use crate::keypoint::Point;
use crate::orientation::Torso;

/// Fraction of the garment image height between its top edge and the collar band.
pub const COLLAR_FRACTION: f32 = 0.12;

/// Per-garment fitting constants.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    /// Garment width relative to shoulder width.
    pub scale_factor: f32,
    /// Extra vertical shift in garment image pixels (positive moves the garment down).
    #[serde(default)]
    pub vertical_offset: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            scale_factor: 1.8,
            vertical_offset: 0.0,
        }
    }
}

/// Per-frame garment placement derived from the torso.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsoFrame {
    /// Surface point the garment collar is pinned to.
    pub anchor: Point,
    /// Rotation in radians aligning the garment with the shoulder line.
    pub rotation: f32,
    /// Uniform scale applied to the garment image.
    pub scale: f32,
}

/// Compute the placement for a garment image of native width `garment_width`.
///
/// Scale tracks shoulder width only; torso height is ignored.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_transform(torso: &Torso, calibration: &Calibration, garment_width: u32) -> TorsoFrame {
    let span = torso.shoulder_span();
    let shoulder_width = span.norm();
    let scale = if garment_width == 0 {
        0.0
    } else {
        shoulder_width * calibration.scale_factor / garment_width as f32
    };

    TorsoFrame {
        anchor: torso.shoulder_center(),
        rotation: span.y.atan2(span.x),
        scale,
    }
}

/// Origin shift applied to the garment image before scaling, so the collar
/// band rather than the image center lands on the anchor.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn draw_offset(garment_size: (u32, u32), calibration: &Calibration) -> Point {
    let (width, height) = garment_size;
    Point::new(
        -(width as f32) / 2.0,
        -(height as f32) * COLLAR_FRACTION + calibration.vertical_offset,
    )
}

/// A 2x3 affine matrix `[a, b, c; d, e, f]` mapping `(x, y)` to
/// `(a*x + b*y + c, d*x + e*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub m: [f32; 6],
}

impl Affine {
    /// Apply to a point.
    #[must_use]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.m;
        (a * x + b * y + c, d * x + e * y + f)
    }

    /// Inverse transform, or `None` if singular.
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let [a, b, c, d, e, f] = self.m;
        let det = a * e - b * d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            m: [
                e * inv,
                -b * inv,
                (b * f - c * e) * inv,
                -d * inv,
                a * inv,
                (c * d - a * f) * inv,
            ],
        })
    }
}

impl TorsoFrame {
    /// Whether the placement can be drawn.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.scale > 0.0
            && self.scale.is_finite()
            && self.rotation.is_finite()
            && self.anchor.x.is_finite()
            && self.anchor.y.is_finite()
    }

    /// Garment-pixel to surface-pixel transform: translate(anchor) · rotate ·
    /// scale · translate(offset).
    #[must_use]
    pub fn affine(&self, offset: Point) -> Affine {
        let (sin, cos) = self.rotation.sin_cos();
        let s = self.scale;
        let (a, b, d, e) = (s * cos, -s * sin, s * sin, s * cos);
        Affine {
            m: [
                a,
                b,
                a * offset.x + b * offset.y + self.anchor.x,
                d,
                e,
                d * offset.x + e * offset.y + self.anchor.y,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn torso(left: (f32, f32), right: (f32, f32)) -> Torso {
        Torso {
            left_shoulder: Point::new(left.0, left.1),
            right_shoulder: Point::new(right.0, right.1),
            left_hip: Point::new(left.0, left.1 + 200.0),
            right_hip: Point::new(right.0, right.1 + 200.0),
        }
    }

    #[test]
    fn test_anchor_is_shoulder_midpoint() {
        let frame = compute_transform(&torso((100.0, 200.0), (300.0, 220.0)), &Calibration::default(), 600);
        assert_eq!(frame.anchor, Point::new(200.0, 210.0));
    }

    #[test]
    fn test_vertical_shoulders_rotate_quarter_turn() {
        let frame = compute_transform(&torso((100.0, 100.0), (100.0, 300.0)), &Calibration::default(), 600);
        assert!((frame.rotation - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_scale_from_shoulder_width() {
        let calibration = Calibration::default();
        let frame = compute_transform(&torso((100.0, 200.0), (300.0, 200.0)), &calibration, 600);
        // 200 * 1.8 / 600
        assert!((frame.scale - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_doubling_width_doubles_scale() {
        let calibration = Calibration {
            scale_factor: 1.3,
            vertical_offset: 5.0,
        };
        let narrow = compute_transform(&torso((100.0, 200.0), (180.0, 230.0)), &calibration, 512);
        let wide = compute_transform(&torso((100.0, 200.0), (260.0, 260.0)), &calibration, 512);
        assert!((wide.scale - 2.0 * narrow.scale).abs() < 1e-5);
        assert!(wide.scale > narrow.scale);
    }

    #[test]
    fn test_zero_width_garment_is_not_drawable() {
        let frame = compute_transform(&torso((100.0, 200.0), (300.0, 200.0)), &Calibration::default(), 0);
        assert!(!frame.is_drawable());
    }

    #[test]
    fn test_draw_offset_pins_collar() {
        let offset = draw_offset((600, 800), &Calibration::default());
        assert!((offset.x + 300.0).abs() < f32::EPSILON);
        assert!((offset.y + 96.0).abs() < 1e-4);

        let shifted = draw_offset(
            (600, 800),
            &Calibration {
                scale_factor: 1.8,
                vertical_offset: 10.0,
            },
        );
        assert!((shifted.y + 86.0).abs() < 1e-4);
    }

    #[test]
    fn test_affine_maps_collar_to_anchor() {
        let calibration = Calibration::default();
        let frame = compute_transform(&torso((100.0, 150.0), (300.0, 250.0)), &calibration, 600);
        let offset = draw_offset((600, 800), &calibration);
        let affine = frame.affine(offset);

        // Collar center in garment pixels lands on the anchor.
        let (x, y) = affine.apply(300.0, 96.0);
        assert!((x - frame.anchor.x).abs() < 1e-3);
        assert!((y - frame.anchor.y).abs() < 1e-3);

        let inverse = affine.invert().unwrap();
        let (gx, gy) = inverse.apply(x, y);
        assert!((gx - 300.0).abs() < 1e-2);
        assert!((gy - 96.0).abs() < 1e-2);
    }

    #[test]
    fn test_calibration_from_json() {
        let calibration: Calibration =
            serde_json::from_str(r#"{"scaleFactor": 2.0, "verticalOffset": -4}"#).unwrap();
        assert!((calibration.scale_factor - 2.0).abs() < f32::EPSILON);
        assert!((calibration.vertical_offset + 4.0).abs() < f32::EPSILON);
    }
}
