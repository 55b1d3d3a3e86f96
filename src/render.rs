// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Overlay drawing.
//!
//! The overlay lives on a transparent [`Surface`] the size of the video
//! frame. Every [`OverlayRenderer::render`] call clears the whole surface and
//! redraws from scratch, so consecutive calls with the same input produce the
//! same pixels.

use image::{RgbaImage, imageops};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use imageproc::geometric_transformations::{Interpolation, warp_into_with};

use crate::config::TrackingConfig;
use crate::keypoint::{KeypointSet, Point};
use crate::transform::TorsoFrame;
use crate::visualizer::Color;
use crate::visualizer::color::TRANSPARENT;
use crate::visualizer::skeleton::{LINE_WIDTH, TRACKING_PATHS, TrackingPath};

/// Transparent RGBA drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Create a cleared surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    /// Surface size.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Make every pixel transparent.
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    /// Resize to match the video frame. Returns `true` if the size changed;
    /// the surface is cleared in that case.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.image.dimensions() == (width, height) {
            return false;
        }
        self.image = RgbaImage::from_pixel(width, height, TRANSPARENT);
        true
    }

    /// Whether nothing is drawn.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    /// The underlying image.
    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// A garment variant placed on the torso.
#[derive(Debug, Clone, Copy)]
pub struct GarmentDraw<'a> {
    /// Garment raster for the current orientation.
    pub image: &'a RgbaImage,
    /// Placement on the torso.
    pub frame: TorsoFrame,
    /// Origin shift from [`crate::transform::draw_offset`].
    pub offset: Point,
}

/// Everything drawn for a reliable frame.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    /// Keypoints for the tracking lines.
    pub keypoints: &'a KeypointSet,
    /// The garment, when its variant is loaded.
    pub garment: Option<GarmentDraw<'a>>,
}

/// Draws tracking lines and the transformed garment.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    color: Color,
    line_width: u32,
    skeleton_confidence: f32,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(&TrackingConfig::default())
    }
}

impl OverlayRenderer {
    /// Create a renderer using the skeleton threshold in `config`.
    #[must_use]
    pub const fn new(config: &TrackingConfig) -> Self {
        Self {
            color: Color::GREEN,
            line_width: LINE_WIDTH,
            skeleton_confidence: config.skeleton_confidence,
        }
    }

    /// Redraw the surface.
    ///
    /// `None` marks an unreliable frame and leaves the surface cleared.
    /// Otherwise tracking lines are drawn first and the garment on top.
    pub fn render(&self, surface: &mut Surface, overlay: Option<&Overlay<'_>>) {
        surface.clear();

        let Some(overlay) = overlay else {
            return;
        };

        for path in &TRACKING_PATHS {
            self.draw_path(&mut surface.image, overlay.keypoints, path);
        }

        if let Some(garment) = &overlay.garment {
            draw_garment(&mut surface.image, garment);
        }
    }

    fn draw_path(&self, canvas: &mut RgbaImage, keypoints: &KeypointSet, path: &TrackingPath) {
        let points: Option<Vec<Point>> = path
            .points
            .iter()
            .map(|&name| {
                keypoints
                    .confident(name, self.skeleton_confidence)
                    .map(|k| k.position)
            })
            .collect();
        let Some(points) = points else {
            return;
        };

        for pair in points.windows(2) {
            self.draw_segment(canvas, pair[0], pair[1]);
        }
        if path.closed && points.len() > 2 {
            self.draw_segment(canvas, points[points.len() - 1], points[0]);
        }
    }

    /// Thick segment with round caps.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn draw_segment(&self, canvas: &mut RgbaImage, start: Point, end: Point) {
        let color = self.color.rgba();
        let delta = end - start;
        let length = delta.norm();
        let (nx, ny) = if length > 0.0 {
            (-delta.y / length, delta.x / length)
        } else {
            (0.0, 0.0)
        };

        let half = (self.line_width / 2) as i32;
        for t in -half..=half {
            let (ox, oy) = (nx * t as f32, ny * t as f32);
            draw_line_segment_mut(
                canvas,
                (start.x + ox, start.y + oy),
                (end.x + ox, end.y + oy),
                color,
            );
        }

        for p in [start, end] {
            draw_filled_circle_mut(canvas, (p.x.round() as i32, p.y.round() as i32), half, color);
        }
    }
}

/// Warp the garment into its bounding box on the surface and alpha-blend it.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn draw_garment(canvas: &mut RgbaImage, garment: &GarmentDraw<'_>) {
    if !garment.frame.is_drawable() || garment.image.width() == 0 || garment.image.height() == 0 {
        return;
    }

    let forward = garment.frame.affine(garment.offset);
    let Some(inverse) = forward.invert() else {
        return;
    };

    let (gw, gh) = (garment.image.width() as f32, garment.image.height() as f32);
    let corners = [(0.0, 0.0), (gw, 0.0), (0.0, gh), (gw, gh)].map(|(x, y)| forward.apply(x, y));

    let (cw, ch) = (canvas.width() as f32, canvas.height() as f32);
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min).floor().max(0.0);
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min).floor().max(0.0);
    let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max).ceil().min(cw);
    let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max).ceil().min(ch);
    if max_x <= min_x || max_y <= min_y {
        return;
    }

    let mut layer = RgbaImage::new((max_x - min_x) as u32, (max_y - min_y) as u32);
    warp_into_with(
        garment.image,
        |x, y| inverse.apply(x + min_x, y + min_y),
        Interpolation::Bilinear,
        TRANSPARENT,
        &mut layer,
    );

    imageops::overlay(canvas, &layer, i64::from(min_x as u32), i64::from(min_y as u32));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::{Keypoint, KeypointName};
    use crate::transform::{Calibration, compute_transform, draw_offset};
    use crate::orientation::OrientationClassifier;
    use image::Rgba;

    fn keypoints(conf: f32) -> KeypointSet {
        KeypointSet::new()
            .with(KeypointName::LeftShoulder, Keypoint::new(40.0, 40.0, conf))
            .with(KeypointName::RightShoulder, Keypoint::new(80.0, 40.0, conf))
            .with(KeypointName::LeftHip, Keypoint::new(45.0, 90.0, conf))
            .with(KeypointName::RightHip, Keypoint::new(75.0, 90.0, conf))
            .with(KeypointName::LeftElbow, Keypoint::new(30.0, 70.0, conf))
            .with(KeypointName::Nose, Keypoint::new(60.0, 20.0, conf))
    }

    fn garment_image() -> RgbaImage {
        RgbaImage::from_pixel(20, 30, Rgba([200, 30, 30, 255]))
    }

    fn placed<'a>(set: &'a KeypointSet, image: &'a RgbaImage) -> Overlay<'a> {
        let calibration = Calibration::default();
        let torso = OrientationClassifier::default().torso(set).unwrap();
        Overlay {
            keypoints: set,
            garment: Some(GarmentDraw {
                image,
                frame: compute_transform(&torso, &calibration, image.width()),
                offset: draw_offset(image.dimensions(), &calibration),
            }),
        }
    }

    #[test]
    fn test_unreliable_frame_only_clears() {
        let mut surface = Surface::new(120, 120);
        let renderer = OverlayRenderer::default();
        let set = keypoints(0.9);
        renderer.render(&mut surface, Some(&Overlay { keypoints: &set, garment: None }));
        assert!(!surface.is_clear());

        renderer.render(&mut surface, None);
        assert!(surface.is_clear());
    }

    #[test]
    fn test_skeleton_draws_shoulder_line() {
        let mut surface = Surface::new(120, 120);
        let set = keypoints(0.9);
        OverlayRenderer::default().render(&mut surface, Some(&Overlay { keypoints: &set, garment: None }));
        assert_eq!(*surface.image().get_pixel(60, 40), Color::GREEN.rgba());
    }

    #[test]
    fn test_low_confidence_segments_skipped() {
        let mut surface = Surface::new(120, 120);
        let set = keypoints(0.3);
        OverlayRenderer::default().render(&mut surface, Some(&Overlay { keypoints: &set, garment: None }));
        assert!(surface.is_clear());
    }

    #[test]
    fn test_each_segment_gated_on_its_endpoints() {
        let set = KeypointSet::new()
            .with(KeypointName::LeftShoulder, Keypoint::new(40.0, 40.0, 0.9))
            .with(KeypointName::RightShoulder, Keypoint::new(80.0, 40.0, 0.9))
            .with(KeypointName::LeftHip, Keypoint::new(45.0, 90.0, 0.9))
            .with(KeypointName::RightHip, Keypoint::new(75.0, 90.0, 0.9))
            .with(KeypointName::LeftElbow, Keypoint::new(20.0, 70.0, 0.31))
            .with(KeypointName::LeftWrist, Keypoint::new(10.0, 100.0, 0.3))
            .with(KeypointName::Nose, Keypoint::new(60.0, 20.0, 0.31))
            .with(KeypointName::LeftEye, Keypoint::new(50.0, 10.0, 0.31))
            .with(KeypointName::RightEye, Keypoint::new(70.0, 10.0, 0.3));
        let mut surface = Surface::new(120, 120);
        OverlayRenderer::default().render(&mut surface, Some(&Overlay { keypoints: &set, garment: None }));
        let image = surface.image();
        let green = Color::GREEN.rgba();

        // shoulder -> elbow drawn, elbow -> wrist skipped
        assert_eq!(*image.get_pixel(30, 55), green);
        assert_eq!(image.get_pixel(15, 85).0[3], 0);
        // nose -> left eye drawn, nose -> right eye and eye -> eye skipped
        assert_eq!(*image.get_pixel(55, 15), green);
        assert_eq!(image.get_pixel(65, 15).0[3], 0);
        assert_eq!(image.get_pixel(60, 10).0[3], 0);
        // torso box closes through the hips
        assert_eq!(*image.get_pixel(60, 90), green);
    }

    #[test]
    fn test_torso_box_needs_all_corners() {
        let set = KeypointSet::new()
            .with(KeypointName::LeftShoulder, Keypoint::new(40.0, 40.0, 0.9))
            .with(KeypointName::RightShoulder, Keypoint::new(80.0, 40.0, 0.9))
            .with(KeypointName::LeftHip, Keypoint::new(45.0, 90.0, 0.31))
            .with(KeypointName::RightHip, Keypoint::new(75.0, 90.0, 0.3));
        let mut surface = Surface::new(120, 120);
        OverlayRenderer::default().render(&mut surface, Some(&Overlay { keypoints: &set, garment: None }));

        assert_eq!(*surface.image().get_pixel(60, 40), Color::GREEN.rgba());
        assert_eq!(surface.image().get_pixel(60, 90).0[3], 0);
        assert_eq!(surface.image().get_pixel(42, 65).0[3], 0);
    }

    #[test]
    fn test_garment_covers_anchor() {
        let mut surface = Surface::new(120, 120);
        let set = keypoints(0.9);
        let image = garment_image();
        OverlayRenderer::default().render(&mut surface, Some(&placed(&set, &image)));

        // Anchor (60, 40) sits on the shoulder line but the garment is drawn on top.
        assert_eq!(*surface.image().get_pixel(60, 45), Rgba([200, 30, 30, 255]));
        // Far corner stays transparent.
        assert_eq!(surface.image().get_pixel(119, 119).0[3], 0);
    }

    #[test]
    fn test_render_is_idempotent() {
        let set = keypoints(0.9);
        let image = garment_image();
        let overlay = placed(&set, &image);
        let renderer = OverlayRenderer::default();

        let mut surface = Surface::new(120, 120);
        renderer.render(&mut surface, Some(&overlay));
        let first = surface.clone();
        renderer.render(&mut surface, Some(&overlay));
        assert_eq!(first, surface);
    }

    #[test]
    fn test_surface_resize() {
        let mut surface = Surface::new(10, 10);
        assert!(!surface.resize(10, 10));
        assert!(surface.resize(20, 15));
        assert_eq!(surface.dimensions(), (20, 15));
        assert!(surface.is_clear());
    }
}
