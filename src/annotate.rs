// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Live readout drawn over the displayed frame.

use ab_glyph::{FontVec, PxScale};
use image::RgbaImage;
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::orientation::Orientation;
use crate::session::FrameMetrics;
use crate::visualizer::Color;
use crate::{verbose, warn};

/// Assets URL for downloading fonts
const ASSETS_URL: &str = "https://github.com/ultralytics/assets/releases/download/v0.0.0";

/// Font used for the readout.
pub const HUD_FONT: &str = "Arial.ttf";

/// Readout text height in pixels.
const TEXT_SIZE: f32 = 18.0;

/// Below this confidence the readout switches to the warning color.
const LOW_CONFIDENCE: u8 = 50;

/// Check if font exists locally or download it
pub fn check_font(font: &str) -> Option<PathBuf> {
    let font_name = Path::new(font).file_name()?.to_string_lossy();
    let config_dir = dirs::config_dir()?.join("garment-overlay");
    let font_path = config_dir.join(font_name.as_ref());

    if font_path.exists() {
        return Some(font_path);
    }

    if let Err(e) = fs::create_dir_all(&config_dir) {
        warn!("Failed to create config directory: {e}");
        return None;
    }

    let url = format!("{ASSETS_URL}/{font_name}");
    verbose!("Downloading {url} to {}", font_path.display());

    match ureq::get(&url).call() {
        Ok(response) => {
            let mut file = match File::create(&font_path) {
                Ok(f) => f,
                Err(e) => {
                    warn!("Failed to create font file: {e}");
                    return None;
                }
            };

            let mut reader = response.into_body().into_reader();
            if let Err(e) = io::copy(&mut reader, &mut file) {
                warn!("Failed to download font: {e}");
                let _ = fs::remove_file(&font_path);
                return None;
            }

            Some(font_path)
        }
        Err(e) => {
            warn!("Failed to download font from {url}: {e}");
            None
        }
    }
}

/// Readout line, e.g. `FRONT | 30.0 FPS | CONF 87%`.
#[must_use]
pub fn hud_text(metrics: &FrameMetrics, orientation: Orientation) -> String {
    format!(
        "{} | {:.1} FPS | CONF {}%",
        orientation.as_str().to_uppercase(),
        metrics.fps,
        metrics.confidence
    )
}

/// Draws the fps, confidence and orientation readout.
///
/// Without a font the readout is skipped; the values are still logged by the
/// caller.
pub struct Hud {
    font: Option<FontVec>,
}

impl Hud {
    /// Load the readout font, downloading it on first use.
    #[must_use]
    pub fn load() -> Self {
        let font = check_font(HUD_FONT)
            .and_then(|path| fs::read(path).ok())
            .and_then(|data| FontVec::try_from_vec(data).ok());
        if font.is_none() {
            warn!("Readout font unavailable, HUD disabled");
        }
        Self { font }
    }

    /// A readout that never draws.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { font: None }
    }

    /// Whether text can be drawn.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.font.is_some()
    }

    /// Draw the readout in the top-left corner of `image`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn draw(&self, image: &mut RgbaImage, metrics: &FrameMetrics, orientation: Orientation) {
        let Some(font) = &self.font else {
            return;
        };

        let text = hud_text(metrics, orientation);
        let scale = PxScale::from(TEXT_SIZE);
        let (text_w, text_h) = imageproc::drawing::text_size(scale, font, &text);

        let panel_w = (text_w + 16).min(image.width());
        let panel_h = (text_h + 12).min(image.height());
        if panel_w == 0 || panel_h == 0 {
            return;
        }
        draw_filled_rect_mut(
            image,
            Rect::at(0, 0).of_size(panel_w, panel_h),
            Color::BLACK.rgba(),
        );

        let color = if metrics.confidence < LOW_CONFIDENCE {
            Color::YELLOW
        } else {
            Color::GOLD
        };
        draw_text_mut(image, color.rgba(), 8, 6, scale, font, &text);
    }
}
