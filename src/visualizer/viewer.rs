// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Live window for the composited overlay.
//!
//! The window's refresh cap paces the frame loop: [`Viewer::update`] blocks
//! until the next display frame.

use image::RgbaImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::error::{OverlayError, Result};

/// Display refresh rate the window is capped at.
const TARGET_FPS: usize = 60;

/// What the user asked for during the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Keep going.
    Continue,
    /// Save a snapshot (Space or C).
    Capture,
    /// Window closed, Escape or Q pressed.
    Close,
}

/// A simple image viewer using minifb.
pub struct Viewer {
    window: Window,
    pub width: usize,
    pub height: usize,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a new viewer window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| OverlayError::VisualizerError(format!("Failed to create window: {e}")))?;

        window.set_target_fps(TARGET_FPS);

        Ok(Self {
            window,
            width,
            height,
            buffer: Vec::new(),
        })
    }

    /// Whether the window is still open.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
            && !self.window.is_key_down(Key::Escape)
            && !self.window.is_key_down(Key::Q)
    }

    /// Show a new image and report user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the window buffer cannot be updated.
    pub fn update(&mut self, image: &RgbaImage) -> Result<ViewerEvent> {
        if !self.is_open() {
            return Ok(ViewerEvent::Close);
        }

        let (img_width, img_height) = (image.width() as usize, image.height() as usize);

        let num_pixels = img_width * img_height;
        if self.buffer.len() != num_pixels {
            self.buffer.resize(num_pixels, 0);
        }

        // Pack as 0x00RRGGBB, alpha dropped
        for (dst, pixel) in self.buffer.iter_mut().zip(image.pixels()) {
            let [r, g, b, _] = pixel.0;
            *dst = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
        }

        if self.width != img_width || self.height != img_height {
            self.width = img_width;
            self.height = img_height;
        }

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| OverlayError::VisualizerError(format!("Failed to update window: {e}")))?;

        if self.window.is_key_pressed(Key::Space, KeyRepeat::No)
            || self.window.is_key_pressed(Key::C, KeyRepeat::No)
        {
            return Ok(ViewerEvent::Capture);
        }
        Ok(ViewerEvent::Continue)
    }
}
