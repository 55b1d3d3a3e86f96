// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame sources for the try-on loop.
//!
//! A [`SourceIterator`] is the capture device: it is opened eagerly so an
//! unavailable camera or file fails before the loop starts, and dropping it
//! releases the device.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{OverlayError, Result};

/// Where video frames come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Path to a single image, shown as a one-frame stream.
    Image(PathBuf),
    /// In-memory frame.
    ImageBuffer(DynamicImage),
    /// List of image paths played in order.
    ImageList(Vec<PathBuf>),
    /// Directory of images played in name order.
    Directory(PathBuf),
    /// Glob pattern such as `frames/*.png`.
    Glob(String),
    /// Path to a video file.
    Video(PathBuf),
    /// Camera device index.
    Webcam(u32),
}

impl Source {
    /// Whether this source is a live or recorded video.
    #[must_use]
    pub const fn is_video(&self) -> bool {
        matches!(self, Self::Video(_) | Self::Webcam(_))
    }

    /// Whether this source is the live camera.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Webcam(_))
    }

    /// Get the path if this source has one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Image(p) | Self::Video(p) | Self::Directory(p) => Some(p),
            _ => None,
        }
    }

    /// Device path for a camera index.
    #[must_use]
    pub fn webcam_device(index: u32) -> PathBuf {
        PathBuf::from(format!("/dev/video{index}"))
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        if let Ok(idx) = s.parse::<u32>() {
            return Self::Webcam(idx);
        }

        if s.contains('*') {
            return Self::Glob(s.to_string());
        }

        let path = PathBuf::from(s);
        if path.is_dir() {
            return Self::Directory(path);
        }

        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if matches!(
                ext.as_str(),
                "mp4" | "avi" | "mov" | "mkv" | "wmv" | "flv" | "webm" | "m4v" | "mpeg" | "mpg"
            ) {
                return Self::Video(path);
            }
        }

        Self::Image(path)
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::from(path.to_string_lossy().as_ref())
    }
}

impl From<DynamicImage> for Source {
    fn from(img: DynamicImage) -> Self {
        Self::ImageBuffer(img)
    }
}

impl From<u32> for Source {
    fn from(idx: u32) -> Self {
        Self::Webcam(idx)
    }
}

/// Metadata about a source frame.
#[derive(Debug, Clone, Default)]
pub struct FrameMeta {
    /// Frame index within the source.
    pub index: usize,
    /// Source path or device.
    pub path: String,
    /// Native frame rate for video sources.
    pub fps: Option<f32>,
}

/// Iterator over frames from a source.
pub struct SourceIterator {
    source: Source,
    current_frame: usize,
    image_paths: Vec<PathBuf>,
    #[cfg(feature = "video")]
    decoder: Option<video_rs::decode::Decoder>,
}

impl SourceIterator {
    /// Open a source.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::CaptureError`] if the device, file or
    /// directory cannot be opened, and [`OverlayError::FeatureNotEnabled`]
    /// for video sources without the `video` feature.
    pub fn new(source: Source) -> Result<Self> {
        let image_paths = match &source {
            Source::Directory(path) => collect_images_from_dir(path)?,
            Source::Glob(pattern) => collect_images_from_glob(pattern)?,
            Source::Image(path) => vec![path.clone()],
            Source::ImageList(paths) => paths.clone(),
            Source::ImageBuffer(_) | Source::Video(_) | Source::Webcam(_) => vec![],
        };

        #[cfg(feature = "video")]
        let decoder = match &source {
            Source::Video(path) => Some(open_decoder(path)?),
            Source::Webcam(idx) => Some(open_decoder(&Source::webcam_device(*idx))?),
            _ => None,
        };

        #[cfg(not(feature = "video"))]
        if source.is_video() {
            return Err(OverlayError::FeatureNotEnabled(
                "Video and camera sources require the 'video' feature".to_string(),
            ));
        }

        Ok(Self {
            source,
            current_frame: 0,
            image_paths,
            #[cfg(feature = "video")]
            decoder,
        })
    }

    /// The source being read.
    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    fn next_image(&mut self) -> Option<Result<(DynamicImage, FrameMeta)>> {
        let path = self.image_paths.get(self.current_frame)?;
        let meta = FrameMeta {
            index: self.current_frame,
            path: path.to_string_lossy().to_string(),
            fps: None,
        };
        self.current_frame += 1;

        Some(image::open(path).map(|img| (img, meta)).map_err(|e| {
            OverlayError::CaptureError(format!("Failed to load {}: {e}", path.display()))
        }))
    }

    #[cfg(feature = "video")]
    fn next_video_frame(&mut self) -> Option<Result<(DynamicImage, FrameMeta)>> {
        let decoder = self.decoder.as_mut()?;
        // Any decode error, including end of stream, ends the source.
        let (_ts, frame) = decoder.decode().ok()?;
        let meta = FrameMeta {
            index: self.current_frame,
            path: match &self.source {
                Source::Webcam(idx) => Source::webcam_device(*idx).to_string_lossy().to_string(),
                other => other
                    .path()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default(),
            },
            fps: Some(decoder.frame_rate()),
        };
        self.current_frame += 1;
        Some(video_frame_to_image(&frame).map(|img| (img, meta)))
    }

    #[cfg(not(feature = "video"))]
    fn next_video_frame(&mut self) -> Option<Result<(DynamicImage, FrameMeta)>> {
        None
    }
}

impl Iterator for SourceIterator {
    type Item = Result<(DynamicImage, FrameMeta)>;

    fn next(&mut self) -> Option<Self::Item> {
        match &self.source {
            Source::Image(_) | Source::Directory(_) | Source::Glob(_) | Source::ImageList(_) => {
                self.next_image()
            }
            Source::ImageBuffer(img) => {
                if self.current_frame > 0 {
                    return None;
                }
                self.current_frame = 1;
                Some(Ok((img.clone(), FrameMeta::default())))
            }
            Source::Video(_) | Source::Webcam(_) => self.next_video_frame(),
        }
    }
}

/// Check if a path is an image file based on extension.
fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(
            ext.as_str(),
            "jpg" | "jpeg" | "png" | "bmp" | "gif" | "webp" | "tiff" | "tif"
        )
    })
}

fn collect_images_from_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(OverlayError::CaptureError(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_image_file(path))
        .collect();

    paths.sort();
    Ok(paths)
}

/// Supports `dir/*` and `dir/*.ext` patterns.
fn collect_images_from_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let Some(star_pos) = pattern.find('*') else {
        return Ok(vec![PathBuf::from(pattern)]);
    };

    let dir_part = &pattern[..star_pos];
    let dir = if dir_part.is_empty() {
        Path::new(".")
    } else {
        Path::new(dir_part.trim_end_matches('/').trim_end_matches('\\'))
    };
    let ext_filter: Option<String> = pattern[star_pos..]
        .strip_prefix("*.")
        .map(str::to_lowercase);

    if !dir.is_dir() {
        return Err(OverlayError::CaptureError(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            ext_filter.as_ref().map_or_else(
                || is_image_file(path),
                |ext| {
                    path.extension()
                        .is_some_and(|e| e.to_string_lossy().to_lowercase() == *ext)
                },
            )
        })
        .collect();

    paths.sort();
    Ok(paths)
}

#[cfg(feature = "video")]
fn open_decoder(path: &Path) -> Result<video_rs::decode::Decoder> {
    video_rs::decode::Decoder::new(path).map_err(|e| {
        OverlayError::CaptureError(format!("Failed to open {}: {e}", path.display()))
    })
}

#[cfg(feature = "video")]
/// Convert a `video_rs` Frame (HWC RGB) to `DynamicImage`.
fn video_frame_to_image(arr: &video_rs::Frame) -> Result<DynamicImage> {
    let shape = arr.shape();
    let height = u32::try_from(shape[0])
        .map_err(|_| OverlayError::VideoError("Frame height exceeds u32::MAX".to_string()))?;
    let width = u32::try_from(shape[1])
        .map_err(|_| OverlayError::VideoError("Frame width exceeds u32::MAX".to_string()))?;

    let rgb_data: Vec<u8> = arr.iter().copied().collect();
    let buffer = image::RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
        OverlayError::VideoError("Failed to create image from video frame".to_string())
    })?;

    Ok(DynamicImage::ImageRgb8(buffer))
}
