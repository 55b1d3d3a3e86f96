// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the overlay pipeline.

use std::fmt;

/// Result type alias for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Main error type for the overlay pipeline.
///
/// Per-frame tracking loss is not represented here: an unreliable frame is an
/// expected steady-state condition and is reported through the session
/// metrics instead.
#[derive(Debug)]
pub enum OverlayError {
    /// Error loading the pose model.
    ModelLoadError(String),
    /// Error during keypoint extraction.
    InferenceError(String),
    /// Error processing images.
    ImageError(String),
    /// Invalid configuration or catalog provided.
    ConfigError(String),
    /// Capture device could not be opened or read.
    CaptureError(String),
    /// Garment asset could not be fetched or decoded.
    AssetError(String),
    /// IO error (file not found, permission denied, etc.).
    IoError(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
    /// Operation not allowed in the current session state.
    SessionError(String),
    /// Visualizer error.
    VisualizerError(String),
    /// Video/stream processing error.
    VideoError(String),
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::CaptureError(msg) => write!(f, "Capture error: {msg}"),
            Self::AssetError(msg) => write!(f, "Asset error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::SessionError(msg) => write!(f, "Session error: {msg}"),
            Self::VisualizerError(msg) => write!(f, "Visualizer error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for OverlayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for OverlayError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OverlayError::ModelLoadError("test".to_string());
        assert_eq!(err.to_string(), "Model load error: test");

        let err = OverlayError::CaptureError("camera 0".to_string());
        assert_eq!(err.to_string(), "Capture error: camera 0");
    }

    #[test]
    fn test_json_error_maps_to_config() {
        let err: OverlayError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, OverlayError::ConfigError(_)));
    }
}
