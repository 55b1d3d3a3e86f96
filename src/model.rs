// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! MoveNet single-pose model.
//!
//! This module provides [`PoseModel`], a [`KeypointExtractor`] backed by an
//! ONNX export of MoveNet SinglePose (Lightning or Thunder). The model takes
//! a square `[1, H, W, 3]` tensor of raw RGB values, `int32` for the TF Hub
//! signature or `float32` for some re-exports, and returns `[1, 1, 17, 3]`
//! rows of normalized `(y, x, score)`.

use std::path::Path;

use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::tensor::{PrimitiveTensorElementType, TensorElementType};
use ort::value::TensorRef;

use crate::config::TrackingConfig;
use crate::error::{OverlayError, Result};
use crate::extractor::KeypointExtractor;
use crate::keypoint::{Body, Keypoint, KeypointName, KeypointSet};

/// Default model file name.
pub const DEFAULT_MODEL: &str = "movenet_singlepose_lightning.onnx";

/// Keypoints at or below this score do not contribute to the pose score.
const MIN_KEYPOINT_SCORE: f32 = 0.2;

/// Element type of the model input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `tensor(int32)`, the TF Hub MoveNet signature.
    Int32,
    /// `tensor(float)`.
    Float32,
}

impl InputKind {
    /// Select the input kind from the element type the model declares.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::ModelLoadError`] for non-tensor inputs and
    /// element types other than `int32` and `float32`.
    pub fn from_element_type(ty: Option<TensorElementType>) -> Result<Self> {
        match ty {
            Some(TensorElementType::Int32) => Ok(Self::Int32),
            Some(TensorElementType::Float32) => Ok(Self::Float32),
            Some(other) => Err(OverlayError::ModelLoadError(format!(
                "Unsupported MoveNet input type {other:?}, expected int32 or float32"
            ))),
            None => Err(OverlayError::ModelLoadError(
                "MoveNet input is not a tensor".to_string(),
            )),
        }
    }
}

/// ONNX MoveNet pose model.
///
/// # Example
///
/// ```no_run
/// use garment_overlay::{KeypointExtractor, PoseModel};
///
/// let mut model = PoseModel::load("movenet_singlepose_lightning.onnx")?;
/// let frame = image::open("person.jpg")?;
/// let bodies = model.estimate(&frame)?;
/// println!("{} bodies", bodies.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PoseModel {
    session: Session,
    input_name: String,
    input_kind: InputKind,
    output_name: String,
    config: TrackingConfig,
    warmed_up: bool,
}

impl PoseModel {
    /// Load a model with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, TrackingConfig::default())
    }

    /// Load a model with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: TrackingConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OverlayError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| OverlayError::ModelLoadError(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| OverlayError::ModelLoadError(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| OverlayError::ModelLoadError(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| OverlayError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| OverlayError::ModelLoadError("Model has no inputs".to_string()))?;
        let input_name = input.name.clone();
        let input_kind = InputKind::from_element_type(input.input_type.tensor_type())?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| OverlayError::ModelLoadError("Model has no outputs".to_string()))?;

        Ok(Self {
            session,
            input_name,
            input_kind,
            output_name,
            config,
            warmed_up: false,
        })
    }

    /// Run one inference on a blank input so the first real frame is not slow.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn warmup(&mut self) -> Result<()> {
        if self.warmed_up {
            return Ok(());
        }
        let size = self.config.imgsz;
        let dummy = Array4::<u8>::zeros((1, size, size, 3));
        let _ = self.run_inference(&dummy)?;
        self.warmed_up = true;
        Ok(())
    }

    /// Model input size.
    #[must_use]
    pub const fn imgsz(&self) -> usize {
        self.config.imgsz
    }

    /// Input element type declared by the model.
    #[must_use]
    pub const fn input_kind(&self) -> InputKind {
        self.input_kind
    }

    fn run_inference(&mut self, pixels: &Array4<u8>) -> Result<(Vec<f32>, Vec<usize>)> {
        match self.input_kind {
            InputKind::Int32 => self.run_tensor(&pixels.mapv(i32::from)),
            InputKind::Float32 => self.run_tensor(&pixels.mapv(f32::from)),
        }
    }

    fn run_tensor<T>(&mut self, input: &Array4<T>) -> Result<(Vec<f32>, Vec<usize>)>
    where
        T: PrimitiveTensorElementType + Clone + std::fmt::Debug + 'static,
    {
        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous)
            .map_err(|e| OverlayError::InferenceError(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![&self.input_name => input_tensor];
        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| OverlayError::InferenceError(format!("Inference failed: {e}")))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            OverlayError::InferenceError(format!("Output '{}' not found", self.output_name))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| OverlayError::InferenceError(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let shape_vec: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        Ok((data.to_vec(), shape_vec))
    }
}

impl KeypointExtractor for PoseModel {
    fn estimate(&mut self, frame: &DynamicImage) -> Result<Vec<Body>> {
        if !self.warmed_up {
            self.warmup()?;
        }

        let pixels = frame_to_pixels(frame, self.config.imgsz);
        let (data, shape) = self.run_inference(&pixels)?;

        let body = decode_single_pose(&data, &shape, frame.width(), frame.height())?;
        if body.score < self.config.min_pose_score {
            return Ok(Vec::new());
        }
        Ok(vec![body])
    }
}

impl std::fmt::Debug for PoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseModel")
            .field("input", &self.input_name)
            .field("input_kind", &self.input_kind)
            .field("output", &self.output_name)
            .field("imgsz", &self.config.imgsz)
            .finish_non_exhaustive()
    }
}

/// Resize a frame to the square model input as an NHWC array of raw RGB values.
#[allow(clippy::cast_possible_truncation)]
fn frame_to_pixels(frame: &DynamicImage, size: usize) -> Array4<u8> {
    let side = size as u32;
    let resized = frame.resize_exact(side, side, FilterType::Triangle).to_rgb8();

    let mut pixels = Array4::<u8>::zeros((1, size, size, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            pixels[[0, y as usize, x as usize, c]] = pixel[c];
        }
    }
    pixels
}

/// Decode MoveNet `(y, x, score)` rows into a [`Body`] in frame pixels.
///
/// The pose score is the mean of keypoint scores above [`MIN_KEYPOINT_SCORE`].
#[allow(clippy::cast_precision_loss)]
fn decode_single_pose(data: &[f32], shape: &[usize], width: u32, height: u32) -> Result<Body> {
    let needed = KeypointName::COUNT * 3;
    if data.len() < needed || shape.last() != Some(&3) {
        return Err(OverlayError::InferenceError(format!(
            "Unexpected MoveNet output shape {shape:?}"
        )));
    }

    let (w, h) = (width as f32, height as f32);
    let mut keypoints = KeypointSet::new();
    let mut total = 0.0;
    let mut counted = 0usize;

    for (index, row) in data.chunks_exact(3).enumerate() {
        let Some(name) = KeypointName::from_index(index) else {
            break;
        };
        let (y, x, score) = (row[0], row[1], row[2]);
        keypoints.insert(name, Keypoint::new(x * w, y * h, score));
        if score > MIN_KEYPOINT_SCORE {
            total += score;
            counted += 1;
        }
    }

    let score = if counted > 0 { total / counted as f32 } else { 0.0 };
    Ok(Body::new(keypoints, score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let result = PoseModel::load("nonexistent.onnx");
        assert!(matches!(result.unwrap_err(), OverlayError::ModelLoadError(_)));
    }

    #[test]
    fn test_decode_scales_to_frame() {
        let mut data = vec![0.0; 51];
        // left_shoulder at normalized (y=0.25, x=0.5)
        let i = KeypointName::LeftShoulder.index() * 3;
        data[i..i + 3].copy_from_slice(&[0.25, 0.5, 0.9]);
        let nose = KeypointName::Nose.index() * 3;
        data[nose..nose + 3].copy_from_slice(&[0.1, 0.1, 0.5]);

        let body = decode_single_pose(&data, &[1, 1, 17, 3], 640, 480).unwrap();
        let kp = body.keypoints.get(KeypointName::LeftShoulder).unwrap();
        assert!((kp.position.x - 320.0).abs() < 1e-4);
        assert!((kp.position.y - 120.0).abs() < 1e-4);
        assert_eq!(body.keypoints.len(), 17);
        // Only the two keypoints above 0.2 count.
        assert!((body.score - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(decode_single_pose(&[0.0; 10], &[1, 10], 10, 10).is_err());
    }

    #[test]
    fn test_frame_to_pixels_shape() {
        let frame = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(64, 32, image::Rgb([7, 8, 9])));
        let pixels = frame_to_pixels(&frame, 192);
        assert_eq!(pixels.shape(), &[1, 192, 192, 3]);
        assert_eq!(pixels[[0, 100, 100, 2]], 9);
        assert_eq!(pixels.mapv(i32::from)[[0, 0, 0, 0]], 7);
    }

    #[test]
    fn test_input_kind_from_declared_type() {
        assert_eq!(
            InputKind::from_element_type(Some(TensorElementType::Int32)).unwrap(),
            InputKind::Int32
        );
        assert_eq!(
            InputKind::from_element_type(Some(TensorElementType::Float32)).unwrap(),
            InputKind::Float32
        );
        assert!(matches!(
            InputKind::from_element_type(Some(TensorElementType::Uint8)),
            Err(OverlayError::ModelLoadError(_))
        ));
        assert!(matches!(
            InputKind::from_element_type(None),
            Err(OverlayError::ModelLoadError(_))
        ));
    }
}
