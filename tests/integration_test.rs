// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the try-on pipeline

use std::sync::Arc;

use garment_overlay::{
    Body, Calibration, CloseHandle, GarmentAsset, GarmentCatalog, KeypointExtractor, LoopSignal, Orientation,
    OverlayError, PoseModel, RecordedExtractor, SessionState, SnapshotWriter, Source,
    SourceIterator, TrackingConfig, TryOnSession,
};
use image::{DynamicImage, Rgb, Rgba, RgbImage, RgbaImage};

fn body_json(nose_x: f32) -> String {
    format!(
        r#"{{"score": 0.82, "keypoints": [
            {{"name": "left_shoulder", "x": 40, "y": 40, "score": 0.9}},
            {{"name": "right_shoulder", "x": 80, "y": 40, "score": 0.9}},
            {{"name": "left_hip", "x": 45, "y": 90, "score": 0.9}},
            {{"name": "right_hip", "x": 75, "y": 90, "score": 0.9}},
            {{"name": "nose", "x": {nose_x}, "y": 20, "score": 0.9}}
        ]}}"#
    )
    .replace('\n', " ")
}

fn recording(lines: &[String]) -> RecordedExtractor {
    RecordedExtractor::from_jsonl(&lines.join("\n")).unwrap()
}

fn frame() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 120, Rgb([90, 90, 90])))
}

fn tee() -> Arc<GarmentAsset> {
    let images = Orientation::ALL.map(|o| {
        let shade = 50 * (o.index() as u8 + 1);
        (o, RgbaImage::from_pixel(20, 30, Rgba([shade, 0, 0, 255])))
    });
    Arc::new(GarmentAsset::from_images(Calibration::default(), images))
}

fn session_with<E: KeypointExtractor>(extractor: E) -> TryOnSession<E> {
    let mut session = TryOnSession::new(TrackingConfig::default());
    session.initialize_with_asset(|_| Ok(extractor), tee()).unwrap();
    session
}

#[test]
fn test_zero_bodies_clears_and_keeps_orientation() {
    let lines = [format!("[{}]", body_json(40.0)), "[]".to_string()];
    let mut session = session_with(recording(&lines));

    let first = session.tick(&frame()).unwrap().unwrap();
    assert_eq!(first.orientation, Orientation::Left);
    assert!(!session.surface().is_clear());

    let second = session.tick(&frame()).unwrap().unwrap();
    assert_eq!(second.bodies, 0);
    assert_eq!(second.metrics.confidence, 0);
    assert!(session.surface().is_clear());
    assert_eq!(session.orientation(), Orientation::Left);
}

#[test]
fn test_front_to_left_flip_without_smoothing() {
    let lines = [
        format!("[{}]", body_json(60.0)),
        format!("[{}]", body_json(40.0)),
    ];
    let mut session = session_with(recording(&lines));

    let front = session.tick(&frame()).unwrap().unwrap();
    assert_eq!(front.orientation, Orientation::Front);
    assert_eq!(front.changed, None);
    assert_eq!(front.metrics.confidence, 82);

    let left = session.tick(&frame()).unwrap().unwrap();
    assert_eq!(left.changed, Some(Orientation::Left));
    assert_eq!(session.orientation(), Orientation::Left);
    assert!(left.garment_drawn);
}

#[test]
fn test_unreliable_frame_reports_zero_confidence() {
    let weak = r#"[{"score": 0.7, "keypoints": [
        {"name": "left_shoulder", "x": 40, "y": 40, "score": 0.9},
        {"name": "right_shoulder", "x": 80, "y": 40, "score": 0.9},
        {"name": "left_hip", "x": 45, "y": 90, "score": 0.4},
        {"name": "right_hip", "x": 75, "y": 90, "score": 0.9}
    ]}]"#
        .replace('\n', " ");
    let mut session = session_with(recording(&[weak]));

    let report = session.tick(&frame()).unwrap().unwrap();
    assert!(!report.reliable);
    assert_eq!(report.bodies, 1);
    assert_eq!(report.metrics.confidence, 0);
    assert!(session.surface().is_clear());
}

#[test]
fn test_model_load_failure_is_terminal() {
    let mut session: TryOnSession<PoseModel> = TryOnSession::new(TrackingConfig::default());
    let result = session.initialize_with_asset(
        |config| PoseModel::load_with_config("does-not-exist.onnx", config.clone()),
        tee(),
    );

    assert!(matches!(result, Err(OverlayError::ModelLoadError(_))));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.tick(&frame()).is_err());
}

/// Closes the session from inside the extractor call, like a user leaving
/// while a frame is being processed.
struct ClosingExtractor {
    inner: RecordedExtractor,
    handle: CloseHandle,
    close_on_call: usize,
    calls: usize,
}

impl KeypointExtractor for ClosingExtractor {
    fn estimate(&mut self, frame: &DynamicImage) -> garment_overlay::Result<Vec<Body>> {
        self.calls += 1;
        if self.calls == self.close_on_call {
            self.handle.close();
        }
        self.inner.estimate(frame)
    }
}

#[test]
fn test_close_discards_in_flight_results() {
    let lines = [
        format!("[{}]", body_json(60.0)),
        format!("[{}]", body_json(40.0)),
    ];
    let mut session = TryOnSession::new(TrackingConfig::default());
    let handle = session.close_handle();
    session
        .initialize_with_asset(
            |_| {
                Ok(ClosingExtractor {
                    inner: recording(&lines),
                    handle: handle.clone(),
                    close_on_call: 2,
                    calls: 0,
                })
            },
            tee(),
        )
        .unwrap();

    assert!(session.tick(&frame()).unwrap().is_some());
    let drawn = session.surface().clone();

    assert!(session.tick(&frame()).unwrap().is_none());
    assert!(!handle.is_open());
    assert_eq!(session.state(), SessionState::Closed);
    // The Left frame was in flight and must not switch the view.
    assert_eq!(session.orientation(), Orientation::Front);
    assert_eq!(session.snapshot().frame_index, 1);
    assert_eq!(session.surface(), &drawn);
}

#[test]
fn test_run_over_source_and_capture() {
    let lines = vec![format!("[{}]", body_json(60.0)); 3];
    let mut session = session_with(recording(&lines));

    let dir = tempfile::tempdir().unwrap();
    let mut writer = SnapshotWriter::new(dir.path());
    let mut saved = Vec::new();

    let frames = (0..3).map(|_| frame()).map(Source::from).flat_map(|source| {
        SourceIterator::new(source).unwrap()
    });
    let summary = session
        .run(frames, |view| {
            if view.report.reliable {
                saved.push(writer.save(view.frame, view.surface.image()).unwrap());
            }
            LoopSignal::Continue
        })
        .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.reliable, 3);
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(saved.len(), 3);
    assert!(saved.iter().all(|p| p.starts_with(dir.path().join("capture")) && p.exists()));
    let distinct: std::collections::HashSet<_> = saved.iter().collect();
    assert_eq!(distinct.len(), saved.len());

    let path = session.capture(&frame(), &mut writer).unwrap();
    let snapshot = image::open(&path).unwrap().to_rgba8();
    assert_eq!(snapshot.dimensions(), (120, 120));
    // Background pixel comes from the video frame.
    assert_eq!(*snapshot.get_pixel(2, 118), Rgba([90, 90, 90, 255]));
}

#[test]
fn test_catalog_preload_then_garment_drawn() {
    let dir = tempfile::tempdir().unwrap();
    for view in ["front", "left"] {
        RgbaImage::from_pixel(20, 30, Rgba([200, 30, 30, 255]))
            .save(dir.path().join(format!("{view}.png")))
            .unwrap();
    }
    let catalog_path = dir.path().join("tee.json");
    std::fs::write(
        &catalog_path,
        r#"{"id": "tee", "name": "Tee", "images": {"front": "front.png", "left": "left.png", "back": "gone.png"}}"#,
    )
    .unwrap();
    let catalog = GarmentCatalog::load(&catalog_path).unwrap();

    let lines = [format!("[{}]", body_json(60.0))];
    let mut session = TryOnSession::new(TrackingConfig::default());
    session.initialize(|_| Ok(recording(&lines)), &catalog).unwrap();

    assert_eq!(session.wait_for_garment(), 2);
    assert_eq!(session.wait_for_garment(), 2);
    let report = session.tick(&frame()).unwrap().unwrap();
    assert!(report.garment_drawn);
    assert_eq!(*session.surface().image().get_pixel(60, 45), Rgba([200, 30, 30, 255]));
}
