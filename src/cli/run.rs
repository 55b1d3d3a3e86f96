// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

#[cfg(feature = "visualize")]
use image::imageops;

#[cfg(all(feature = "annotate", feature = "visualize"))]
use crate::annotate::Hud;
#[cfg(feature = "visualize")]
use crate::capture::compose_snapshot;
#[cfg(feature = "visualize")]
use crate::visualizer::{Viewer, ViewerEvent};

#[cfg(feature = "visualize")]
use crate::capture::SnapshotWriter;
use crate::cli::args::RunArgs;
use crate::cli::logging::set_verbose;
use crate::extractor::{KeypointExtractor, RecordedExtractor};
use crate::session::{LoopSignal, TryOnSession};
use crate::source::{Source, SourceIterator};
use crate::{GarmentCatalog, PoseModel, TrackingConfig, VERSION};
#[cfg(feature = "visualize")]
use crate::success;
use crate::{error, info, section, verbose, warn};

/// Run the try-on loop from the command line.
#[allow(clippy::too_many_lines)]
pub fn run_tryon(args: &RunArgs) {
    set_verbose(args.verbose);

    let config = TrackingConfig::new()
        .with_torso_confidence(args.torso_conf)
        .with_face_confidence(args.face_conf);

    let catalog = match &args.garment {
        Some(path) => match GarmentCatalog::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("Error loading garment catalog: {e}");
                process::exit(1);
            }
        },
        None => {
            warn!("'garment' argument is missing. Using the built-in sample tee.");
            GarmentCatalog::default()
        }
    };

    let source = match &args.source {
        Some(s) => Source::from(s.as_str()),
        #[cfg(feature = "video")]
        None => {
            warn!("'source' argument is missing. Using camera '--source=0'.");
            Source::Webcam(0)
        }
        #[cfg(not(feature = "video"))]
        None => {
            error!(
                "'source' argument is missing and camera input requires the 'video' feature. Pass --source or compile with --features video."
            );
            process::exit(1);
        }
    };
    let live = source.is_live();

    let extractor_desc = args.keypoints.as_ref().map_or_else(
        || format!("MoveNet {}", args.model),
        |path| format!("recorded keypoints {path}"),
    );
    info!("garment-overlay {VERSION} 🚀 {extractor_desc}");

    let mut session: TryOnSession<Box<dyn KeypointExtractor>> = TryOnSession::new(config);
    let loaded = session.initialize(
        |config| -> crate::Result<Box<dyn KeypointExtractor>> {
            if let Some(path) = &args.keypoints {
                return Ok(Box::new(RecordedExtractor::load(path)?));
            }
            let mut model = PoseModel::load_with_config(&args.model, config.clone())?;
            model.warmup()?;
            Ok(Box::new(model))
        },
        &catalog,
    );
    if let Err(e) = loaded {
        error!("Error loading keypoint extractor: {e}");
        process::exit(1);
    }
    if live {
        verbose!(
            "Garment '{}' ({}) loading in the background",
            catalog.name,
            catalog.id
        );
    } else {
        let loaded = session.wait_for_garment();
        verbose!("Garment '{}' ({}): {loaded}/4 views loaded", catalog.name, catalog.id);
    }

    let frames = match SourceIterator::new(source) {
        Ok(frames) => frames,
        Err(e) => {
            error!("Error opening source: {e}");
            process::exit(1);
        }
    };

    #[cfg(feature = "visualize")]
    let mut writer = SnapshotWriter::new(&args.save_dir);

    #[cfg(not(feature = "visualize"))]
    if args.show {
        warn!("--show requires the 'visualize' feature. Compile with --features visualize to enable the window.");
    }
    #[cfg(feature = "visualize")]
    let show = args.show;
    #[cfg(feature = "visualize")]
    let mut viewer: Option<Viewer> = None;
    #[cfg(all(feature = "annotate", feature = "visualize"))]
    let hud = if args.show { Hud::load() } else { Hud::disabled() };
    #[cfg(feature = "visualize")]
    let mirror = args.mirror;

    section!("Tracking");
    let result = session.run(frames, |view| {
        let report = &view.report;
        if let Some(orientation) = report.changed {
            verbose!("frame {}: orientation → {orientation}", view.meta.index);
        }
        verbose!(
            "frame {} {}: {} bodies, {}, {:.1} FPS, conf {}%{}",
            view.meta.index,
            view.meta.path,
            report.bodies,
            report.orientation,
            report.metrics.fps,
            report.metrics.confidence,
            if report.reliable { "" } else { " (tracking lost)" }
        );

        #[cfg(feature = "visualize")]
        if show {
            let mut display = compose_snapshot(view.frame, view.surface.image());
            if mirror {
                imageops::flip_horizontal_in_place(&mut display);
            }
            #[cfg(all(feature = "annotate", feature = "visualize"))]
            hud.draw(&mut display, &report.metrics, report.orientation);

            let (width, height) = (display.width() as usize, display.height() as usize);
            if viewer.is_none() {
                match Viewer::new("Garment Overlay", width, height) {
                    Ok(v) => viewer = Some(v),
                    Err(e) => {
                        error!("{e}");
                        return LoopSignal::Stop;
                    }
                }
            }

            if let Some(v) = viewer.as_mut() {
                match v.update(&display) {
                    Ok(ViewerEvent::Continue) => {}
                    Ok(ViewerEvent::Capture) => match writer.save(view.frame, view.surface.image()) {
                        Ok(path) => success!("Snapshot saved to {}", path.display()),
                        Err(e) => error!("{e}"),
                    },
                    Ok(ViewerEvent::Close) => return LoopSignal::Stop,
                    Err(e) => {
                        error!("{e}");
                        return LoopSignal::Stop;
                    }
                }
            }
        }

        LoopSignal::Continue
    });

    match result {
        Ok(summary) => {
            let snapshot = session.snapshot();
            verbose!(
                "Processed {} frames, {} tracked, final orientation {}, session {}",
                summary.frames,
                summary.reliable,
                snapshot.orientation,
                snapshot.state
            );
            #[cfg(feature = "visualize")]
            if let Some(dir) = writer.run_dir() {
                verbose!("Snapshots saved to {}", dir.display());
            }
        }
        Err(e) => {
            error!("Tracking stopped: {e}");
            session.close();
            process::exit(1);
        }
    }

    session.close();
}
