// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::capture::DEFAULT_SAVE_DIR;
use crate::model::DEFAULT_MODEL;
use clap::{Args, Parser, Subcommand};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Run Options:
    --model, -m <MODEL>      Path to MoveNet ONNX model [default: movenet_singlepose_lightning.onnx]
    --source, -s <SOURCE>    Frame source (camera index, video, image, directory, or glob) [default: 0]
    --garment, -g <GARMENT>  Garment catalog JSON [default: built-in tee]
    --keypoints <FILE>       Replay recorded keypoints (JSON lines) instead of running the model
    --show                   Display the overlay in a window (Space/C capture, Esc/Q quit)
    --mirror                 Mirror the displayed image horizontally
    --save-dir <DIR>         Parent directory for snapshots [default: runs/tryon]
    --torso-conf <CONF>      Torso keypoint confidence threshold [default: 0.4]
    --face-conf <CONF>       Face keypoint confidence threshold [default: 0.6]
    --verbose                Show verbose output

Examples:
    garment-overlay run --source 0 --show
    garment-overlay run -m movenet.onnx -s clip.mp4 -g catalog/tee.json --show
    garment-overlay run -s frames/ --keypoints session.jsonl --verbose false"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track a body and overlay the garment on a frame source
    Run(RunArgs),
}

/// Arguments for the run command.
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Path to MoveNet ONNX model file
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Frame source (camera index, video, image, directory, or glob)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Garment catalog JSON file
    #[arg(short, long)]
    pub garment: Option<String>,

    /// Recorded keypoints (JSON lines) replayed instead of the model
    #[arg(long)]
    pub keypoints: Option<String>,

    /// Display the overlay in a window
    #[arg(long, default_value_t = false)]
    pub show: bool,

    /// Mirror the displayed image horizontally
    #[arg(long, default_value_t = false)]
    pub mirror: bool,

    /// Parent directory for snapshots
    #[arg(long, default_value = DEFAULT_SAVE_DIR)]
    pub save_dir: String,

    /// Torso keypoint confidence threshold
    #[arg(long, default_value_t = 0.4)]
    pub torso_conf: f32,

    /// Face keypoint confidence threshold
    #[arg(long, default_value_t = 0.6)]
    pub face_conf: f32,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_defaults() {
        let args = Cli::parse_from(["app", "run"]);
        match args.command {
            Commands::Run(run_args) => {
                assert_eq!(run_args.model, DEFAULT_MODEL);
                assert!(run_args.source.is_none());
                assert!(run_args.garment.is_none());
                assert!(run_args.keypoints.is_none());
                assert!(!run_args.show);
                assert!(!run_args.mirror);
                assert_eq!(run_args.save_dir, "runs/tryon");
                assert!((run_args.torso_conf - 0.4).abs() < f32::EPSILON);
                assert!((run_args.face_conf - 0.6).abs() < f32::EPSILON);
                assert!(run_args.verbose);
            }
        }
    }

    #[test]
    fn test_run_args_custom() {
        let args = Cli::parse_from([
            "app",
            "run",
            "-m",
            "custom.onnx",
            "--source",
            "clip.mp4",
            "-g",
            "tee.json",
            "--show",
            "--mirror",
            "--torso-conf",
            "0.5",
            "--verbose",
            "false",
        ]);
        match args.command {
            Commands::Run(run_args) => {
                assert_eq!(run_args.model, "custom.onnx");
                assert_eq!(run_args.source, Some("clip.mp4".to_string()));
                assert_eq!(run_args.garment, Some("tee.json".to_string()));
                assert!(run_args.show);
                assert!(run_args.mirror);
                assert!((run_args.torso_conf - 0.5).abs() < f32::EPSILON);
                assert!(!run_args.verbose);
            }
        }
    }
}
