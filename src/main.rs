// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;
use garment_overlay::cli::args::{Cli, Commands};
use garment_overlay::cli::run::run_tryon;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_tryon(&args),
    }
}
