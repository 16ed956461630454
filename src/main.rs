// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use yolo_decode::cli::args::{Cli, Commands};
use yolo_decode::cli::decode::run_decode;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode(args) => run_decode(&args),
    }
}
