use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sudoku_scanner::scan::{apply_roi, LoadedImage, ScanError};
use sudoku_scanner::{compute_roi, ImageSize, RoiParams, RoiRect};

#[derive(Parser, Debug)]
#[command(name = "sudoku-scanner", version, about = "Inspect and apply scanner ROI windows")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the ROI window for an image of the given size as JSON.
    Roi {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[command(flatten)]
        roi: RoiArgs,
    },
    /// Crop an image in place to its ROI, as grid detection does, and print the window.
    Crop {
        image: PathBuf,
        #[command(flatten)]
        roi: RoiArgs,
    },
}

#[derive(Args, Debug)]
struct RoiArgs {
    /// Window side as a fraction of the fitted width.
    #[arg(long, allow_negative_numbers = true)]
    size: f64,
    /// Upward shift as a fraction of the fitted height.
    #[arg(long, allow_negative_numbers = true)]
    offset: f64,
    /// Target height/width ratio of the fitted rectangle.
    #[arg(long, allow_negative_numbers = true)]
    aspect: f64,
}

impl From<&RoiArgs> for RoiParams {
    fn from(a: &RoiArgs) -> Self {
        RoiParams::new(a.size, a.offset, a.aspect)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        sudoku_scanner::core::init_tracing(false);
        log::set_max_level(level);
    }

    #[cfg(not(feature = "tracing"))]
    {
        let _ = sudoku_scanner::init_with_level(level);
    }
}

fn run(cli: &Cli) -> Result<Option<RoiRect>, ScanError> {
    match &cli.command {
        Command::Roi { width, height, roi } => {
            Ok(compute_roi(ImageSize::new(*width, *height), &roi.into())?)
        }
        Command::Crop { image, roi } => {
            let mut loaded = LoadedImage::open(image)?;
            apply_roi(image, &mut loaded, &roi.into())
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rect = run(&cli)?;
    println!("{}", serde_json::to_string(&rect)?);
    Ok(())
}
