//! Image-sequence AR overlay driver.
//!
//! Reads frames from a directory in name order, composites the overlay
//! onto the reference markers in each and writes the results out as PNGs.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use ar_overlay::{OverlayError, OverlaySession, SessionConfig};
use ar_overlay_core::init_with_level;
use clap::Parser;
use image::RgbImage;

#[derive(Parser, Debug)]
#[command(name = "ar-overlay", about = "Composite an image onto four ArUco markers")]
struct Args {
    /// Overlay image warped onto the markers.
    #[arg(long)]
    overlay: PathBuf,

    /// Directory of input frames, processed in name order.
    #[arg(long)]
    frames: PathBuf,

    /// Output directory for composite (and annotated) frames.
    #[arg(long)]
    out: PathBuf,

    /// Expected marker ids in role order: TL,TR,BR,BL.
    #[arg(long, value_delimiter = ',', num_args = 4, default_values_t = [24u32, 42, 70, 66])]
    ids: Vec<u32>,

    /// Built-in dictionary name.
    #[arg(long, default_value = "DICT_4X4_100")]
    dict: String,

    /// JSON session config; flags above override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip writing annotated detection frames.
    #[arg(long)]
    no_boxes: bool,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if init_with_level(level).is_err() {
        eprintln!("logger already installed");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), OverlayError> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => SessionConfig::default(),
    };
    config.dictionary = args.dict.clone();
    config.expected_ids = [args.ids[0], args.ids[1], args.ids[2], args.ids[3]];
    config.draw_detections = !args.no_boxes;

    let overlay = image::ImageReader::open(&args.overlay)?.decode()?.to_rgb8();
    log::info!(
        "overlay {}x{}, ids {:?}, dictionary {}",
        overlay.width(),
        overlay.height(),
        config.expected_ids,
        config.dictionary
    );

    let mut session = OverlaySession::new(&config, overlay)?;

    fs::create_dir_all(&args.out)?;

    let mut frames: Vec<PathBuf> = fs::read_dir(&args.frames)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    frames.sort();

    let mut resolved = 0usize;
    for (index, path) in frames.iter().enumerate() {
        let frame: RgbImage = match image::ImageReader::open(path)?.decode() {
            Ok(img) => img.to_rgb8(),
            Err(err) => {
                log::warn!("skipping {}: {err}", path.display());
                continue;
            }
        };

        let out = session.process_frame(&frame);
        if out.markers_resolved {
            resolved += 1;
        }
        log::info!(
            "frame {index:04}: {} ({})",
            if out.markers_resolved { "composited" } else { "passed through" },
            path.display()
        );

        out.composite
            .save(args.out.join(format!("composite_{index:04}.png")))?;
        if let Some(annotated) = &out.annotated {
            annotated.save(args.out.join(format!("detections_{index:04}.png")))?;
        }
    }

    log::info!("{resolved}/{} frames composited", frames.len());
    Ok(())
}
