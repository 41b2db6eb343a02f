// 비디오 → 이미지 시퀀스
// 사용법: video2frames <INPUT> [--output-dir DIR] [옵션]

use anyhow::{bail, Context, Result};
use clap::Parser;
use frameseq::config::{self, ExtractConfig};
use frameseq::ffmpeg::FrameExtractor;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Decode a video into numbered still images", long_about = None)]
struct Args {
    /// Input video file
    input: PathBuf,

    /// Directory for the extracted images
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Image file extension (jpg, png, bmp, ...)
    #[arg(short, long, default_value = config::DEFAULT_EXTENSION)]
    format: String,

    /// Number of the first image
    #[arg(long, default_value_t = 0)]
    start_number: u64,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    max_frames: Option<u64>,

    /// Output width (requires --height)
    #[arg(long)]
    width: Option<u32>,

    /// Output height (requires --width)
    #[arg(long)]
    height: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value_t = config::DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    frameseq::logging::init(args.verbose);

    let target_size = match (args.width, args.height) {
        (Some(w), Some(h)) => Some((w, h)),
        (None, None) => None,
        _ => bail!("--width and --height must be given together"),
    };

    let config = ExtractConfig {
        input_path: args.input,
        output_dir: args.output_dir,
        extension: args.format,
        start_number: args.start_number,
        max_frames: args.max_frames,
        target_size,
        jpeg_quality: args.quality,
    };

    let summary = FrameExtractor::new(config.clone())
        .run()
        .with_context(|| format!("Failed to extract frames from {:?}", config.input_path))?;

    info!("Wrote {} frames to {:?}", summary.frames, summary.output_dir);
    Ok(())
}
