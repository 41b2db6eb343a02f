// 이미지 시퀀스 → 비디오
// 사용법: frames2video <INPUT_DIR> <OUTPUT> [옵션]

use anyhow::{Context, Result};
use clap::Parser;
use frameseq::config::{self, EncodeConfig};
use frameseq::encoding::SequenceExporter;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Encode a directory of numbered images into a video", long_about = None)]
struct Args {
    /// Directory with images named by frame number (0.jpg, 1.jpg, ...)
    input_dir: PathBuf,

    /// Output video file; the container is chosen from the extension
    output: PathBuf,

    /// Encoder name
    #[arg(short, long, default_value = config::DEFAULT_CODEC)]
    codec: String,

    /// Output width (images are resized)
    #[arg(long, default_value_t = config::DEFAULT_WIDTH)]
    width: u32,

    /// Output height (images are resized)
    #[arg(long, default_value_t = config::DEFAULT_HEIGHT)]
    height: u32,

    /// Target bit rate in bits per second
    #[arg(short, long, default_value_t = config::DEFAULT_BIT_RATE)]
    bit_rate: usize,

    /// Frames per second
    #[arg(short, long, default_value_t = config::DEFAULT_FPS)]
    fps: u32,

    /// Keyframe interval
    #[arg(long)]
    gop: Option<u32>,

    /// Maximum consecutive B-frames
    #[arg(long)]
    max_b_frames: Option<usize>,

    /// Encoder private option as KEY=VALUE (e.g. crf=23), may be repeated
    #[arg(short = 'o', long = "option")]
    options: Vec<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    frameseq::logging::init(args.verbose);

    let codec_options = args
        .options
        .iter()
        .map(|raw| config::parse_codec_option(raw))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid --option")?;

    let config = EncodeConfig {
        input_dir: args.input_dir,
        output_path: args.output,
        codec_name: args.codec,
        width: args.width,
        height: args.height,
        bit_rate: args.bit_rate,
        fps: args.fps,
        gop_size: args.gop,
        max_b_frames: args.max_b_frames,
        codec_options,
    };

    let summary = SequenceExporter::new(config.clone())
        .run()
        .with_context(|| format!("Failed to encode {:?}", config.input_dir))?;

    info!(
        "Wrote {} frames ({} packets) to {:?}",
        summary.frames, summary.packets, summary.output_path
    );
    Ok(())
}
