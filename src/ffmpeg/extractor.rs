// 비디오 → 이미지 시퀀스 추출
// 디코더에서 프레임을 순서대로 받아 <번호>.<확장자> 로 저장

use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::ffmpeg::decoder::VideoDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use log::info;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// 진행 로그 간격 (프레임)
const PROGRESS_LOG_INTERVAL: u64 = 100;

/// 추출 결과
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub frames: u64,
    pub output_dir: PathBuf,
}

pub struct FrameExtractor {
    config: ExtractConfig,
}

impl FrameExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<ExtractSummary> {
        let config = &self.config;
        config.validate()?;

        let mut decoder = VideoDecoder::open(&config.input_path, config.target_size)?;
        let info = decoder.info();
        info!(
            "Format {}, duration {}us, bit_rate {}",
            info.format_name, info.duration_us, info.bit_rate
        );
        info!(
            "Codec {} {}x{} @ {:.2}fps -> {}x{} .{}",
            info.codec_name,
            info.width,
            info.height,
            info.frame_rate,
            decoder.width(),
            decoder.height(),
            config.extension
        );

        fs::create_dir_all(&config.output_dir).map_err(|e| Error::io(&config.output_dir, e))?;

        let mut written = 0u64;
        while config.max_frames.map_or(true, |max| written < max) {
            let frame = match decoder.next_frame()? {
                Some(f) => f,
                None => break,
            };

            let path = frame_path(
                &config.output_dir,
                config.start_number + written,
                &config.extension,
            );
            save_image(&frame.image, &path, config.jpeg_quality)?;
            written += 1;

            if written % PROGRESS_LOG_INTERVAL == 0 {
                info!("Extracted {} frames", written);
            }
        }

        info!("Done: {} frames -> {:?}", written, config.output_dir);
        Ok(ExtractSummary {
            frames: written,
            output_dir: config.output_dir.clone(),
        })
    }
}

/// <dir>/<number>.<ext>
pub fn frame_path(dir: &Path, number: u64, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", number, extension))
}

/// 확장자로 포맷 결정, JPEG만 품질 지정
pub fn save_image(image: &RgbImage, path: &Path, jpeg_quality: u8) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|e| Error::image(path, e))?;

    if format == ImageFormat::Jpeg {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), jpeg_quality);
        return encoder
            .encode_image(image)
            .map_err(|e| Error::image(path, e));
    }

    image
        .save_with_format(path, format)
        .map_err(|e| Error::image(path, e))
}
