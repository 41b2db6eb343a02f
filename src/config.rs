// 인코딩/추출 설정
// 기본값은 기존 도구의 고정 상수 (libx265, 1280x720, 4216kbps, 10fps)

use crate::error::{Error, Result};
use std::path::PathBuf;

pub const DEFAULT_CODEC: &str = "libx265";
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_BIT_RATE: usize = 4_216_000;
pub const DEFAULT_FPS: u32 = 10;
pub const DEFAULT_EXTENSION: &str = "jpg";
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// 이미지 시퀀스 → 비디오 설정
#[derive(Debug, Clone)]
pub struct EncodeConfig {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub codec_name: String,
    pub width: u32,
    pub height: u32,
    pub bit_rate: usize,
    pub fps: u32,
    pub gop_size: Option<u32>,
    pub max_b_frames: Option<usize>,
    /// 코덱 private 옵션 (예: crf=23, preset=medium)
    pub codec_options: Vec<(String, String)>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_path: PathBuf::from("output.mp4"),
            codec_name: DEFAULT_CODEC.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            bit_rate: DEFAULT_BIT_RATE,
            fps: DEFAULT_FPS,
            gop_size: None,
            max_b_frames: None,
            codec_options: Vec::new(),
        }
    }
}

impl EncodeConfig {
    pub fn validate(&self) -> Result<()> {
        validate_yuv420p_size(self.width, self.height)?;
        if self.fps == 0 {
            return Err(Error::InvalidConfig("fps must be positive".into()));
        }
        // time_base는 AVRational (i32 분모)
        if self.fps > i32::MAX as u32 {
            return Err(Error::InvalidConfig(format!(
                "fps must not exceed {}, got {}",
                i32::MAX,
                self.fps
            )));
        }
        if self.bit_rate == 0 {
            return Err(Error::InvalidConfig("bit rate must be positive".into()));
        }
        if self.codec_name.trim().is_empty() {
            return Err(Error::InvalidConfig("codec name is empty".into()));
        }
        if self.gop_size == Some(0) {
            return Err(Error::InvalidConfig("gop size must be positive".into()));
        }
        Ok(())
    }
}

/// 비디오 → 이미지 시퀀스 설정
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// 출력 이미지 확장자 (포맷 결정)
    pub extension: String,
    pub start_number: u64,
    pub max_frames: Option<u64>,
    /// None이면 원본 해상도
    pub target_size: Option<(u32, u32)>,
    pub jpeg_quality: u8,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_dir: PathBuf::from("."),
            extension: DEFAULT_EXTENSION.to_string(),
            start_number: 0,
            max_frames: None,
            target_size: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<()> {
        if image::ImageFormat::from_extension(&self.extension).is_none() {
            return Err(Error::InvalidConfig(format!(
                "unsupported image extension: {}",
                self.extension
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidConfig(format!(
                "jpeg quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if let Some((w, h)) = self.target_size {
            if w == 0 || h == 0 {
                return Err(Error::InvalidConfig(format!("invalid target size {}x{}", w, h)));
            }
        }
        Ok(())
    }
}

/// YUV420P는 2x2 블록당 chroma 1샘플 → 짝수 해상도만 허용
pub fn validate_yuv420p_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidConfig(format!("invalid size {}x{}", width, height)));
    }
    if width % 2 != 0 || height % 2 != 0 {
        return Err(Error::InvalidConfig(format!(
            "YUV420P requires even dimensions, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

/// "KEY=VALUE" 형태의 코덱 옵션 파싱
pub fn parse_codec_option(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(Error::InvalidConfig(format!("expected KEY=VALUE, got {:?}", raw))),
    }
}
