// 이미지 시퀀스 → 비디오 내보내기
// 디렉토리 목록 → 번호순 정렬 → (로드 → 리사이즈 → YUV420P → 인코딩) 반복 → trailer

use crate::config::EncodeConfig;
use crate::encoding::encoder::VideoEncoder;
use crate::encoding::yuv420p::Yuv420pImage;
use crate::error::{Error, Result};
use crate::sequence;
use image::imageops::{self, FilterType};
use image::RgbImage;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 진행 로그 간격 (프레임)
const PROGRESS_LOG_INTERVAL: u64 = 100;

/// 내보내기 결과
#[derive(Debug, Clone)]
pub struct EncodeSummary {
    pub frames: u64,
    pub packets: u64,
    pub output_path: PathBuf,
}

/// 이미지 시퀀스 인코딩 작업
pub struct SequenceExporter {
    config: EncodeConfig,
    cancelled: Arc<AtomicBool>,
}

impl SequenceExporter {
    pub fn new(config: EncodeConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 취소 플래그 (다른 스레드에서 store(true) 하면 다음 프레임 전에 중단)
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn run(&self) -> Result<EncodeSummary> {
        let config = &self.config;
        config.validate()?;

        info!(
            "Encoding {:?} -> {:?}: {}x{} @ {}fps, {} bps, codec={}",
            config.input_dir,
            config.output_path,
            config.width,
            config.height,
            config.fps,
            config.bit_rate,
            config.codec_name
        );

        // 1. 입력 목록 (인코더 생성 전에 검증 → 빈 출력 파일 방지)
        let files = sequence::list_sequence(&config.input_dir)?;
        if files.is_empty() {
            return Err(Error::EmptySequence(config.input_dir.clone()));
        }
        let total = files.len() as u64;
        info!("Found {} images", total);

        // 2. 인코더 + 헤더
        let mut encoder = VideoEncoder::new(config)?;
        encoder.write_header()?;

        // 3. 프레임 단위 인코딩
        for (i, entry) in files.iter().enumerate() {
            if self.cancelled.load(Ordering::SeqCst) {
                warn!("Cancelled at frame {}/{}", i, total);
                // 불완전하지만 재생 가능한 파일로 마무리
                encoder.finish()?;
                return Err(Error::Cancelled(i as u64));
            }

            let rgb = load_frame(&entry.path, encoder.width(), encoder.height())?;
            let yuv = Yuv420pImage::from_rgb(&rgb)?;
            encoder.encode_frame(&yuv)?;

            let done = i as u64 + 1;
            if done % PROGRESS_LOG_INTERVAL == 0 {
                info!("Progress: {}/{} ({}%)", done, total, done * 100 / total);
            }
        }

        // 4. flush + trailer
        encoder.finish()?;
        info!("Done: {} frames -> {:?}", encoder.frame_count(), config.output_path);

        Ok(EncodeSummary {
            frames: encoder.frame_count(),
            packets: encoder.packet_count(),
            output_path: config.output_path.clone(),
        })
    }
}

/// 이미지 로드 → RGB8 → 인코더 해상도로 리사이즈 (bilinear)
pub fn load_frame(path: &Path, width: u32, height: u32) -> Result<RgbImage> {
    let rgb = image::open(path)
        .map_err(|e| Error::image(path, e))?
        .to_rgb8();

    if rgb.dimensions() == (width, height) {
        return Ok(rgb);
    }
    Ok(imageops::resize(&rgb, width, height, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_load_frame_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.png");
        RgbImage::from_pixel(30, 20, Rgb([10, 200, 30])).save(&path).unwrap();

        let same = load_frame(&path, 30, 20).unwrap();
        assert_eq!(same.dimensions(), (30, 20));

        let resized = load_frame(&path, 64, 48).unwrap();
        assert_eq!(resized.dimensions(), (64, 48));
        // 단색 이미지는 리사이즈 후에도 같은 색
        assert_eq!(resized.get_pixel(32, 24), &Rgb([10, 200, 30]));
    }

    #[test]
    fn test_load_frame_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.png");
        std::fs::write(&path, b"not a png").unwrap();

        match load_frame(&path, 2, 2) {
            Err(Error::Image { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected image error, got {:?}", other.map(|i| i.dimensions())),
        }
    }

    #[test]
    fn test_empty_directory_is_rejected() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let output_path = output.path().join("out.mp4");

        let exporter = SequenceExporter::new(EncodeConfig {
            input_dir: input.path().to_path_buf(),
            output_path: output_path.clone(),
            ..EncodeConfig::default()
        });

        assert!(matches!(exporter.run(), Err(Error::EmptySequence(_))));
        assert!(!output_path.exists());
    }

    #[test]
    fn test_invalid_config_is_rejected_first() {
        let exporter = SequenceExporter::new(EncodeConfig {
            input_dir: PathBuf::from("/definitely/missing"),
            width: 33,
            ..EncodeConfig::default()
        });
        assert!(matches!(exporter.run(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    #[ignore] // mpeg4 인코더가 포함된 FFmpeg 빌드 필요
    fn test_export_sequence() {
        let input = tempfile::tempdir().unwrap();
        for i in 0..12u8 {
            RgbImage::from_pixel(40, 30, Rgb([i * 20, 100, 255 - i * 20]))
                .save(input.path().join(format!("{}.png", i)))
                .unwrap();
        }
        let output = tempfile::tempdir().unwrap();
        let output_path = output.path().join("seq.avi");

        let summary = SequenceExporter::new(EncodeConfig {
            input_dir: input.path().to_path_buf(),
            output_path: output_path.clone(),
            codec_name: "mpeg4".into(),
            width: 64,
            height: 48,
            ..EncodeConfig::default()
        })
        .run()
        .unwrap();

        assert_eq!(summary.frames, 12);
        assert!(summary.packets > 0);
        assert!(output_path.exists());
    }

    #[test]
    #[ignore] // mpeg4 인코더가 포함된 FFmpeg 빌드 필요
    fn test_cancel_before_first_frame() {
        let input = tempfile::tempdir().unwrap();
        RgbImage::new(8, 8).save(input.path().join("0.png")).unwrap();
        let output = tempfile::tempdir().unwrap();

        let exporter = SequenceExporter::new(EncodeConfig {
            input_dir: input.path().to_path_buf(),
            output_path: output.path().join("seq.avi"),
            codec_name: "mpeg4".into(),
            width: 8,
            height: 8,
            ..EncodeConfig::default()
        });
        exporter.cancel_flag().store(true, Ordering::SeqCst);

        assert!(matches!(exporter.run(), Err(Error::Cancelled(0))));
    }
}
