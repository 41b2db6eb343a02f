// FFmpeg 디코더 모듈 (ffmpeg-next)
// 아키텍처: pull 방식 순차 디코딩 + 상태 머신 (Reading → Draining → Finished)

use crate::error::{Error, Result};
use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling;
use image::RgbImage;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// 디코더 상태 머신
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// 패킷을 읽으며 디코딩 중
    Reading,
    /// 입력 소진, EOF 전송 후 디코더 버퍼 비우는 중
    Draining,
    /// 모든 프레임 반환 완료
    Finished,
}

/// 입력 파일 정보 (로그용)
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub format_name: String,
    /// 마이크로초 (AV_TIME_BASE), 알 수 없으면 0 이하
    pub duration_us: i64,
    pub bit_rate: i64,
    pub codec_name: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// 디코딩 + RGB 변환된 프레임
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// 디코딩 순서 번호 (0부터)
    pub number: u64,
    pub pts: Option<i64>,
    /// 프레임을 담고 있던 패킷의 dts / 크기 (bytes)
    pub packet_dts: i64,
    pub packet_size: usize,
    pub key_frame: bool,
    /// I/P/B 등, 알 수 없으면 '?'
    pub picture_type: char,
    pub image: RgbImage,
}

/// 비디오 디코더 (첫 번째 비디오 스트림만 디코딩)
pub struct VideoDecoder {
    path: PathBuf,
    input_ctx: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: scaling::Context,
    width: u32,
    height: u32,
    info: VideoInfo,
    state: DecoderState,
    frames_decoded: u64,
}

impl VideoDecoder {
    /// 디코더 생성 (Multi-threading)
    fn create_decoder(
        codec_params: ffmpeg::codec::Parameters,
    ) -> Result<ffmpeg::codec::decoder::Video> {
        let mut context = ffmpeg::codec::context::Context::from_parameters(codec_params)
            .map_err(|e| Error::ffmpeg("Failed to copy codec parameters", e))?;

        // 프레임 스레딩 (최대 4스레드)
        if let Ok(parallelism) = std::thread::available_parallelism() {
            context.set_threading(ffmpeg::threading::Config {
                kind: ffmpeg::threading::Type::Frame,
                count: parallelism.get().min(4),
            });
        }

        context
            .decoder()
            .video()
            .map_err(|e| Error::ffmpeg("Failed to open codec", e))
    }

    /// 비디오 파일 열기
    /// - target_size: None이면 원본 해상도로 RGB 변환
    pub fn open(file_path: &Path, target_size: Option<(u32, u32)>) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::ffmpeg("FFmpeg init failed", e))?;

        // 1차 시도: 기본 오픈
        // 2차 시도: moov atom이 파일 끝에 있는 경우 — probesize 확장
        let input_ctx = ffmpeg::format::input(&file_path)
            .or_else(|_| {
                let mut opts = ffmpeg::Dictionary::new();
                opts.set("probesize", "100000000"); // 100MB
                opts.set("analyzeduration", "30000000"); // 30초
                ffmpeg::format::input_with_dictionary(&file_path, opts)
            })
            .map_err(|e| Error::ffmpeg("Could not open input file", e))?;

        // 첫 번째 비디오 스트림
        let video_stream = input_ctx
            .streams()
            .find(|s| s.parameters().medium() == ffmpeg::media::Type::Video)
            .ok_or_else(|| Error::NoVideoStream(file_path.to_path_buf()))?;

        let video_stream_index = video_stream.index();
        let frame_rate = f64::from(video_stream.avg_frame_rate());
        let decoder = Self::create_decoder(video_stream.parameters())?;

        let src_width = decoder.width();
        let src_height = decoder.height();
        let (width, height) = target_size.unwrap_or((src_width, src_height));

        // 디코더 네이티브 포맷 → packed RGB24
        let scaler = scaling::Context::get(
            decoder.format(),
            src_width,
            src_height,
            Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .map_err(|e| Error::ffmpeg("Failed to create scaler", e))?;

        let codec_name = decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| format!("{:?}", decoder.id()));

        let info = VideoInfo {
            format_name: input_ctx.format().name().to_string(),
            duration_us: input_ctx.duration(),
            bit_rate: input_ctx.bit_rate(),
            codec_name,
            width: src_width,
            height: src_height,
            frame_rate,
        };

        Ok(Self {
            path: file_path.to_path_buf(),
            input_ctx,
            video_stream_index,
            decoder,
            scaler,
            width,
            height,
            info,
            state: DecoderState::Reading,
            frames_decoded: 0,
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 출력 (RGB) 해상도
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// 다음 프레임 디코딩
    /// - 디코더 버퍼에 프레임이 있으면 바로 반환
    /// - EAGAIN: 다음 패킷 읽어서 전송 (다른 스트림 패킷은 건너뜀)
    /// - 패킷 소진: EOF 전송 후 남은 프레임 drain
    /// - Finished: 항상 None
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>> {
        loop {
            if self.state == DecoderState::Finished {
                return Ok(None);
            }

            let mut frame = ffmpeg::frame::Video::empty();
            match self.decoder.receive_frame(&mut frame) {
                Ok(()) => return self.convert_frame(&frame).map(Some),
                Err(ffmpeg::Error::Eof) => {
                    self.state = DecoderState::Finished;
                    return Ok(None);
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {}
                Err(e) => {
                    return Err(Error::ffmpeg(
                        "Error while receiving a frame from the decoder",
                        e,
                    ))
                }
            }

            if self.state == DecoderState::Draining {
                // EOF 이후 EAGAIN은 나오지 않아야 하지만 무한 루프 방지
                self.state = DecoderState::Finished;
                return Ok(None);
            }

            self.feed_packet()?;
        }
    }

    /// 비디오 스트림 패킷 하나를 디코더에 전송 (없으면 EOF 전송)
    fn feed_packet(&mut self) -> Result<()> {
        for (stream, packet) in self.input_ctx.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }

            return match self.decoder.send_packet(&packet) {
                Ok(()) => Ok(()),
                // 손상된 패킷은 건너뛰고 계속
                Err(ffmpeg::Error::InvalidData) => {
                    warn!("Skipping corrupt packet (pts {:?})", packet.pts());
                    Ok(())
                }
                Err(e) => Err(Error::ffmpeg("Error while sending a packet to the decoder", e)),
            };
        }

        // for 루프 자연종료 = 패킷 소진
        self.decoder
            .send_eof()
            .map_err(|e| Error::ffmpeg("Failed to send EOF to decoder", e))?;
        self.state = DecoderState::Draining;
        Ok(())
    }

    /// 디코딩된 프레임 → RGB24 변환 → RgbImage
    fn convert_frame(&mut self, raw_frame: &ffmpeg::frame::Video) -> Result<DecodedFrame> {
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(raw_frame, &mut rgb_frame)
            .map_err(|e| Error::ffmpeg("Failed to scale frame", e))?;

        let image = copy_packed_rgb(
            rgb_frame.data(0),
            rgb_frame.stride(0),
            self.width,
            self.height,
        )?;

        let packet = raw_frame.packet();
        let decoded = DecodedFrame {
            number: self.frames_decoded,
            pts: raw_frame.pts(),
            packet_dts: packet.dts,
            packet_size: packet.size,
            key_frame: raw_frame.is_key(),
            picture_type: picture_type_char(raw_frame.kind()),
            image,
        };
        self.frames_decoded += 1;

        debug!(
            "Frame {} (type={}, size={}bytes) pts {:?} key_frame {} [DTS {}]",
            decoded.number,
            decoded.picture_type,
            decoded.packet_size,
            decoded.pts,
            decoded.key_frame,
            decoded.packet_dts
        );

        Ok(decoded)
    }
}

/// stride가 있는 packed RGB24 버퍼 → 연속 RgbImage
/// 손상된 프레임이면 panic 대신 Err
pub fn copy_packed_rgb(src: &[u8], stride: usize, width: u32, height: u32) -> Result<RgbImage> {
    let row_size = width as usize * 3;
    let rows = height as usize;

    if stride < row_size {
        return Err(Error::FrameLayout(format!(
            "invalid stride: {} < {} (width * 3)",
            stride, row_size
        )));
    }
    let required = if rows == 0 { 0 } else { (rows - 1) * stride + row_size };
    if src.len() < required {
        return Err(Error::FrameLayout(format!(
            "frame data too small: got {} bytes, need {} ({}x{}, stride={})",
            src.len(),
            required,
            width,
            height,
            stride
        )));
    }

    let mut data = vec![0u8; row_size * rows];
    for (y, dst_row) in data.chunks_exact_mut(row_size).enumerate() {
        let src_offset = y * stride;
        dst_row.copy_from_slice(&src[src_offset..src_offset + row_size]);
    }

    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| Error::FrameLayout(format!("cannot build {}x{} image", width, height)))
}

fn picture_type_char(kind: ffmpeg::picture::Type) -> char {
    use ffmpeg::picture::Type;
    match kind {
        Type::I => 'I',
        Type::P => 'P',
        Type::B => 'B',
        Type::S => 'S',
        Type::SI => 'i',
        Type::SP => 'p',
        Type::BI => 'b',
        Type::None => '?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encoder::write_gray_clip;
    use image::Rgb;

    #[test]
    fn test_copy_packed_rgb_drops_padding() {
        // 2x2, stride 8 (6바이트 + 패딩 2바이트)
        let src = [
            1, 2, 3, 4, 5, 6, 0xEE, 0xEE, //
            7, 8, 9, 10, 11, 12, 0xEE, 0xEE,
        ];
        let image = copy_packed_rgb(&src, 8, 2, 2).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([1, 2, 3]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([4, 5, 6]));
        assert_eq!(image.get_pixel(0, 1), &Rgb([7, 8, 9]));
        assert_eq!(image.get_pixel(1, 1), &Rgb([10, 11, 12]));
    }

    #[test]
    fn test_copy_packed_rgb_last_row_without_padding() {
        // 마지막 행은 stride만큼 없어도 된다
        let src = [1, 2, 3, 0, 4, 5, 6];
        let image = copy_packed_rgb(&src, 4, 1, 2).unwrap();
        assert_eq!(image.as_raw(), &vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_copy_packed_rgb_rejects_bad_layout() {
        assert!(matches!(copy_packed_rgb(&[0; 12], 5, 2, 2), Err(Error::FrameLayout(_))));
        assert!(matches!(copy_packed_rgb(&[0; 11], 6, 2, 2), Err(Error::FrameLayout(_))));
    }

    #[test]
    fn test_picture_type_char() {
        assert_eq!(picture_type_char(ffmpeg::picture::Type::I), 'I');
        assert_eq!(picture_type_char(ffmpeg::picture::Type::B), 'B');
        assert_eq!(picture_type_char(ffmpeg::picture::Type::None), '?');
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = VideoDecoder::open(&dir.path().join("missing.mp4"), None);
        assert!(matches!(result, Err(Error::Ffmpeg { .. })));
    }

    #[test]
    fn test_open_non_media_file() {
        // 텍스트 파일은 컨테이너로 인식되지 않거나 비디오 스트림이 없음
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(VideoDecoder::open(&path, None).is_err());
    }

    #[test]
    #[ignore] // mpeg4 인코더/디코더가 포함된 FFmpeg 빌드 필요
    fn test_decode_all_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        write_gray_clip(&path, &[0, 50, 100, 150, 200, 250], None).unwrap();

        let mut decoder = VideoDecoder::open(&path, Some((32, 24))).unwrap();
        assert_eq!(decoder.state(), DecoderState::Reading);
        assert_eq!((decoder.info().width, decoder.info().height), (64, 48));

        let mut numbers = Vec::new();
        while let Some(frame) = decoder.next_frame().unwrap() {
            assert_eq!(frame.image.dimensions(), (32, 24));
            assert!(frame.packet_size > 0);
            numbers.push(frame.number);
        }
        assert_eq!(numbers, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(decoder.state(), DecoderState::Finished);

        // EOF 이후에는 계속 None
        assert!(decoder.next_frame().unwrap().is_none());
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(decoder.state(), DecoderState::Finished);
    }

    #[test]
    #[ignore] // mpeg4 인코더/디코더가 포함된 FFmpeg 빌드 필요
    fn test_first_frame_is_key_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        write_gray_clip(&path, &[10, 20, 30], None).unwrap();

        let mut decoder = VideoDecoder::open(&path, None).unwrap();
        let first = decoder.next_frame().unwrap().unwrap();
        assert!(first.key_frame);
        assert_eq!(first.picture_type, 'I');
        assert_eq!(first.image.dimensions(), (64, 48));
    }
}
