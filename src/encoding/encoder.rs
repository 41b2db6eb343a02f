// 비디오 인코더 - FFmpeg 기반 인코딩 + 컨테이너 먹싱
// YUV420P 이미지 → 인코더 (기본 libx265) → 출력 컨테이너 (확장자로 포맷 결정)

use crate::config::EncodeConfig;
use crate::encoding::yuv420p::Yuv420pImage;
use crate::error::{Error, Result};
use ffmpeg_next as ffmpeg;
use ffmpeg::codec;
use ffmpeg::format::Pixel;
use log::{debug, info, warn};
use std::fs;

/// 비디오 인코더 (출력 컨테이너 + 단일 비디오 스트림)
pub struct VideoEncoder {
    output_ctx: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::Video,
    video_stream_index: usize,
    frame_count: i64,
    packet_count: u64,
    time_base: ffmpeg::Rational,
    width: u32,
    height: u32,
}

impl VideoEncoder {
    /// 인코더 생성 (헤더는 아직 쓰지 않음)
    /// 실패 시 이번에 새로 생긴 출력 파일은 삭제
    pub fn new(config: &EncodeConfig) -> Result<Self> {
        let existed = config.output_path.exists();
        let result = Self::create(config);
        if result.is_err() && !existed && config.output_path.exists() {
            if let Err(e) = fs::remove_file(&config.output_path) {
                warn!("Failed to remove {:?}: {}", config.output_path, e);
            }
        }
        result
    }

    fn create(config: &EncodeConfig) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::ffmpeg("FFmpeg init failed", e))?;

        // 인코더를 먼저 찾는다 (output()이 파일을 바로 열기 때문)
        let video_codec = ffmpeg::encoder::find_by_name(&config.codec_name)
            .ok_or_else(|| Error::EncoderNotFound(config.codec_name.clone()))?;
        info!("Using codec: {}", video_codec.description());

        // 출력 컨텍스트 생성 (파일 확장자로 컨테이너 추론)
        let mut output_ctx = ffmpeg::format::output(&config.output_path)
            .map_err(|e| Error::ffmpeg("Could not create output format context", e))?;

        // 글로벌 헤더 플래그 사전 확인 (borrow 충돌 방지)
        let needs_global_header = output_ctx
            .format()
            .flags()
            .contains(ffmpeg::format::flag::Flags::GLOBAL_HEADER);

        let mut video_stream = output_ctx
            .add_stream(video_codec)
            .map_err(|e| Error::ffmpeg("Could not create output video stream", e))?;
        let video_stream_index = video_stream.index();

        let fps = i32::try_from(config.fps)
            .map_err(|_| Error::InvalidConfig(format!("fps {} does not fit a time base", config.fps)))?;
        let time_base = ffmpeg::Rational::new(1, fps);

        let mut encoder = codec::context::Context::new_with_codec(video_codec)
            .encoder()
            .video()
            .map_err(|e| Error::ffmpeg("Could not allocate video codec context", e))?;

        encoder.set_bit_rate(config.bit_rate);
        encoder.set_width(config.width);
        encoder.set_height(config.height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(ffmpeg::Rational::new(fps, 1)));
        if let Some(gop) = config.gop_size {
            encoder.set_gop(gop);
        }
        if let Some(max_b_frames) = config.max_b_frames {
            encoder.set_max_b_frames(max_b_frames);
        }
        if needs_global_header {
            encoder.set_flags(codec::flag::Flags::GLOBAL_HEADER);
        }

        let mut opts = ffmpeg::Dictionary::new();
        for (key, value) in &config.codec_options {
            opts.set(key, value);
        }

        let encoder = encoder
            .open_as_with(video_codec, opts)
            .map_err(|e| Error::ffmpeg("Could not open codec", e))?;

        // 스트림 파라미터 업데이트
        video_stream.set_parameters(&encoder);
        video_stream.set_time_base(time_base);

        ffmpeg::format::context::output::dump(
            &output_ctx,
            0,
            config.output_path.to_str(),
        );

        Ok(Self {
            output_ctx,
            encoder,
            video_stream_index,
            frame_count: 0,
            packet_count: 0,
            time_base,
            width: config.width,
            height: config.height,
        })
    }

    /// 출력 파일 헤더 작성 (첫 프레임 인코딩 전에 호출)
    pub fn write_header(&mut self) -> Result<()> {
        self.output_ctx
            .write_header()
            .map_err(|e| Error::ffmpeg("Failed to write header", e))
    }

    /// YUV420P 이미지 한 장 인코딩 → 컨테이너에 기록
    pub fn encode_frame(&mut self, image: &Yuv420pImage) -> Result<()> {
        // 인코더가 이전 프레임을 참조로 들고 있을 수 있으므로 (B-frame 재정렬)
        // 매 프레임 새 버퍼를 할당
        let mut frame = ffmpeg::frame::Video::new(Pixel::YUV420P, self.width, self.height);
        image.copy_into_frame(&mut frame)?;

        // PTS는 인코더 time_base (1/fps) 단위 프레임 번호
        frame.set_pts(Some(self.frame_count));
        debug!("Send frame {}", self.frame_count);
        self.frame_count += 1;

        self.encoder
            .send_frame(&frame)
            .map_err(|e| Error::ffmpeg("Error sending a frame for encoding", e))?;

        self.receive_and_write_packets()
    }

    /// 인코딩 완료 (flush + trailer)
    pub fn finish(&mut self) -> Result<()> {
        self.encoder
            .send_eof()
            .map_err(|e| Error::ffmpeg("Failed to send EOF", e))?;

        // 인코더 내부에 남은 패킷 모두 기록
        self.receive_and_write_packets()?;

        self.output_ctx
            .write_trailer()
            .map_err(|e| Error::ffmpeg("Failed to write trailer", e))
    }

    /// 인코더에서 패킷 수신 → 출력 파일에 기록
    fn receive_and_write_packets(&mut self) -> Result<()> {
        let stream_time_base = self
            .output_ctx
            .stream(self.video_stream_index)
            .ok_or_else(|| Error::FrameLayout("video stream missing from output".into()))?
            .time_base();

        let mut packet = ffmpeg::Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut packet) {
                Ok(()) => {}
                Err(ffmpeg::Error::Eof) => break,
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => break,
                Err(e) => return Err(Error::ffmpeg("Error during encoding", e)),
            }

            packet.set_stream(self.video_stream_index);
            // time_base 변환 (인코더 → 스트림)
            packet.rescale_ts(self.time_base, stream_time_base);
            debug!("Write packet {:?} (size={})", packet.pts(), packet.size());

            packet
                .write_interleaved(&mut self.output_ctx)
                .map_err(|e| Error::ffmpeg("Failed to write packet", e))?;
            self.packet_count += 1;
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 인코더에 보낸 프레임 수
    pub fn frame_count(&self) -> u64 {
        self.frame_count as u64
    }

    /// 컨테이너에 기록한 패킷 수
    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }
}

/// 테스트용 회색 단색 클립 (mpeg4, 64x48)
#[cfg(test)]
pub(crate) fn write_gray_clip(
    path: &std::path::Path,
    shades: &[u8],
    max_b_frames: Option<usize>,
) -> Result<()> {
    use image::{Rgb, RgbImage};

    let config = EncodeConfig {
        output_path: path.to_path_buf(),
        codec_name: "mpeg4".into(),
        width: 64,
        height: 48,
        max_b_frames,
        ..EncodeConfig::default()
    };
    let mut encoder = VideoEncoder::new(&config)?;
    encoder.write_header()?;
    for &shade in shades {
        let rgb = RgbImage::from_pixel(64, 48, Rgb([shade, shade, shade]));
        encoder.encode_frame(&Yuv420pImage::from_rgb(&rgb)?)?;
    }
    encoder.finish()
}
