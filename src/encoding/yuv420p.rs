// RGB → YUV420P (I420) 변환 + 평면 복사
// 데이터 레이아웃: [Y plane: w*h][U plane: w/2*h/2][V plane: w/2*h/2]

use crate::config::validate_yuv420p_size;
use crate::error::{Error, Result};
use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use image::RgbImage;

/// 연속 버퍼 하나에 담긴 I420 이미지
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Yuv420pImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// BT.601 limited range (정수 계수)
#[inline]
fn luma(r: i32, g: i32, b: i32) -> u8 {
    (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16).clamp(0, 255) as u8
}

#[inline]
fn chroma(r: i32, g: i32, b: i32) -> (u8, u8) {
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (u.clamp(0, 255) as u8, v.clamp(0, 255) as u8)
}

impl Yuv420pImage {
    /// RGB 이미지 → I420 (chroma는 2x2 블록 평균)
    pub fn from_rgb(rgb: &RgbImage) -> Result<Self> {
        let (width, height) = rgb.dimensions();
        validate_yuv420p_size(width, height)?;

        let w = width as usize;
        let h = height as usize;
        let y_size = w * h;
        let uv_size = y_size / 4;
        let half_w = w / 2;

        let mut data = vec![0u8; y_size + uv_size * 2];
        let src = rgb.as_raw();

        // Y plane
        for (dst, px) in data[..y_size].iter_mut().zip(src.chunks_exact(3)) {
            *dst = luma(px[0] as i32, px[1] as i32, px[2] as i32);
        }

        // U/V plane
        let (_, chroma_planes) = data.split_at_mut(y_size);
        let (u_plane, v_plane) = chroma_planes.split_at_mut(uv_size);
        for cy in 0..h / 2 {
            for cx in 0..half_w {
                let mut sum = [0i32; 3];
                for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                    let offset = ((cy * 2 + dy) * w + cx * 2 + dx) * 3;
                    sum[0] += src[offset] as i32;
                    sum[1] += src[offset + 1] as i32;
                    sum[2] += src[offset + 2] as i32;
                }
                let (u, v) = chroma((sum[0] + 2) / 4, (sum[1] + 2) / 4, (sum[2] + 2) / 4);
                u_plane[cy * half_w + cx] = u;
                v_plane[cy * half_w + cx] = v;
            }
        }

        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 연속 버퍼 전체
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn y_size(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn y_plane(&self) -> &[u8] {
        &self.data[..self.y_size()]
    }

    pub fn u_plane(&self) -> &[u8] {
        let pixels = self.y_size();
        &self.data[pixels..pixels * 5 / 4]
    }

    pub fn v_plane(&self) -> &[u8] {
        let pixels = self.y_size();
        &self.data[pixels * 5 / 4..]
    }

    /// ffmpeg YUV420P 프레임에 평면별로 복사 (행 단위, 프레임 stride 반영)
    pub fn copy_into_frame(&self, frame: &mut ffmpeg::frame::Video) -> Result<()> {
        if frame.format() != Pixel::YUV420P
            || frame.width() != self.width
            || frame.height() != self.height
        {
            return Err(Error::FrameLayout(format!(
                "expected YUV420P {}x{}, got {:?} {}x{}",
                self.width,
                self.height,
                frame.format(),
                frame.width(),
                frame.height()
            )));
        }

        let w = self.width as usize;
        let h = self.height as usize;
        copy_plane(self.y_plane(), w, h, frame, 0)?;
        copy_plane(self.u_plane(), w / 2, h / 2, frame, 1)?;
        copy_plane(self.v_plane(), w / 2, h / 2, frame, 2)?;
        Ok(())
    }
}

fn copy_plane(
    src: &[u8],
    row_size: usize,
    rows: usize,
    frame: &mut ffmpeg::frame::Video,
    plane: usize,
) -> Result<()> {
    let stride = frame.stride(plane);
    let dst = frame.data_mut(plane);

    if stride < row_size || dst.len() < (rows - 1) * stride + row_size {
        return Err(Error::FrameLayout(format!(
            "plane {}: {} bytes with stride {} cannot hold {}x{}",
            plane,
            dst.len(),
            stride,
            row_size,
            rows
        )));
    }

    for (row, src_row) in src.chunks_exact(row_size).take(rows).enumerate() {
        let dst_offset = row * stride;
        dst[dst_offset..dst_offset + row_size].copy_from_slice(src_row);
    }
    Ok(())
}
