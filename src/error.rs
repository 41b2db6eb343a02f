// 에러 타입 - FFmpeg/이미지/파일 I/O 실패를 컨텍스트와 함께 전달

use ffmpeg_next as ffmpeg;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// FFmpeg 호출 실패 (어떤 단계에서 실패했는지 함께 기록)
    #[error("{context}: {source}")]
    Ffmpeg {
        context: &'static str,
        #[source]
        source: ffmpeg::Error,
    },

    #[error("image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder {0} not found")]
    EncoderNotFound(String),

    #[error("no video stream found in {0:?}")]
    NoVideoStream(PathBuf),

    #[error("no numbered images found in {0:?}")]
    EmptySequence(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// 프레임 버퍼 크기/stride 불일치
    #[error("frame layout mismatch: {0}")]
    FrameLayout(String),

    #[error("cancelled after {0} frames")]
    Cancelled(u64),
}

impl Error {
    pub(crate) fn ffmpeg(context: &'static str, source: ffmpeg::Error) -> Self {
        Error::Ffmpeg { context, source }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Error::Image { path: path.into(), source }
    }
}
