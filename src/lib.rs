// frameseq - 비디오 ↔ 이미지 시퀀스 변환
// ffmpeg-next (코덱/컨테이너) + image (정지 이미지) 기반

pub mod config;
pub mod encoding;
pub mod error;
pub mod ffmpeg;
pub mod logging;
pub mod sequence;

pub use config::{EncodeConfig, ExtractConfig};
pub use error::{Error, Result};
