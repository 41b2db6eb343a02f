// FFmpeg 래퍼 모듈
// 비디오 디코딩 + 이미지 시퀀스 추출

pub mod decoder;
pub mod extractor;

pub use decoder::{DecodedFrame, DecoderState, VideoDecoder, VideoInfo};
pub use extractor::{ExtractSummary, FrameExtractor};
