// 인코딩 & 내보내기 모듈
// 이미지 시퀀스 → YUV420P → 비디오 컨테이너

pub mod encoder;
pub mod exporter;
pub mod yuv420p;

pub use encoder::VideoEncoder;
pub use exporter::{EncodeSummary, SequenceExporter};
pub use yuv420p::Yuv420pImage;
