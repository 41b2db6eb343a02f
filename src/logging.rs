// 로거 초기화 (두 바이너리 공용)
// RUST_LOG가 있으면 우선, 없으면 verbose 여부로 레벨 결정

use ffmpeg_next as ffmpeg;

pub fn init(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // FFmpeg 내부 로그 (av_dump_format 출력 포함)
    ffmpeg::util::log::set_level(if verbose {
        ffmpeg::util::log::Level::Info
    } else {
        ffmpeg::util::log::Level::Warning
    });
}
