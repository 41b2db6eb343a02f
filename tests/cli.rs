use std::fs;
use std::process::Command;

fn frames2video() -> Command {
    Command::new(env!("CARGO_BIN_EXE_frames2video"))
}

fn video2frames() -> Command {
    Command::new(env!("CARGO_BIN_EXE_video2frames"))
}

#[test]
fn frames2video_help_lists_options() {
    let output = frames2video().arg("--help").output().expect("run frames2video --help");

    assert!(
        output.status.success(),
        "frames2video --help failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--codec", "--width", "--height", "--bit-rate", "--fps", "--gop", "--option"] {
        assert!(stdout.contains(flag), "missing {flag} in frames2video help");
    }
    assert!(stdout.contains("libx265"), "missing default codec in help");
}

#[test]
fn video2frames_help_lists_options() {
    let output = video2frames().arg("--help").output().expect("run video2frames --help");

    assert!(
        output.status.success(),
        "video2frames --help failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--output-dir", "--format", "--start-number", "--max-frames", "--quality"] {
        assert!(stdout.contains(flag), "missing {flag} in video2frames help");
    }
}

#[test]
fn frames2video_requires_arguments() {
    let output = frames2video().output().expect("run frames2video");
    assert!(!output.status.success());
}

#[test]
fn frames2video_rejects_empty_directory() {
    let input = tempfile::tempdir().expect("input dir");
    let output_dir = tempfile::tempdir().expect("output dir");
    let output_path = output_dir.path().join("out.mp4");

    let output = frames2video()
        .arg(input.path())
        .arg(&output_path)
        .output()
        .expect("run frames2video");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no numbered images"), "unexpected stderr: {stderr}");
    assert!(!output_path.exists());
}

#[test]
fn frames2video_rejects_malformed_option() {
    let input = tempfile::tempdir().expect("input dir");
    let output = frames2video()
        .arg(input.path())
        .arg("out.mp4")
        .args(["--option", "crf"])
        .output()
        .expect("run frames2video");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("KEY=VALUE"), "unexpected stderr: {stderr}");
}

#[test]
fn frames2video_rejects_odd_size() {
    let input = tempfile::tempdir().expect("input dir");
    let output = frames2video()
        .arg(input.path())
        .arg("out.mp4")
        .args(["--width", "641"])
        .output()
        .expect("run frames2video");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("even dimensions"), "unexpected stderr: {stderr}");
}

#[test]
fn video2frames_missing_input_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    let frames_dir = dir.path().join("frames");

    let output = video2frames()
        .arg(dir.path().join("missing.mp4"))
        .arg("--output-dir")
        .arg(&frames_dir)
        .output()
        .expect("run video2frames");

    assert!(!output.status.success());
    assert!(!frames_dir.exists());
}

#[test]
fn video2frames_requires_width_and_height_together() {
    let output = video2frames()
        .args(["input.mp4", "--width", "320"])
        .output()
        .expect("run video2frames");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--width and --height"), "unexpected stderr: {stderr}");
}

#[test]
#[ignore] // mpeg4 인코더/디코더가 포함된 FFmpeg 빌드 필요
fn round_trip_through_video() {
    let input = tempfile::tempdir().expect("input dir");
    for i in 0..5u32 {
        let shade = (i * 50) as u8;
        image::RgbImage::from_pixel(64, 48, image::Rgb([shade, shade, shade]))
            .save(input.path().join(format!("{i}.png")))
            .expect("write input image");
    }
    let work = tempfile::tempdir().expect("work dir");
    let video = work.path().join("seq.avi");

    let status = frames2video()
        .arg(input.path())
        .arg(&video)
        .args(["--codec", "mpeg4", "--width", "64", "--height", "48"])
        .status()
        .expect("run frames2video");
    assert!(status.success());

    let frames_dir = work.path().join("frames");
    let status = video2frames()
        .arg(&video)
        .arg("--output-dir")
        .arg(&frames_dir)
        .args(["--format", "png"])
        .status()
        .expect("run video2frames");
    assert!(status.success());

    let count = fs::read_dir(&frames_dir).expect("frames dir").count();
    assert_eq!(count, 5);
    assert!(frames_dir.join("0.png").exists());
    assert!(frames_dir.join("4.png").exists());
}
