// 이미지 시퀀스 목록
// 디렉토리의 파일을 파일명 앞의 정수 기준으로 정렬 (0.jpg, 1.jpg, 2.jpg, ..., 10.jpg)

use crate::error::{Error, Result};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

/// 정렬된 시퀀스의 한 항목
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceEntry {
    pub path: PathBuf,
    /// 파일명 앞의 정수
    pub index: i64,
}

/// 파일명(확장자 제외) 앞부분의 정수 파싱
/// - 앞 공백 무시, 부호 허용, 숫자 이후 문자는 무시 ("12abc.png" → 12)
/// - 숫자가 없거나 overflow → None
pub fn leading_integer(file_name: &str) -> Option<i64> {
    let stem = match file_name.rfind('.') {
        Some(pos) => &file_name[..pos],
        None => file_name,
    };
    let trimmed = stem.trim_start();

    let sign_len = match trimmed.as_bytes().first() {
        Some(b'-') | Some(b'+') => 1,
        _ => 0,
    };

    let digits_len = trimmed[sign_len..]
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits_len == 0 {
        return None;
    }

    // 부호까지 함께 파싱 (i64::MIN 허용)
    trimmed[..sign_len + digits_len].parse().ok()
}

/// 디렉토리 내 파일 목록 (하위 디렉토리 제외, 정렬 없음)
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            files.push(path);
        }
    }
    Ok(files)
}

/// 읽을 수 있는 이미지 파일만 골라 번호순 정렬
/// 번호가 없는 파일은 경고 후 제외, 같은 번호는 파일명 순
pub fn list_sequence(dir: &Path) -> Result<Vec<SequenceEntry>> {
    let mut sequence = Vec::new();

    for path in list_files(dir)? {
        if image::ImageFormat::from_path(&path).is_err() {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => {
                warn!("Skipping non UTF-8 file name: {:?}", path);
                continue;
            }
        };

        match leading_integer(name) {
            Some(index) => sequence.push(SequenceEntry { path, index }),
            None => warn!("Skipping {:?}: file name does not start with a number", path),
        }
    }

    sequence.sort_by(|a, b| {
        a.index
            .cmp(&b.index)
            .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
    });

    Ok(sequence)
}
