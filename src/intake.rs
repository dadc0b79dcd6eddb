//! Photo intake: scan an input folder and derive per-shot timestamps.
//!
//! Phone cameras embed the capture time in the filename
//! (`IMG_20240312_184502.jpg` and friends); that pattern wins over filesystem
//! metadata because copying files resets the latter.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;
use thiserror::Error;

/// Extensions treated as photos, matched case-insensitively.
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic", "bmp"];

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("no photos found in {0}")]
    NoPhotos(PathBuf),

    #[error("input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("I/O error reading input folder: {0}")]
    Io(#[from] std::io::Error),
}

/// One photographed input: path, display name, derived capture timestamp.
/// Bytes are read lazily when the extraction stage needs them.
#[derive(Debug, Clone)]
pub struct PhotoItem {
    pub path: PathBuf,
    pub name: String,
    pub timestamp: NaiveDateTime,
    pub mime_type: &'static str,
}

/// Scan a directory (non-recursive) for photo files, sorted by timestamp
/// ascending with name as the tiebreaker. Zero matches is fatal.
pub fn scan_photos(dir: &Path) -> Result<Vec<PhotoItem>, IntakeError> {
    if !dir.is_dir() {
        return Err(IntakeError::NotADirectory(dir.to_path_buf()));
    }

    let mut items = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(mime_type) = photo_mime_type(&path) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let timestamp = derive_timestamp(&path, &name)?;
        items.push(PhotoItem {
            path,
            name,
            timestamp,
            mime_type,
        });
    }

    if items.is_empty() {
        return Err(IntakeError::NoPhotos(dir.to_path_buf()));
    }

    items.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.name.cmp(&b.name))
    });

    tracing::info!(count = items.len(), dir = %dir.display(), "photo intake complete");
    Ok(items)
}

/// MIME type for the service payload, by extension. `None` means not a photo.
fn photo_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if !PHOTO_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        _ => unreachable!("extension list and mime table are in sync"),
    })
}

/// Capture time from the embedded `YYYYMMDD[_-]HHMMSS` name pattern, falling
/// back to filesystem creation time (then modification time).
fn derive_timestamp(path: &Path, name: &str) -> Result<NaiveDateTime, IntakeError> {
    if let Some(ts) = timestamp_from_name(name) {
        return Ok(ts);
    }
    let metadata = fs::metadata(path)?;
    let fs_time = metadata.created().or_else(|_| metadata.modified())?;
    Ok(system_time_to_naive(fs_time))
}

fn timestamp_from_name(name: &str) -> Option<NaiveDateTime> {
    static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = NAME_PATTERN
        .get_or_init(|| Regex::new(r"(\d{8})[_-](\d{6})").expect("timestamp pattern is valid"));
    let caps = pattern.captures(name)?;
    let compact = format!("{}{}", &caps[1], &caps[2]);
    NaiveDateTime::parse_from_str(&compact, "%Y%m%d%H%M%S").ok()
}

fn system_time_to_naive(t: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(t).naive_local()
}
