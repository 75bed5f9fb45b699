//! Directory listing module
//!
//! Scans a kind's upload directory and formats filesystem metadata for the
//! listing API: human-readable sizes and `YYYY-MM-DD HH:MM` timestamps.

use super::FileKind;
use crate::logger;
use chrono::{DateTime, Local};
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

/// Metadata of one stored file, as read from the filesystem
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub len: u64,
    pub modified: SystemTime,
}

/// List regular files directly under `<data_dir>/<kind>/` (non-recursive)
///
/// A missing directory yields an empty list, not an error. Entries whose
/// metadata cannot be read are logged and skipped so one broken file does
/// not abort the whole listing.
pub async fn list_kind(data_dir: &Path, kind: FileKind) -> io::Result<Vec<StoredFile>> {
    let dir = super::kind_dir(data_dir, kind);

    let mut entries = match fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(e) => {
                logger::log_warning(&format!("Error reading file {}: {e}", path.display()));
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                logger::log_warning(&format!("Error reading file {}: {e}", path.display()));
                continue;
            }
        };
        files.push(StoredFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            len: metadata.len(),
            modified,
        });
    }

    Ok(files)
}

/// Format a byte count into a human-readable size string
///
/// 1024-based, two decimal places, clamped at GB (a 2 TB file still
/// reports in GB).
pub fn format_size(len: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    const K: f64 = 1024.0;

    if len == 0 {
        return "0 Bytes".to_string();
    }

    #[allow(clippy::cast_precision_loss)]
    let mut size = len as f64;
    let mut unit = 0;
    while size >= K && unit < UNITS.len() - 1 {
        size /= K;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

/// Format a modification time as `YYYY-MM-DD HH:MM` in local time
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(500), "500.00 Bytes");
        assert_eq!(format_size(1023), "1023.00 Bytes");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_048_576), "1.00 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn test_format_size_clamps_at_gb() {
        // 2 TB stays in GB
        assert_eq!(format_size(2_199_023_255_552), "2048.00 GB");
    }

    #[test]
    fn test_format_timestamp_shape() {
        let formatted = format_timestamp(SystemTime::now());
        // YYYY-MM-DD HH:MM
        assert_eq!(formatted.len(), 16);
        assert_eq!(&formatted[4..5], "-");
        assert_eq!(&formatted[10..11], " ");
        assert_eq!(&formatted[13..14], ":");
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("data");
        // data/usage never created
        let files = list_kind(&data_dir, FileKind::Usage).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_directories() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("data");
        let usage = data_dir.join("usage");
        std::fs::create_dir_all(usage.join("nested")).unwrap();
        std::fs::write(usage.join("a.json"), b"{}").unwrap();
        std::fs::write(usage.join("b.jsonl"), b"{}\n{}\n").unwrap();

        let mut files = list_kind(&data_dir, FileKind::Usage).await.unwrap();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.json", "b.jsonl"]);
        assert_eq!(files[0].len, 2);
    }
}
