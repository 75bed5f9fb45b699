//! Upload storage module
//!
//! Owns the on-disk layout for uploaded data files: `<data_dir>/usage/`
//! holds usage logs (`.json`/`.jsonl`), `<data_dir>/users/` holds user
//! lists (`.csv`). Files are written once and read back only through the
//! listing API; nothing else is persisted.

pub mod listing;

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Category an uploaded file belongs to, named by its directory segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Usage,
    Users,
}

impl FileKind {
    /// Parse the `type` form field or URL segment
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "usage" => Some(Self::Usage),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usage => "usage",
            Self::Users => "users",
        }
    }

    /// Whether a filename's extension is acceptable for this kind
    ///
    /// Matching is case-sensitive; `Data.JSON` is rejected.
    pub fn allows(self, filename: &str) -> bool {
        match self {
            Self::Usage => filename.ends_with(".json") || filename.ends_with(".jsonl"),
            Self::Users => filename.ends_with(".csv"),
        }
    }

    /// Human-readable extension rule, used in rejection messages
    pub const fn extension_rule(self) -> &'static str {
        match self {
            Self::Usage => "Usage files must be .json or .jsonl",
            Self::Users => "User files must be .csv",
        }
    }
}

/// Directory a kind's files live in
pub fn kind_dir(data_dir: &Path, kind: FileKind) -> PathBuf {
    data_dir.join(kind.as_str())
}

/// Create the data directory tree if absent
///
/// Runs once at startup, before the listener starts accepting.
pub fn ensure_layout(data_dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    std::fs::create_dir_all(kind_dir(data_dir, FileKind::Usage))?;
    std::fs::create_dir_all(kind_dir(data_dir, FileKind::Users))?;
    Ok(())
}

/// Validate an upload filename
///
/// The name is attacker-controlled. Only bare file names are accepted:
/// anything empty, containing a path separator, or naming the current or
/// parent directory is rejected.
pub fn sanitize_filename(raw: &str) -> Option<&str> {
    let name = raw.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    if name.contains('/') || name.contains('\\') {
        return None;
    }
    Some(name)
}

/// Write uploaded bytes to `<data_dir>/<kind>/<filename>`
///
/// Overwrites any existing file of the same name. Returns the storage path
/// with forward slashes, as reported back to the client.
pub async fn save_upload(
    data_dir: &Path,
    kind: FileKind,
    filename: &str,
    data: &[u8],
) -> io::Result<String> {
    let dir = kind_dir(data_dir, kind);
    fs::create_dir_all(&dir).await?;
    let path = dir.join(filename);
    fs::write(&path, data).await?;
    Ok(display_path(&path))
}

/// Path string with forward slashes regardless of platform
pub fn display_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}
