//! File listing handler module
//!
//! Answers `GET /api/files/<type>` with descriptors for every regular
//! file in that kind's upload directory, built from filesystem metadata.

use super::response::{bad_request, json_response, server_error};
use super::types::FileDescriptor;
use crate::config::Config;
use crate::http::mime;
use crate::logger;
use crate::storage::{self, listing, FileKind};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::path::Path;

/// Handle `GET /api/files/<kind>`
///
/// A missing kind directory yields an empty array. Entries are sorted by
/// name so repeated listings are stable.
pub async fn handle_list(kind_segment: &str, config: &Config) -> Response<Full<Bytes>> {
    let Some(kind) = FileKind::from_segment(kind_segment) else {
        return bad_request("Unknown file type; expected 'usage' or 'users'");
    };

    let data_dir = Path::new(&config.storage.data_dir);
    match listing::list_kind(data_dir, kind).await {
        Ok(mut files) => {
            files.sort_by(|a, b| a.name.cmp(&b.name));
            let descriptors: Vec<FileDescriptor> = files
                .into_iter()
                .map(|file| describe(file, data_dir, kind))
                .collect();
            json_response(StatusCode::OK, &descriptors)
        }
        Err(e) => {
            logger::log_error(&format!("File list error: {e}"));
            server_error("Failed to list files")
        }
    }
}

/// Turn filesystem metadata into the response entity
fn describe(file: listing::StoredFile, data_dir: &Path, kind: FileKind) -> FileDescriptor {
    let extension = Path::new(&file.name).extension().and_then(|e| e.to_str());
    FileDescriptor {
        size: listing::format_size(file.len),
        content_type: mime::content_type(extension)
            .unwrap_or("application/octet-stream")
            .to_string(),
        path: storage::display_path(&storage::kind_dir(data_dir, kind).join(&file.name)),
        uploaded: true,
        created_date: listing::format_timestamp(file.modified),
        name: file.name,
    }
}
