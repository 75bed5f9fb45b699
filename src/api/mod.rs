// API module entry
// Upload and file-listing endpoints under /api/

mod files;
mod response;
mod types;
mod upload;

use crate::config::Config;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

pub use files::handle_list;
pub use response::{bad_request, not_found};
pub use upload::handle_upload;

/// Dispatch a GET request under `/api/`
pub async fn handle_api_get(path: &str, config: &Config) -> Response<Full<Bytes>> {
    if let Some(segment) = path.strip_prefix("/api/files/") {
        if segment.is_empty() {
            return bad_request("Invalid file list request");
        }
        if !segment.contains('/') {
            return handle_list(segment, config).await;
        }
    }
    not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use hyper::StatusCode;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unknown_api_path_is_404() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());
        let response = handle_api_get("/api/status", &cfg).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_kind_segment_is_400() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());
        let response = handle_api_get("/api/files/", &cfg).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_nested_kind_segment_is_404() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());
        let response = handle_api_get("/api/files/usage/extra", &cfg).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
