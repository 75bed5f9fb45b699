//! Static file serving module
//!
//! Resolves dashboard assets relative to the configured root with
//! directory-traversal protection and index-file fallback.

use crate::config::Config;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve the file at a GET/HEAD request path, or 404
pub async fn serve(request_path: &str, is_head: bool, config: &Config) -> Response<Full<Bytes>> {
    let loaded = load(
        &config.static_files.root,
        request_path,
        &config.static_files.index_files,
    )
    .await;

    match loaded {
        Some((content, extension)) => {
            let content_type = mime::content_type(extension.as_deref())
                .unwrap_or(config.http.default_content_type.as_str());
            http::build_file_response(content, content_type, is_head)
        }
        None => http::build_404_response(),
    }
}

/// Load a file from the static root with index file support
async fn load(
    root: &str,
    request_path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, Option<String>)> {
    let clean_path = request_path.trim_start_matches('/');

    let root = Path::new(root);
    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static root not found or inaccessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    let mut file_path = root.join(clean_path);

    // Directory requests fall back to index files
    if file_path.is_dir() || clean_path.is_empty() || clean_path.ends_with('/') {
        file_path = resolve_index(&file_path, index_files)?;
    }

    // File not found is common (404), no need to log
    let file_path_canonical = file_path.canonicalize().ok()?;
    if !file_path_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!("Path traversal attempt blocked: {request_path}"));
        return None;
    }
    if !file_path_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path_canonical.display()
            ));
            return None;
        }
    };

    let extension = file_path_canonical
        .extension()
        .and_then(|e| e.to_str())
        .map(ToString::to_string);

    Some((content, extension))
}

/// First configured index file that exists in the directory
fn resolve_index(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    index_files
        .iter()
        .map(|index| dir.join(index))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use tempfile::TempDir;

    fn workspace_with_assets() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("index.html"), b"<html>dash</html>").unwrap();
        std::fs::write(tmp.path().join("metrics.json"), b"{\"total\":1}").unwrap();
        tmp
    }

    #[tokio::test]
    async fn test_json_gets_json_content_type() {
        let tmp = workspace_with_assets();
        let cfg = config::test_config(tmp.path());

        let response = serve("/metrics.json", false, &cfg).await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_root_serves_index_file() {
        let tmp = workspace_with_assets();
        let cfg = config::test_config(tmp.path());

        let response = serve("/", false, &cfg).await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let tmp = workspace_with_assets();
        let cfg = config::test_config(tmp.path());

        let response = serve("/nope.html", false, &cfg).await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_traversal_is_blocked() {
        let outer = TempDir::new().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"hidden").unwrap();
        let root = outer.path().join("public");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("index.html"), b"<html></html>").unwrap();
        let cfg = config::test_config(&root);

        let response = serve("/../secret.txt", false, &cfg).await;
        assert_eq!(response.status(), 404);
    }
}
