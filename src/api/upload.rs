//! Upload handler module
//!
//! Accepts `POST /api/upload` multipart submissions, validates the
//! declared kind against the filename extension, and writes the payload
//! into the data directory. Multipart framing is delegated to `multer`.

use super::response::{bad_request, json_response, server_error};
use super::types::UploadResponse;
use crate::config::Config;
use crate::logger;
use crate::storage::{self, FileKind};
use futures::stream;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use multer::Multipart;
use std::convert::Infallible;
use std::path::Path;

/// Fields extracted from the upload form
#[derive(Debug, Default)]
struct UploadForm {
    /// Filename and payload of the `file` field
    file: Option<(String, Bytes)>,
    /// Raw value of the `type` field
    kind: Option<String>,
}

/// Handle `POST /api/upload`
///
/// The body must be `multipart/form-data` with a `file` field carrying a
/// filename and a `type` field naming the target kind. Validation failures
/// are client errors; filesystem failures after validation are server
/// errors. Nothing is written unless validation passes.
pub async fn handle_upload(
    content_type: &str,
    body: Bytes,
    config: &Config,
) -> Response<Full<Bytes>> {
    let Ok(boundary) = multer::parse_boundary(content_type) else {
        return bad_request("Expected multipart/form-data");
    };

    let form = match read_form(body, boundary).await {
        Ok(form) => form,
        Err(e) => {
            logger::log_error(&format!("Upload error: {e}"));
            return bad_request("Invalid upload data");
        }
    };

    let (Some((raw_name, data)), Some(kind_field)) = (form.file, form.kind) else {
        return bad_request("Invalid upload data");
    };

    let Some(kind) = FileKind::from_segment(&kind_field) else {
        return bad_request("Unknown upload type; expected 'usage' or 'users'");
    };
    let Some(filename) = storage::sanitize_filename(&raw_name) else {
        return bad_request("Invalid filename");
    };
    if !kind.allows(filename) {
        return bad_request(kind.extension_rule());
    }

    let data_dir = Path::new(&config.storage.data_dir);
    match storage::save_upload(data_dir, kind, filename, &data).await {
        Ok(path) => {
            logger::log_upload(filename, &path);
            let response = UploadResponse {
                success: true,
                message: format!("File {filename} uploaded successfully"),
                path,
            };
            json_response(StatusCode::OK, &response)
        }
        Err(e) => {
            logger::log_error(&format!("Upload failed: {e}"));
            server_error("Upload failed")
        }
    }
}

/// Walk the multipart fields and pick out `file` and `type`
///
/// A `file` field without a filename attribute is ignored, which surfaces
/// later as a missing-field client error. Unknown fields are skipped.
async fn read_form(body: Bytes, boundary: String) -> Result<UploadForm, multer::Error> {
    let body_stream = stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = Multipart::new(body_stream, boundary);

    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().map(ToString::to_string);
                let data = field.bytes().await?;
                if let Some(name) = filename {
                    form.file = Some((name, data));
                }
            }
            "type" => form.kind = Some(field.text().await?),
            _ => {}
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    const BOUNDARY: &str = "test-boundary-4242";

    fn multipart_content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    /// Build a multipart body with an optional file part and an optional
    /// type part, framed the way a browser would
    fn form_body(file: Option<(&str, &[u8])>, kind: Option<&str>) -> Bytes {
        let mut body = Vec::new();
        if let Some((filename, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                     filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(kind) = kind {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"type\"\r\n\r\n{kind}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Bytes::from(body)
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_writes_file() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());

        let body = form_body(Some(("metrics.json", b"{\"day\":1}")), Some("usage"));
        let response = handle_upload(&multipart_content_type(), body, &cfg).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["path"].as_str().unwrap().ends_with("usage/metrics.json"));

        let on_disk = tmp.path().join("data").join("usage").join("metrics.json");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"{\"day\":1}");
    }

    #[tokio::test]
    async fn test_upload_overwrites_existing() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());

        let first = form_body(Some(("m.json", b"{\"v\":1}")), Some("usage"));
        handle_upload(&multipart_content_type(), first, &cfg).await;
        let second = form_body(Some(("m.json", b"{}")), Some("usage"));
        let response = handle_upload(&multipart_content_type(), second, &cfg).await;
        assert_eq!(response.status(), StatusCode::OK);

        let on_disk = tmp.path().join("data").join("usage").join("m.json");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_extension_mismatch_rejected() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());

        let body = form_body(Some(("people.csv", b"a,b\n")), Some("usage"));
        let response = handle_upload(&multipart_content_type(), body, &cfg).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        // Nothing written
        assert!(!tmp.path().join("data").join("usage").join("people.csv").exists());
    }

    #[tokio::test]
    async fn test_non_multipart_rejected() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());

        let response =
            handle_upload("application/json", Bytes::from_static(b"{}"), &cfg).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_type_field_rejected() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());

        let body = form_body(Some(("metrics.json", b"{}")), None);
        let response = handle_upload(&multipart_content_type(), body, &cfg).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_file_field_rejected() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());

        let body = form_body(None, Some("usage"));
        let response = handle_upload(&multipart_content_type(), body, &cfg).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_kind_rejected() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());

        let body = form_body(Some(("metrics.json", b"{}")), Some("secrets"));
        let response = handle_upload(&multipart_content_type(), body, &cfg).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_traversal_filename_rejected() {
        let tmp = TempDir::new().unwrap();
        let cfg = config::test_config(tmp.path());

        let body = form_body(Some(("../escape.json", b"{}")), Some("usage"));
        let response = handle_upload(&multipart_content_type(), body, &cfg).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!tmp.path().join("escape.json").exists());
    }
}
