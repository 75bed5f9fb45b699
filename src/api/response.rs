// API response utility functions module

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(
                    r#"{"success":false,"message":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// 400 Bad Request response
pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "success": false,
        "message": message
    });
    json_response(StatusCode::BAD_REQUEST, &body)
}

/// 404 Not Found response
pub fn not_found() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "success": false,
        "message": "Not Found"
    });
    json_response(StatusCode::NOT_FOUND, &body)
}

/// 500 Internal Server Error response
pub fn server_error(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "success": false,
        "message": message
    });
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &body)
}
