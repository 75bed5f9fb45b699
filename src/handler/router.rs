//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, body size
//! check, and dispatch to the API or static file handlers. Every response
//! leaves through here, which is where CORS headers and the access log
//! entry are applied.

use crate::api;
use crate::config::Config;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry, AccessLogFormat};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Main entry point for HTTP request handling
///
/// Generic over the body type so tests can drive it with `Full<Bytes>`
/// while the server passes `hyper::body::Incoming`.
pub async fn handle_request<B>(
    req: Request<B>,
    remote_addr: SocketAddr,
    config: Arc<Config>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_str(req.version()).to_string();
    entry.referer = header_string(&req, "referer");
    entry.user_agent = header_string(&req, "user-agent");

    let mut response = route(req, &config).await;

    if config.http.enable_cors {
        http::apply_cors(&mut response);
    }

    if config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        logger::log_access(
            &entry,
            AccessLogFormat::from_name(&config.logging.access_log_format),
        );
    }

    Ok(response)
}

/// Route request based on method and path
async fn route<B>(req: Request<B>, config: &Config) -> Response<Full<Bytes>>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();

    match method {
        Method::OPTIONS => http::build_options_response(),
        Method::POST => handle_post(req, config).await,
        Method::GET => {
            let path = req.uri().path();
            if path.starts_with("/api/") {
                api::handle_api_get(path, config).await
            } else {
                static_files::serve(path, false, config).await
            }
        }
        Method::HEAD => static_files::serve(req.uri().path(), true, config).await,
        _ => http::build_405_response(),
    }
}

/// Handle POST requests; only the upload endpoint accepts them
async fn handle_post<B>(req: Request<B>, config: &Config) -> Response<Full<Bytes>>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    if req.uri().path() != "/api/upload" {
        return api::not_found();
    }

    if let Some(response) = check_body_size(&req, config.http.max_body_size) {
        return response;
    }

    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    match req.into_body().collect().await {
        Ok(collected) => api::handle_upload(&content_type, collected.to_bytes(), config).await,
        Err(e) => {
            logger::log_error(&format!("Failed to read upload body: {e}"));
            api::bad_request("Failed to read request body")
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_str(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}
