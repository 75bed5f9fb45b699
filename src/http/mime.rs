//! MIME type detection module
//!
//! Returns the Content-Type for a file extension. Data formats served by
//! the dashboard (`.json`, `.jsonl`, `.csv`) get explicit entries so they
//! are never misreported by a generic guesser.

/// Get MIME Content-Type based on file extension
///
/// Returns `None` for unknown extensions; callers decide the fallback
/// (the configured default for static files, `application/octet-stream`
/// for listing entries).
pub fn content_type(extension: Option<&str>) -> Option<&'static str> {
    match extension {
        // Dashboard data formats
        Some("json" | "jsonl") => Some("application/json"),
        Some("csv") => Some("text/csv"),

        // Text
        Some("html" | "htm") => Some("text/html; charset=utf-8"),
        Some("css") => Some("text/css"),
        Some("txt" | "md") => Some("text/plain; charset=utf-8"),
        Some("xml") => Some("application/xml"),

        // JavaScript/WASM
        Some("js" | "mjs") => Some("application/javascript"),
        Some("wasm") => Some("application/wasm"),

        // Images
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        Some("ico") => Some("image/x-icon"),
        Some("webp") => Some("image/webp"),

        // Fonts
        Some("woff") => Some("font/woff"),
        Some("woff2") => Some("font/woff2"),
        Some("ttf") => Some("font/ttf"),

        // Documents
        Some("pdf") => Some("application/pdf"),

        // Unknown
        _ => None,
    }
}
