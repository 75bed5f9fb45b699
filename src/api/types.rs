// API entity types module
// Bodies serialized for the upload and listing endpoints

use serde::Serialize;

/// Body of a successful upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub path: String,
}

/// One file as reported by `GET /api/files/<type>`
///
/// Derived from filesystem metadata on every request; the field names
/// match what the dashboard's data manager expects.
#[derive(Debug, Serialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Human-readable size, e.g. "2.00 KB"
    pub size: String,
    /// MIME type inferred from the extension
    #[serde(rename = "type")]
    pub content_type: String,
    /// Storage path with forward slashes
    pub path: String,
    pub uploaded: bool,
    /// Modification time as `YYYY-MM-DD HH:MM`
    #[serde(rename = "createdDate")]
    pub created_date: String,
}
