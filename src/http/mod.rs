//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from
//! specific business logic.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    apply_cors, build_404_response, build_405_response, build_413_response,
    build_file_response, build_options_response,
};
