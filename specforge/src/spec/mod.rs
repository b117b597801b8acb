//! OpenAPI document validation and endpoint extraction

pub mod endpoints;
pub mod load;
pub mod validator;

use thiserror::Error;

pub use endpoints::{extract_endpoints, is_http_method, HTTP_METHODS};
pub use load::{parse_document, validate_text, DocumentFormat};
pub use validator::{parse_failure, validate_spec, NO_AUTH_WARNING, NO_ENDPOINTS_WARNING};

/// Errors raised while reading a document
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("{0}")]
    Parse(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
}
