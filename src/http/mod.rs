//! HTTP protocol layer module
//!
//! Converts between hyper's request/response types and the negotiation
//! pipeline's own view of a request and its outcome.

pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::{Request, RequestBuilder, RequestError};
pub use response::{
    build_408_response, build_413_response, build_bad_request_response, build_error_response,
    build_negotiated_response, status_for,
};
