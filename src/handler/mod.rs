//! Request handler module
//!
//! Resources and their endpoints, the application that negotiates each
//! request against them, and the hyper entry point.

pub mod application;
pub mod builtin;
pub mod dispatch;
pub mod resource;

// Re-export main entry point
pub use application::{Application, ApplicationError, Negotiated};
pub use dispatch::handle_request;
pub use resource::{Call, HandlerError, HttpResource, MethodEndpoint};
