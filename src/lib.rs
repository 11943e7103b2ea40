//! HTTP content negotiation
//!
//! Parses Accept and Accept-Charset preferences, picks the best content
//! type and charset a resource can produce, checks request entities against
//! what the resource consumes, and serves the result over HTTP/1.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod negotiation;
pub mod routing;
pub mod server;
