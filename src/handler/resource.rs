//! Resource definitions
//!
//! A resource maps each method it allows to an endpoint. Endpoints declare
//! the content types they produce and consume and carry the handler that
//! does the actual work once negotiation has settled.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hyper::body::Bytes;

use crate::negotiation::{CharacterSet, Codec, Endpoint, MimeType, Negotiable, Resource};

/// Failure inside a handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The entity could not be decoded
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("handler failed: {0}")]
    Internal(String),
}

/// Everything a handler gets to see
#[derive(Debug)]
pub struct Call<'a> {
    /// Raw request entity, if the request carried one
    pub input: Option<&'a Bytes>,
    /// Declared type of `input`
    pub input_type: Option<&'a MimeType>,
    /// Charset of `input` when `input_type` names none
    pub input_charset: &'a CharacterSet,
    /// Negotiated output type
    pub output: &'a MimeType,
    /// Negotiated output charset
    pub charset: &'a CharacterSet,
    /// Path left over after the matched route
    pub remainder: &'a str,
    /// Groups captured by a pattern route
    pub captures: &'a [Option<&'a str>],
    /// Decoded query parameters
    pub query: &'a [(String, String)],
}

impl Call<'_> {
    /// First value of query parameter `name`
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The entity decoded as text
    ///
    /// Uses the `charset` parameter of the declared type, or
    /// `input_charset` when there is none.
    pub fn input_text(&self) -> Result<Option<String>, HandlerError> {
        let Some(input) = self.input else {
            return Ok(None);
        };
        let codec = match self.input_type.and_then(|t| t.parameters().get("charset")) {
            Some(label) => Codec::lookup(label)
                .ok_or_else(|| HandlerError::BadInput(format!("unknown charset {label:?}")))?,
            None => self.input_charset.codec(),
        };
        codec
            .decode(input)
            .map(Some)
            .map_err(|e| HandlerError::BadInput(e.to_string()))
    }
}

type HandlerFn = dyn Fn(&Call<'_>) -> Result<String, HandlerError> + Send + Sync;

/// One method of a resource
#[derive(Clone)]
pub struct MethodEndpoint {
    produces: Vec<MimeType>,
    consumes: Vec<MimeType>,
    handler: Arc<HandlerFn>,
}

impl MethodEndpoint {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Call<'_>) -> Result<String, HandlerError> + Send + Sync + 'static,
    {
        Self {
            produces: Vec::new(),
            consumes: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    #[must_use]
    pub fn producing(mut self, types: Vec<MimeType>) -> Self {
        self.produces = types;
        self
    }

    #[must_use]
    pub fn consuming(mut self, types: Vec<MimeType>) -> Self {
        self.consumes = types;
        self
    }

    /// Run the handler; returns text to be encoded in the negotiated charset
    pub fn call(&self, call: &Call<'_>) -> Result<String, HandlerError> {
        (self.handler)(call)
    }
}

impl Endpoint for MethodEndpoint {
    fn produces(&self) -> &[MimeType] {
        &self.produces
    }

    fn consumes(&self) -> &[MimeType] {
        &self.consumes
    }
}

impl fmt::Debug for MethodEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEndpoint")
            .field("produces", &self.produces)
            .field("consumes", &self.consumes)
            .finish_non_exhaustive()
    }
}

/// A routable resource
#[derive(Debug, Clone, Default)]
pub struct HttpResource {
    allowed: Vec<String>,
    endpoints: HashMap<String, MethodEndpoint>,
}

impl HttpResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `method` with `endpoint`
    #[must_use]
    pub fn method(mut self, method: &str, endpoint: MethodEndpoint) -> Self {
        let method = method.to_ascii_uppercase();
        self = self.allow(&method);
        self.endpoints.insert(method, endpoint);
        self
    }

    /// List `method` as allowed without attaching an endpoint
    ///
    /// Such a resource is rejected when it is added to a router.
    #[must_use]
    pub fn allow(mut self, method: &str) -> Self {
        let method = method.to_ascii_uppercase();
        if !self.allowed.contains(&method) {
            self.allowed.push(method);
        }
        self
    }
}

impl Resource for HttpResource {
    type Endpoint = MethodEndpoint;

    fn allowed_methods(&self) -> &[String] {
        &self.allowed
    }

    fn endpoint(&self, method: &str) -> Option<&MethodEndpoint> {
        self.endpoints.get(method)
    }
}
