//! Negotiation request module
//!
//! Captures the request head fields negotiation depends on, parsed once,
//! together with the already collected entity body.

use hyper::body::Bytes;
use hyper::header::{HeaderMap, ACCEPT, ACCEPT_CHARSET, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::http::request::Parts;

use crate::negotiation::accept::{parse_accept, parse_accept_charset};
use crate::negotiation::{CharacterSet, MimeType, NegotiationRequest, ParseError};

/// Malformed request head
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("{header} header contains non-ASCII characters")]
    NonAscii { header: &'static str },
    #[error("invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),
    #[error("malformed query string: {0}")]
    MalformedQuery(String),
    #[error("malformed {header} header: {source}")]
    Malformed {
        header: &'static str,
        #[source]
        source: ParseError,
    },
}

/// Request as seen by the negotiation pipeline
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: String,
    path: String,
    /// Decoded query parameters in request order
    query: Vec<(String, String)>,
    content_type: Option<MimeType>,
    content_length: Option<u64>,
    accept: Option<Vec<MimeType>>,
    accept_charset: Option<Vec<CharacterSet>>,
    body: Bytes,
}

impl Request {
    /// Build from a request head and its collected body
    ///
    /// A body that arrived without a Content-Length (chunked transfer) is
    /// treated as declaring its own length.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Result<Self, RequestError> {
        let headers = &parts.headers;

        let content_length = match header_str(headers, CONTENT_LENGTH.as_str())? {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| RequestError::InvalidContentLength(raw.to_string()))?,
            ),
            None if !body.is_empty() => Some(body.len() as u64),
            None => None,
        };

        let content_type = header_str(headers, CONTENT_TYPE.as_str())?
            .map(|raw| {
                MimeType::parse(raw).map_err(|source| RequestError::Malformed {
                    header: "Content-Type",
                    source,
                })
            })
            .transpose()?;

        let accept = header_str(headers, ACCEPT.as_str())?
            .map(|raw| {
                parse_accept(raw).map_err(|source| RequestError::Malformed {
                    header: "Accept",
                    source,
                })
            })
            .transpose()?;

        let accept_charset = header_str(headers, ACCEPT_CHARSET.as_str())?
            .map(|raw| {
                parse_accept_charset(raw).map_err(|source| RequestError::Malformed {
                    header: "Accept-Charset",
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(parse_query).transpose()?.unwrap_or_default(),
            content_type,
            content_length,
            accept,
            accept_charset,
            body,
        })
    }

    pub fn builder(method: &str, path: &str) -> RequestBuilder {
        RequestBuilder {
            request: Self {
                method: method.to_ascii_uppercase(),
                path: path.to_string(),
                ..Self::default()
            },
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

/// Decode `application/x-www-form-urlencoded` pairs, `+` and percent escapes
/// included
fn parse_query(raw: &str) -> Result<Vec<(String, String)>, RequestError> {
    serde_urlencoded::from_str(raw).map_err(|e| RequestError::MalformedQuery(e.to_string()))
}

/// Header value as text, `None` when absent
fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<Option<&'a str>, RequestError> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| RequestError::NonAscii { header: name }))
        .transpose()
}

impl NegotiationRequest for Request {
    fn method(&self) -> &str {
        &self.method
    }

    fn content_type(&self) -> Option<&MimeType> {
        self.content_type.as_ref()
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn accept(&self) -> Option<&[MimeType]> {
        self.accept.as_deref()
    }

    fn accept_charset(&self) -> Option<&[CharacterSet]> {
        self.accept_charset.as_deref()
    }

    fn read_entity(&self) -> Bytes {
        self.body.clone()
    }
}

/// Builder for requests that do not come off the wire
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Set the query from its encoded form
    ///
    /// A query that does not decode leaves the request without parameters.
    #[must_use]
    pub fn query(mut self, query: &str) -> Self {
        self.request.query = parse_query(query).unwrap_or_default();
        self
    }

    #[must_use]
    pub fn accept(mut self, accept: Vec<MimeType>) -> Self {
        self.request.accept = Some(accept);
        self
    }

    #[must_use]
    pub fn accept_charset(mut self, accept_charset: Vec<CharacterSet>) -> Self {
        self.request.accept_charset = Some(accept_charset);
        self
    }

    /// Attach an entity with its declared type and length
    #[must_use]
    pub fn body(mut self, content_type: MimeType, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.request.content_length = Some(body.len() as u64);
        self.request.content_type = Some(content_type);
        self.request.body = body;
        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}
