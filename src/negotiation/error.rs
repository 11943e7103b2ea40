//! Negotiation error types
//!
//! Parsing failures and negotiation rejections are kept apart: the former
//! describe malformed input, the latter describe a breakdown between what a
//! client asks for and what the server can do.

use super::mime::MimeType;

/// Failure to parse or construct a negotiable value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A parameter violates the token/quoted-string grammar
    #[error("malformed parameter: {0}")]
    MalformedParameter(String),
    /// A media type is not registered, not an extension, or breaks the
    /// wildcard rule
    #[error("invalid media type: {0}")]
    InvalidType(String),
    /// The expression does not have the expected overall shape
    #[error("could not parse {0:?}")]
    Unparseable(String),
    /// The character set name does not resolve to a codec
    #[error("unknown character set: {0}")]
    UnknownCharset(String),
}

/// Coarse classification of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    GrammarViolation,
    InvalidType,
    ParseFailure,
    CharsetUnknown,
}

impl ParseError {
    pub const fn kind(&self) -> ParseErrorKind {
        match self {
            Self::MalformedParameter(_) => ParseErrorKind::GrammarViolation,
            Self::InvalidType(_) => ParseErrorKind::InvalidType,
            Self::Unparseable(_) => ParseErrorKind::ParseFailure,
            Self::UnknownCharset(_) => ParseErrorKind::CharsetUnknown,
        }
    }
}

/// Rejection produced by the [`Broker`](super::Broker)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    /// The method is not known to the server at all
    #[error("method {method} is not implemented")]
    MethodUnimplemented { method: String },
    /// The method is known, but this resource does not offer it
    #[error("method {method} is not allowed; allowed: {}", allowed.join(", "))]
    MethodNotAllowed { method: String, allowed: Vec<String> },
    /// The resource declares the method but has no endpoint for it
    #[error("resource allows {method} but provides no handler for it")]
    HandlerMissing { method: String },
    /// No offered value satisfies any requested value
    #[error("none of the requested representations can be produced")]
    NotAcceptable,
    /// The request entity is of a type the endpoint cannot consume
    #[error("unsupported media type: {content_type}")]
    UnsupportedMediaType { content_type: MimeType },
}

impl NegotiationError {
    /// Whether the rejection points at a misconfigured resource rather than
    /// at the request
    pub const fn is_misconfiguration(&self) -> bool {
        matches!(self, Self::HandlerMissing { .. })
    }
}

/// Text that cannot be represented in the negotiated character set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("character {character:?} cannot be encoded as {codec}")]
pub struct EncodeError {
    pub codec: &'static str,
    pub character: char,
}

/// Bytes that are not valid in the declared character set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("input is not valid {codec}")]
pub struct DecodeError {
    pub codec: &'static str,
}
