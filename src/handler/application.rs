//! Negotiating application
//!
//! Runs a request through routing and every negotiation step, then calls the
//! endpoint and encodes its output. Failures come back typed; turning them
//! into responses is left to the HTTP layer.

use crate::http::request::Request;
use crate::negotiation::{
    Broker, CharacterSet, EncodeError, MimeType, NegotiationError, NegotiationRequest, ParseError,
};
use crate::routing::{RouteError, Router};

use super::resource::{Call, HandlerError, HttpResource};

/// Successful outcome of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// Content-Type to send: negotiated type plus `charset`
    pub content_type: MimeType,
    pub charset: CharacterSet,
    /// Handler output encoded in `charset`
    pub body: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("cannot build response content type: {0}")]
    ContentType(#[from] ParseError),
}

/// Router plus broker
#[derive(Debug)]
pub struct Application {
    broker: Broker,
    router: Router<HttpResource>,
}

impl Application {
    pub const fn new(broker: Broker, router: Router<HttpResource>) -> Self {
        Self { broker, router }
    }

    pub const fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Handle one request
    ///
    /// Order: route, endpoint, charset, output type, input, handler,
    /// encoding.
    pub fn handle(&self, request: &Request) -> Result<Negotiated, ApplicationError> {
        let matched = self.router.match_route(request.path())?;
        let endpoint = self
            .broker
            .negotiate_endpoint(request.method(), matched.resource)?;
        let charset = self.broker.negotiate_charset(request.accept_charset())?;
        let output = self.broker.negotiate_output(request, endpoint)?;
        let input = self.broker.negotiate_input(request, endpoint)?;

        let text = endpoint.call(&Call {
            input: input.as_ref(),
            input_type: input.as_ref().and(request.content_type()),
            input_charset: self.broker.default_charset(),
            output: &output,
            charset: &charset,
            remainder: matched.remainder,
            captures: &matched.captures,
            query: request.query(),
        })?;

        let content_type = output
            .without_quality()
            .with_parameter("charset", charset.name())?;
        let body = charset.codec().encode(&text)?;

        Ok(Negotiated {
            content_type,
            charset,
            body,
        })
    }
}
