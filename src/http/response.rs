//! HTTP response building module
//!
//! Turns negotiated representations and rejections into hyper responses.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use hyper::{Response, StatusCode};

use crate::handler::{ApplicationError, HandlerError, Negotiated};
use crate::http::request::RequestError;
use crate::negotiation::NegotiationError;
use crate::routing::RouteError;

/// Build 200 response carrying a negotiated representation
pub fn build_negotiated_response(
    negotiated: Negotiated,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let content_length = negotiated.body.len();
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, negotiated.content_type.to_string())
        .header(CONTENT_LENGTH, content_length)
        .header(SERVER, server_name)
        .body(Full::new(Bytes::from(negotiated.body)))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Status for an application failure
pub const fn status_for(error: &ApplicationError) -> StatusCode {
    match error {
        ApplicationError::Route(RouteError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ApplicationError::Negotiation(err) => match err {
            NegotiationError::MethodUnimplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            NegotiationError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            NegotiationError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            NegotiationError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            NegotiationError::HandlerMissing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ApplicationError::Handler(HandlerError::BadInput(_)) => StatusCode::BAD_REQUEST,
        ApplicationError::Route(RouteError::HandlerMissing { .. })
        | ApplicationError::Handler(HandlerError::Internal(_))
        | ApplicationError::Encode(_)
        | ApplicationError::ContentType(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the error response for an application failure
///
/// 405 responses list the allowed methods in an `Allow` header. Server-side
/// failures do not leak their cause to the client.
pub fn build_error_response(error: &ApplicationError, server_name: &str) -> Response<Full<Bytes>> {
    let status = status_for(error);
    let message = if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
        None
    } else {
        Some(error.to_string())
    };
    let allow = match error {
        ApplicationError::Negotiation(NegotiationError::MethodNotAllowed { allowed, .. }) => {
            Some(allowed.join(", "))
        }
        _ => None,
    };
    build_status_response(status, message.as_deref(), allow.as_deref(), server_name)
}

/// Build 400 response for a malformed request head
pub fn build_bad_request_response(
    error: &RequestError,
    server_name: &str,
) -> Response<Full<Bytes>> {
    build_status_response(StatusCode::BAD_REQUEST, Some(&error.to_string()), None, server_name)
}

/// Build 408 Request Timeout response
pub fn build_408_response(server_name: &str) -> Response<Full<Bytes>> {
    build_status_response(StatusCode::REQUEST_TIMEOUT, None, None, server_name)
}

/// Build 413 Payload Too Large response
pub fn build_413_response(server_name: &str) -> Response<Full<Bytes>> {
    build_status_response(StatusCode::PAYLOAD_TOO_LARGE, None, None, server_name)
}

/// Plain-text status response: `<code> <reason>` plus an optional detail line
fn build_status_response(
    status: StatusCode,
    detail: Option<&str>,
    allow: Option<&str>,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let mut text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    if let Some(detail) = detail {
        text.push('\n');
        text.push_str(detail);
    }

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len())
        .header(SERVER, server_name);
    if let Some(allow) = allow {
        builder = builder.header(ALLOW, allow);
    }

    builder.body(Full::new(Bytes::from(text))).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        let mut fallback = Response::new(Full::new(Bytes::new()));
        *fallback.status_mut() = status;
        fallback
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::{CharacterSet, EncodeError, MimeType};
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[rstest]
    #[case(ApplicationError::Route(RouteError::NotFound { path: "/x".into() }), 404)]
    #[case(
        ApplicationError::Negotiation(NegotiationError::MethodUnimplemented {
            method: "TRACE".into(),
        }),
        501
    )]
    #[case(ApplicationError::Negotiation(NegotiationError::NotAcceptable), 406)]
    #[case(
        ApplicationError::Negotiation(NegotiationError::UnsupportedMediaType {
            content_type: MimeType::parse("image/png").unwrap(),
        }),
        415
    )]
    #[case(
        ApplicationError::Negotiation(NegotiationError::HandlerMissing { method: "GET".into() }),
        500
    )]
    #[case(ApplicationError::Handler(HandlerError::BadInput("bad json".into())), 400)]
    #[case(ApplicationError::Handler(HandlerError::Internal("boom".into())), 500)]
    #[case(ApplicationError::Encode(EncodeError { codec: "ascii", character: '\u{e9}' }), 500)]
    fn test_status_mapping(#[case] error: ApplicationError, #[case] status: u16) {
        assert_eq!(status_for(&error).as_u16(), status);
        assert_eq!(build_error_response(&error, "test").status().as_u16(), status);
    }

    #[test]
    fn test_method_not_allowed_lists_allowed_methods() {
        let error = ApplicationError::Negotiation(NegotiationError::MethodNotAllowed {
            method: "DELETE".into(),
            allowed: vec!["GET".into(), "POST".into()],
        });
        let response = build_error_response(&error, "test");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");
    }

    #[tokio::test]
    async fn test_internal_failures_hide_detail() {
        let error = ApplicationError::Handler(HandlerError::Internal("secret".into()));
        let text = body_text(build_error_response(&error, "test")).await;
        assert_eq!(text, "500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_negotiated_response() {
        let negotiated = Negotiated {
            content_type: MimeType::parse("text/plain; charset=utf-8").unwrap(),
            charset: CharacterSet::new("utf-8").unwrap(),
            body: b"hello".to_vec(),
        };
        let response = build_negotiated_response(negotiated, "conneg");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(response.headers()[CONTENT_LENGTH], "5");
        assert_eq!(response.headers()[SERVER], "conneg");
        assert_eq!(body_text(response).await, "hello");
    }
}
