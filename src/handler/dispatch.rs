//! Request dispatch module
//!
//! Entry point for HTTP request processing: body size check, request
//! parsing, the negotiation pipeline, response building and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::{Request, Response};

use super::application::ApplicationError;
use super::resource::HandlerError;
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::negotiation::NegotiationError;
use crate::routing::RouteError;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let server_name = state.config.http.server_name.as_str();
    let max_body_size = state.config.http.max_body_size;
    let read_timeout = Duration::from_secs(state.config.performance.read_timeout);

    let (parts, body) = req.into_parts();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.referer = header_text(&parts.headers, REFERER.as_str());
    entry.user_agent = header_text(&parts.headers, USER_AGENT.as_str());

    let response = if declared_too_large(&parts.headers, max_body_size) {
        logger::log_warning(&format!(
            "Request body too large for {} (max: {max_body_size} bytes)",
            parts.uri.path()
        ));
        http::build_413_response(server_name)
    } else {
        let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
        match tokio::time::timeout(read_timeout, Limited::new(body, limit).collect()).await {
            Err(_) => {
                logger::log_warning(&format!(
                    "Request body for {} not received within {} seconds",
                    parts.uri.path(),
                    read_timeout.as_secs()
                ));
                http::build_408_response(server_name)
            }
            Ok(Err(e)) => {
                logger::log_warning(&format!("Failed to read request body: {e}"));
                http::build_413_response(server_name)
            }
            Ok(Ok(collected)) => respond(&parts, collected.to_bytes(), &state, &mut entry),
        }
    };

    if state.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run the negotiation pipeline for a fully read request
fn respond(
    parts: &hyper::http::request::Parts,
    body: Bytes,
    state: &AppState,
    entry: &mut AccessLogEntry,
) -> Response<Full<Bytes>> {
    let server_name = state.config.http.server_name.as_str();

    let request = match http::Request::from_parts(parts, body) {
        Ok(request) => request,
        Err(e) => {
            logger::log_warning(&format!("Bad request for {}: {e}", parts.uri.path()));
            return http::build_bad_request_response(&e, server_name);
        }
    };

    match state.application.handle(&request) {
        Ok(negotiated) => {
            entry.content_type = Some(negotiated.content_type.to_string());
            entry.charset = Some(negotiated.charset.name().to_string());
            logger::log_debug(&format!(
                "{} {} negotiated {}",
                parts.method,
                parts.uri.path(),
                negotiated.content_type
            ));
            http::build_negotiated_response(negotiated, server_name)
        }
        Err(e) => {
            log_failure(parts, &e);
            http::build_error_response(&e, server_name)
        }
    }
}

/// Client faults are warnings; anything the server got wrong is an error
fn log_failure(parts: &hyper::http::request::Parts, error: &ApplicationError) {
    let message = format!("{} {}: {error}", parts.method, parts.uri.path());
    let server_fault = match error {
        ApplicationError::Negotiation(e) => e.is_misconfiguration(),
        ApplicationError::Handler(HandlerError::BadInput(_))
        | ApplicationError::Route(RouteError::NotFound { .. }) => false,
        ApplicationError::Route(_)
        | ApplicationError::Handler(_)
        | ApplicationError::Encode(_)
        | ApplicationError::ContentType(_) => true,
    };
    if server_fault {
        logger::log_error(&message);
    } else if matches!(error, ApplicationError::Negotiation(NegotiationError::NotAcceptable)) {
        logger::log_info(&message);
    } else {
        logger::log_warning(&message);
    }
}

/// Whether the declared Content-Length exceeds `max`
fn declared_too_large(headers: &hyper::HeaderMap, max: u64) -> bool {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|size| size > max)
}

fn header_text(headers: &hyper::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hyper::header::{ACCEPT, ALLOW, CONTENT_TYPE};
    use hyper::StatusCode;

    /// Body that never yields a frame
    struct Stalled;

    impl Body for Stalled {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Result<hyper::body::Frame<Bytes>, Infallible>>> {
            std::task::Poll::Pending
        }
    }

    fn state(max_body_size: u64) -> Arc<AppState> {
        let mut config = Config::load_from("does-not-exist").unwrap();
        config.logging.access_log = false;
        config.http.max_body_size = max_body_size;
        Arc::new(AppState::new(&config).unwrap())
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn send(state: Arc<AppState>, request: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        handle_request(request, peer(), state).await.unwrap()
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_get_negotiates_json() {
        let request = Request::get("/")
            .header(ACCEPT, "text/html;q=0.2, application/json")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = send(state(1024), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
        assert!(body_text(response).await.contains("Hello, world!"));
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let request = Request::post("/echo")
            .header(ACCEPT, "text/plain")
            .header(CONTENT_TYPE, "text/plain")
            .body(Full::new(Bytes::from_static(b"ping")))
            .unwrap();
        let response = send(state(1024), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ping");
    }

    #[tokio::test]
    async fn test_query_and_entity_are_decoded() {
        let request = Request::get("/?name=J%C3%B6rg+Smith")
            .header(ACCEPT, "text/plain")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = send(state(1024), request).await;
        assert_eq!(body_text(response).await, "Hello, J\u{f6}rg Smith!\n");

        let request = Request::post("/echo")
            .header(ACCEPT, "text/plain")
            .header(CONTENT_TYPE, "text/plain; charset=latin-1")
            .body(Full::new(Bytes::from_static(b"caf\xe9")))
            .unwrap();
        let response = send(state(1024), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "caf\u{e9}");
    }

    #[tokio::test]
    async fn test_rejections() {
        let state = state(4);

        let request = Request::delete("/").body(Full::new(Bytes::new())).unwrap();
        assert_eq!(send(Arc::clone(&state), request).await.status(), StatusCode::NOT_IMPLEMENTED);

        let request = Request::post("/").body(Full::new(Bytes::new())).unwrap();
        let response = send(Arc::clone(&state), request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");

        let request = Request::get("/nowhere").body(Full::new(Bytes::new())).unwrap();
        assert_eq!(send(Arc::clone(&state), request).await.status(), StatusCode::NOT_FOUND);

        let request = Request::get("/")
            .header(ACCEPT, "image/png")
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(send(Arc::clone(&state), request).await.status(), StatusCode::NOT_ACCEPTABLE);

        let request = Request::get("/")
            .header(ACCEPT, "text/html;q=2")
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(send(Arc::clone(&state), request).await.status(), StatusCode::BAD_REQUEST);

        let request = Request::post("/echo")
            .header(CONTENT_TYPE, "image/png")
            .body(Full::new(Bytes::from_static(b"png")))
            .unwrap();
        assert_eq!(
            send(Arc::clone(&state), request).await.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );

        let request = Request::post("/echo")
            .header(CONTENT_TYPE, "text/plain")
            .body(Full::new(Bytes::from_static(b"too long")))
            .unwrap();
        assert_eq!(send(state, request).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let mut config = Config::load_from("does-not-exist").unwrap();
        config.logging.access_log = false;
        config.performance.read_timeout = 1;
        let state = Arc::new(AppState::new(&config).unwrap());

        let request = Request::post("/echo")
            .header(CONTENT_TYPE, "text/plain")
            .body(Stalled)
            .unwrap();
        let response = handle_request(request, peer(), state).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_declared_too_large() {
        let mut headers = hyper::HeaderMap::new();
        assert!(!declared_too_large(&headers, 10));
        headers.insert(CONTENT_LENGTH, "11".parse().unwrap());
        assert!(declared_too_large(&headers, 10));
        headers.insert(CONTENT_LENGTH, "junk".parse().unwrap());
        assert!(!declared_too_large(&headers, 10));
    }
}
