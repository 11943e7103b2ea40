use std::sync::Arc;

use conneg::config::{AppState, Config, NegotiationConfig};
use conneg::handler::{Application, ApplicationError, HandlerError, HttpResource, MethodEndpoint};
use conneg::http::Request;
use conneg::negotiation::{CharacterSet, MimeType, NegotiationError};
use conneg::routing::{RouteError, RouteMatch, Router};
use conneg::server::{create_reusable_listener, start_server_loop};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn mime(s: &str) -> MimeType {
    MimeType::parse(s).unwrap()
}

fn documents() -> Application {
    let mut router = Router::new();
    router
        .add(
            RouteMatch::prefix("/docs"),
            HttpResource::new()
                .method(
                    "GET",
                    MethodEndpoint::new(|call| {
                        let name = call.remainder.trim_start_matches('/');
                        if name == "broken" {
                            return Err(HandlerError::Internal("storage offline".into()));
                        }
                        Ok(match call.output.subtype() {
                            "html" => format!("<h1>{name}</h1>"),
                            _ => format!("# {name}"),
                        })
                    })
                    .producing(vec![mime("text/markdown"), mime("text/html")]),
                )
                .method(
                    "PUT",
                    MethodEndpoint::new(|call| {
                        let size = call.input.map_or(0, |b| b.len());
                        Ok(format!("stored {size} bytes"))
                    })
                    .producing(vec![mime("text/plain")])
                    .consuming(vec![mime("text/markdown"), mime("text/plain")]),
                ),
        )
        .unwrap();

    let negotiation = NegotiationConfig {
        charsets: vec!["utf-8".into(), "latin-1".into(), "utf-16".into()],
        default_mimetype: "text/markdown".into(),
        ..NegotiationConfig::default()
    };
    Application::new(negotiation.build_broker().unwrap(), router)
}

#[test]
fn test_default_representation() {
    let negotiated = documents()
        .handle(&Request::builder("GET", "/docs/intro").build())
        .unwrap();
    assert_eq!(negotiated.content_type.to_string(), "text/markdown; charset=utf-8");
    assert_eq!(negotiated.body, b"# intro");
}

#[test]
fn test_charset_changes_encoding() {
    let request = Request::builder("GET", "/docs/caf\u{e9}")
        .accept(vec![mime("text/html")])
        .accept_charset(vec![CharacterSet::parse("ISO-8859-1").unwrap()])
        .build();
    let negotiated = documents().handle(&request).unwrap();
    assert_eq!(negotiated.content_type.to_string(), "text/html; charset=iso8859-1");
    assert_eq!(negotiated.body, b"<h1>caf\xe9</h1>");

    let request = Request::builder("GET", "/docs/a")
        .accept_charset(vec![CharacterSet::parse("utf-16").unwrap()])
        .build();
    let negotiated = documents().handle(&request).unwrap();
    assert_eq!(negotiated.body, [0xff, 0xfe, b'#', 0, b' ', 0, b'a', 0]);
}

#[test]
fn test_quality_of_media_range_drops_from_content_type() {
    let request = Request::builder("GET", "/docs/x")
        .accept(vec![mime("text/*;q=0.8")])
        .build();
    let negotiated = documents().handle(&request).unwrap();
    assert_eq!(negotiated.content_type.to_string(), "text/markdown; charset=utf-8");
}

#[test]
fn test_put_with_entity() {
    let request = Request::builder("PUT", "/docs/new")
        .body(mime("text/markdown; variant=gfm"), "# new")
        .build();
    let negotiated = documents().handle(&request).unwrap();
    assert_eq!(negotiated.body, b"stored 5 bytes");

    let request = Request::builder("PUT", "/docs/new")
        .body(mime("application/octet-stream"), vec![0_u8, 1, 2])
        .build();
    assert!(matches!(
        documents().handle(&request),
        Err(ApplicationError::Negotiation(NegotiationError::UnsupportedMediaType { .. }))
    ));
}

#[test]
fn test_failures_are_typed() {
    let app = documents();
    assert!(matches!(
        app.handle(&Request::builder("GET", "/docs/broken").build()),
        Err(ApplicationError::Handler(HandlerError::Internal(_)))
    ));
    assert!(matches!(
        app.handle(&Request::builder("POST", "/docs/a").build()),
        Err(ApplicationError::Negotiation(NegotiationError::MethodNotAllowed { .. }))
    ));
    assert!(matches!(
        app.handle(&Request::builder("GET", "/elsewhere").build()),
        Err(ApplicationError::Route(RouteError::NotFound { .. }))
    ));
}

#[test]
fn test_registration_rejects_declared_method_without_endpoint() {
    let mut router = Router::new();
    let err = router
        .add(
            RouteMatch::exact("/half"),
            HttpResource::new()
                .method("GET", MethodEndpoint::new(|_| Ok(String::new())))
                .allow("PUT"),
        )
        .unwrap_err();
    assert!(matches!(err, RouteError::HandlerMissing { ref method, .. } if method == "PUT"));
}

#[tokio::test]
async fn test_served_over_tcp() {
    let mut config = Config::load_from("does-not-exist").unwrap();
    config.logging.access_log = false;
    let state = Arc::new(AppState::new(&config).unwrap());
    let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
    let addr = listener.local_addr().unwrap();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async move {
        let _ = stop_rx.await;
    };
    let server = tokio::spawn(start_server_loop(listener, state, shutdown));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"POST /echo?ignored=1 HTTP/1.1\r\nHost: test\r\nAccept: application/json\r\n\
              Content-Type: text/plain; charset=latin-1\r\nContent-Length: 4\r\n\
              Connection: close\r\n\r\ncaf\xe9",
        )
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(
        response.contains("content-type: application/json; charset=utf-8"),
        "{response}"
    );
    assert!(response.ends_with("{\"echo\":\"caf\u{e9}\"}"), "{response}");

    stop_tx.send(()).unwrap();
    assert!(server.await.unwrap().is_ok());
}
