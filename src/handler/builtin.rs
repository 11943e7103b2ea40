//! Built-in resources
//!
//! `/` greets in whatever representation the client prefers; `/echo` sends
//! the request entity back in the negotiated representation.

use serde_json::{json, Value};

use crate::config::{Config, ConfigError};
use crate::negotiation::MimeType;
use crate::routing::{RouteMatch, Router};

use super::application::Application;
use super::resource::{Call, HandlerError, HttpResource, MethodEndpoint};

const GREETING: &str = "Hello, world!";

/// Assemble the application served by the binary
pub fn application(config: &Config) -> Result<Application, ConfigError> {
    let broker = config.negotiation.build_broker()?;
    Ok(Application::new(broker, router()?))
}

/// Routing table with the built-in resources
pub fn router() -> Result<Router<HttpResource>, ConfigError> {
    let text_types = types(&["text/plain", "text/html", "application/json"])?;

    let mut router = Router::new();
    router.add(
        RouteMatch::exact("/"),
        HttpResource::new().method(
            "GET",
            MethodEndpoint::new(greet).producing(text_types.clone()),
        ),
    )?;

    let echo_endpoint = MethodEndpoint::new(echo)
        .producing(text_types)
        .consuming(types(&["text/plain", "application/json"])?);
    router.add(
        RouteMatch::exact("/echo"),
        HttpResource::new()
            .method("POST", echo_endpoint.clone())
            .method("PUT", echo_endpoint),
    )?;

    Ok(router)
}

fn types(names: &[&str]) -> Result<Vec<MimeType>, ConfigError> {
    names
        .iter()
        .map(|name| MimeType::parse(name).map_err(|e| ConfigError::Invalid(e.to_string())))
        .collect()
}

/// `GET /`; `?name=` replaces the greeted party
#[allow(clippy::unnecessary_wraps)]
fn greet(call: &Call<'_>) -> Result<String, HandlerError> {
    let message = call
        .query_param("name")
        .filter(|name| !name.is_empty())
        .map_or_else(|| GREETING.to_string(), |name| format!("Hello, {name}!"));
    let charset = call.charset.name();

    Ok(match (call.output.type_(), call.output.subtype()) {
        ("application", "json") => json!({ "message": message, "charset": charset }).to_string(),
        ("text", "html") => format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"{charset}\">\
             <title>conneg</title></head>\n<body><p>{}</p></body></html>\n",
            escape_html(&message)
        ),
        _ => format!("{message}\n"),
    })
}

/// `POST`/`PUT /echo`
fn echo(call: &Call<'_>) -> Result<String, HandlerError> {
    let text = call
        .input_text()?
        .ok_or_else(|| HandlerError::BadInput("request has no entity".to_string()))?;

    let is_json = call
        .input_type
        .is_some_and(|t| t.type_() == "application" && t.subtype() == "json");
    let value = if is_json {
        serde_json::from_str::<Value>(&text)
            .map_err(|e| HandlerError::BadInput(format!("entity is not JSON: {e}")))?
    } else {
        Value::String(text)
    };

    Ok(match (call.output.type_(), call.output.subtype()) {
        ("application", "json") => json!({ "echo": value }).to_string(),
        ("text", "html") => format!(
            "<!DOCTYPE html>\n<html><body><pre>{}</pre></body></html>\n",
            escape_html(&plain(&value))
        ),
        _ => plain(&value),
    })
}

/// Strings as-is, anything else as compact JSON
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NegotiationConfig;
    use crate::handler::ApplicationError;
    use crate::http::Request;
    use crate::negotiation::CharacterSet;

    fn app() -> Application {
        Application::new(NegotiationConfig::default().build_broker().unwrap(), router().unwrap())
    }

    fn mime(s: &str) -> MimeType {
        MimeType::parse(s).unwrap()
    }

    fn text(body: &[u8]) -> &str {
        std::str::from_utf8(body).unwrap()
    }

    #[test]
    fn test_greeting_defaults_to_html() {
        let negotiated = app().handle(&Request::builder("GET", "/").build()).unwrap();
        assert_eq!(negotiated.content_type.to_string(), "text/html; charset=utf-8");
        assert!(text(&negotiated.body).contains("<p>Hello, world!</p>"));
    }

    #[test]
    fn test_greeting_as_json() {
        let request = Request::builder("GET", "/")
            .query("name=<you>")
            .accept(vec![mime("application/json"), mime("text/*;q=0.5")])
            .accept_charset(vec![CharacterSet::parse("ascii").unwrap()])
            .build();
        let negotiated = app().handle(&request).unwrap();
        assert_eq!(negotiated.content_type.to_string(), "application/json; charset=ascii");
        let value: Value = serde_json::from_slice(&negotiated.body).unwrap();
        assert_eq!(value["message"], "Hello, <you>!");
        assert_eq!(value["charset"], "ascii");
    }

    #[test]
    fn test_greeting_name_is_decoded() {
        let request = Request::builder("GET", "/")
            .query("name=J%C3%B6rg+Smith&name=ignored")
            .accept(vec![mime("text/plain")])
            .build();
        let negotiated = app().handle(&request).unwrap();
        assert_eq!(text(&negotiated.body), "Hello, J\u{f6}rg Smith!\n");

        let request = Request::builder("GET", "/")
            .query("name=")
            .accept(vec![mime("text/plain")])
            .build();
        let negotiated = app().handle(&request).unwrap();
        assert_eq!(text(&negotiated.body), "Hello, world!\n");
    }

    #[test]
    fn test_echo_decodes_declared_charset() {
        let request = Request::builder("POST", "/echo")
            .accept(vec![mime("text/plain")])
            .body(mime("text/plain; charset=iso-8859-1"), b"caf\xe9".as_slice())
            .build();
        let negotiated = app().handle(&request).unwrap();
        assert_eq!(negotiated.body, "caf\u{e9}".as_bytes());

        let request = Request::builder("POST", "/echo")
            .accept(vec![mime("application/json")])
            .body(mime("application/json; charset=utf-16"), vec![0xff, 0xfe, b'1', 0])
            .build();
        let negotiated = app().handle(&request).unwrap();
        assert_eq!(text(&negotiated.body), r#"{"echo":1}"#);
    }

    #[test]
    fn test_echo_without_charset_uses_default() {
        // The default charset is utf-8, which these bytes are not
        let request = Request::builder("POST", "/echo")
            .body(mime("text/plain"), b"caf\xe9".as_slice())
            .build();
        assert!(matches!(
            app().handle(&request),
            Err(ApplicationError::Handler(HandlerError::BadInput(_)))
        ));
    }

    #[test]
    fn test_echo_json_as_text() {
        let request = Request::builder("PUT", "/echo")
            .accept(vec![mime("text/plain")])
            .body(mime("application/json"), r#"{"a": [1, 2]}"#)
            .build();
        let negotiated = app().handle(&request).unwrap();
        assert_eq!(text(&negotiated.body), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_echo_text_as_html() {
        let request = Request::builder("POST", "/echo")
            .accept(vec![mime("text/html")])
            .body(mime("text/plain"), "a < b")
            .build();
        let negotiated = app().handle(&request).unwrap();
        assert!(text(&negotiated.body).contains("<pre>a &lt; b</pre>"));
    }

    #[test]
    fn test_echo_rejects_bad_input() {
        let request = Request::builder("POST", "/echo")
            .body(mime("application/json"), "{oops")
            .build();
        assert!(matches!(
            app().handle(&request),
            Err(ApplicationError::Handler(HandlerError::BadInput(_)))
        ));

        let request = Request::builder("POST", "/echo").build();
        assert!(matches!(
            app().handle(&request),
            Err(ApplicationError::Handler(HandlerError::BadInput(_)))
        ));
    }
}
