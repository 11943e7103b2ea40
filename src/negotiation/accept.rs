//! Accept and Accept-Charset header parsing
//!
//! Both headers are comma-separated lists. A malformed element rejects the
//! whole header; an unknown charset only drops that element.

use super::charset::CharacterSet;
use super::error::ParseError;
use super::grammar::split_outside_quotes;
use super::mime::MimeType;

/// Parse an Accept header value into the requested media ranges
///
/// # Examples
/// ```
/// use conneg::negotiation::accept::parse_accept;
///
/// let accepted = parse_accept("text/html, application/json;q=0.9").unwrap();
/// assert_eq!(accepted.len(), 2);
/// assert!(parse_accept("text/html, nonsense").is_err());
/// ```
pub fn parse_accept(header: &str) -> Result<Vec<MimeType>, ParseError> {
    split_outside_quotes(header, ',')
        .into_iter()
        .map(MimeType::parse)
        .collect()
}

/// Parse an Accept-Charset header value
///
/// Elements naming a charset without a known codec (including `*`) are
/// skipped.
///
/// # Examples
/// ```
/// use conneg::negotiation::accept::parse_accept_charset;
///
/// let accepted = parse_accept_charset("utf-8, klingon;q=0.9, ascii;q=0.5").unwrap();
/// assert_eq!(accepted.len(), 2);
/// assert!(parse_accept_charset("utf-8, @bad@").is_err());
/// ```
pub fn parse_accept_charset(header: &str) -> Result<Vec<CharacterSet>, ParseError> {
    let mut charsets = Vec::new();
    for element in split_outside_quotes(header, ',') {
        match CharacterSet::parse(element) {
            Ok(charset) => charsets.push(charset),
            Err(ParseError::UnknownCharset(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(charsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::error::ParseErrorKind;
    use crate::negotiation::negotiable::Negotiable;

    #[test]
    fn test_parse_accept() {
        let accepted =
            parse_accept("text/*;q=0.3, text/html;q=0.7, text/html;level=1, */*;q=0.5").unwrap();
        assert_eq!(accepted.len(), 4);
        assert_eq!(accepted[1].to_string(), "text/html; q=0.7");
        assert_eq!(accepted[2].parameters().get("level"), Some("1"));
    }

    #[test]
    fn test_parse_accept_quoted_comma() {
        let accepted = parse_accept("text/plain; title=\"a, b\", text/html").unwrap();
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].parameters().get("title"), Some("a, b"));
    }

    #[test]
    fn test_parse_accept_rejects_whole_header() {
        let err = parse_accept("text/html, image/*, */html").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::InvalidType);
    }

    #[test]
    fn test_parse_accept_empty() {
        assert!(parse_accept("").unwrap().is_empty());
        assert_eq!(parse_accept(" , text/html ,").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_accept_charset_drops_unknown() {
        let accepted = parse_accept_charset("*, iso-8859-5, utf-8;q=0.7").unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].name(), "utf-8");
    }

    #[test]
    fn test_parse_accept_charset_malformed() {
        let err = parse_accept_charset("utf-8, ascii;q=high").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::GrammarViolation);
    }
}
