//! Header value grammar
//!
//! Recognizes the two lexical forms a parameter value may take: the token of
//! RFC 2045 section 5.1 and the quoted-string of RFC 822 section 3.3.

/// Characters that may never appear inside a token.
const TSPECIALS: &[u8] = b"()<>@,;:\\\"/[]?=";

/// Check whether a single byte may appear inside a token
#[inline]
const fn is_token_byte(b: u8) -> bool {
    if b <= 0x20 || b >= 0x7f {
        return false;
    }
    let mut i = 0;
    while i < TSPECIALS.len() {
        if TSPECIALS[i] == b {
            return false;
        }
        i += 1;
    }
    true
}

/// Check whether `value` is a non-empty token
///
/// # Examples
/// ```
/// use conneg::negotiation::grammar::is_token;
/// assert!(is_token("utf-8"));
/// assert!(!is_token("b:ar"));
/// assert!(!is_token(""));
/// ```
pub fn is_token(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(is_token_byte)
}

/// Check whether `value`, delimiters included, is a quoted-string
///
/// Inside the quotes any ASCII character is allowed except `"` and `\`, a
/// carriage return must be followed by a line feed, and a backslash escapes
/// the ASCII character after it.
pub fn is_quoted_string(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'"' || bytes[bytes.len() - 1] != b'"' {
        return false;
    }

    let inner = &bytes[1..bytes.len() - 1];
    let mut i = 0;
    while i < inner.len() {
        match inner[i] {
            b'\\' => match inner.get(i + 1) {
                Some(next) if next.is_ascii() => i += 2,
                _ => return false,
            },
            b'\r' => match inner.get(i + 1) {
                Some(b'\n') => i += 2,
                _ => return false,
            },
            b'"' => return false,
            b if !b.is_ascii() => return false,
            _ => i += 1,
        }
    }
    true
}

/// Strip the quotes from a quoted-string and resolve its escape pairs
///
/// `None` when `value` is not wrapped in a pair of quotes. Escapes are
/// resolved without further checks; use [`is_quoted_string`] to validate.
///
/// # Examples
/// ```
/// use conneg::negotiation::grammar::unquote;
/// assert_eq!(unquote("\"a\\\"b\"").as_deref(), Some("a\"b"));
/// assert_eq!(unquote("\""), None);
/// ```
pub fn unquote(value: &str) -> Option<String> {
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Encode a parameter value for the wire
///
/// Token-safe values are emitted bare. Everything else is wrapped in quotes,
/// escaping `"`, `\` and any carriage return not followed by a line feed.
pub fn quote(value: &str) -> String {
    if is_token(value) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\r' if chars.peek() != Some(&'\n') => out.push_str("\\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Split a header value on `delimiter`, ignoring delimiters inside
/// quoted-strings
///
/// Segments are trimmed; empty segments are dropped.
pub fn split_outside_quotes(value: &str, delimiter: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (idx, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                segments.push(&value[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
