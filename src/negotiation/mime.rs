//! MIME types
//!
//! A `type/subtype` pair plus parameters (RFC 2045 section 5.1), used both
//! for concrete content types and for the media ranges of an Accept header.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::error::ParseError;
use super::grammar::is_token;
use super::negotiable::Negotiable;
use super::params::{ParameterMap, QUALITY_KEY};

/// Top-level media types registered with IANA
pub const MEDIA_TYPES: [&str; 9] = [
    "application",
    "audio",
    "example",
    "image",
    "message",
    "model",
    "multipart",
    "text",
    "video",
];

const WILDCARD: &str = "*";

/// Check whether `value` is a registered media type, an `x-` extension or
/// the wildcard
pub fn is_media_type(value: &str) -> bool {
    value == WILDCARD
        || MEDIA_TYPES.contains(&value)
        || value.to_ascii_lowercase().starts_with("x-")
}

/// An immutable, validated MIME type
#[derive(Debug, Clone)]
pub struct MimeType {
    type_: String,
    subtype: String,
    parameters: ParameterMap,
}

impl MimeType {
    /// Create a MIME type without parameters
    ///
    /// # Examples
    /// ```
    /// use conneg::negotiation::MimeType;
    ///
    /// let html = MimeType::new("text", "html").unwrap();
    /// assert_eq!(html.to_string(), "text/html");
    /// assert!(MimeType::new("*", "html").is_err());
    /// assert!(MimeType::new("test", "html").is_err());
    /// ```
    pub fn new(type_: &str, subtype: &str) -> Result<Self, ParseError> {
        Self::with_parameters(type_, subtype, ParameterMap::new())
    }

    /// Create a MIME type with the given parameters
    ///
    /// Type and subtype must be tokens and are stored lowercase. The type
    /// must pass [`is_media_type`], and a wildcard type requires a wildcard
    /// subtype.
    pub fn with_parameters(
        type_: &str,
        subtype: &str,
        parameters: ParameterMap,
    ) -> Result<Self, ParseError> {
        if !is_token(type_) {
            return Err(ParseError::InvalidType(format!("invalid type token {type_:?}")));
        }
        if !is_token(subtype) {
            return Err(ParseError::InvalidType(format!(
                "invalid subtype token {subtype:?}"
            )));
        }

        let type_ = type_.to_ascii_lowercase();
        let subtype = subtype.to_ascii_lowercase();

        if !is_media_type(&type_) {
            return Err(ParseError::InvalidType(format!("unknown media type {type_:?}")));
        }
        if type_ == WILDCARD && subtype != WILDCARD {
            return Err(ParseError::InvalidType(format!(
                "type wildcard without subtype wildcard in {type_}/{subtype}"
            )));
        }

        Ok(Self {
            type_,
            subtype,
            parameters,
        })
    }

    /// Parse `type/subtype[;key=value]*`
    ///
    /// A missing `/` or an empty type or subtype is a parse failure; the
    /// pieces are then validated as in [`MimeType::with_parameters`].
    ///
    /// # Examples
    /// ```
    /// use conneg::negotiation::{MimeType, Negotiable, ParseErrorKind};
    ///
    /// let parsed = MimeType::parse("text/plain; q=0.5").unwrap();
    /// assert_eq!(parsed.subtype(), "plain");
    /// assert_eq!(parsed.quality().to_string(), "0.5");
    ///
    /// let err = MimeType::parse("textplain").unwrap_err();
    /// assert_eq!(err.kind(), ParseErrorKind::ParseFailure);
    /// ```
    pub fn parse(encoded: &str) -> Result<Self, ParseError> {
        let unparseable = || ParseError::Unparseable(encoded.to_string());

        let (essence, params) = match encoded.split_once(';') {
            Some((essence, params)) => (essence, Some(params)),
            None => (encoded, None),
        };
        let (type_, subtype) = essence.trim().split_once('/').ok_or_else(unparseable)?;
        if type_.is_empty() || subtype.is_empty() {
            return Err(unparseable());
        }

        let parameters = match params {
            Some(params) => ParameterMap::parse(params)?,
            None => ParameterMap::new(),
        };
        Self::with_parameters(type_, subtype, parameters)
    }

    /// Return a copy with `key` set to `value`
    pub fn with_parameter(&self, key: &str, value: &str) -> Result<Self, ParseError> {
        let mut copy = self.clone();
        copy.parameters.insert(key, value)?;
        Ok(copy)
    }

    /// Return a copy without the quality parameter
    pub fn without_quality(&self) -> Self {
        let mut copy = self.clone();
        copy.parameters.remove(QUALITY_KEY);
        copy
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// `type/subtype` without parameters
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Whether type or subtype is `*`
    pub fn is_range(&self) -> bool {
        self.type_ == WILDCARD || self.subtype == WILDCARD
    }

    /// 0 for `*/*`, 1 for `type/*`, 2 for a concrete type
    fn wildcard_rank(&self) -> u8 {
        u8::from(self.type_ != WILDCARD) + u8::from(self.subtype != WILDCARD)
    }

    /// Canonical form: parameters sorted by key, quality included
    fn canonical(&self) -> String {
        let mut out = self.essence();
        let sorted = self.parameters.sorted();
        if !sorted.is_empty() {
            out.push_str("; ");
            out.push_str(&ParameterMap::encode(sorted, "; "));
        }
        out
    }
}

impl Negotiable for MimeType {
    fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    /// Whether `other`, if produced by the server, satisfies this requested
    /// type
    ///
    /// `*/*` accepts everything and `type/*` every subtype of `type`. For an
    /// exact type the parameters here, quality aside, must all be present in
    /// `other` (RFC 2616 section 14.1 example).
    fn contains(&self, other: &Self) -> bool {
        if self.type_ == WILDCARD {
            return true;
        }
        if self.type_ != other.type_ {
            return false;
        }
        if self.subtype == WILDCARD {
            return true;
        }
        if self.subtype != other.subtype {
            return false;
        }
        self.parameters.is_subset_of(&other.parameters)
    }

    /// Concrete beats wildcard; otherwise more parameters wins. Equal
    /// parameter counts are not ordered.
    fn more_specific_than(&self, other: &Self) -> bool {
        let (ours, theirs) = (self.wildcard_rank(), other.wildcard_rank());
        if ours != theirs {
            return ours > theirs;
        }
        self.parameters.len() > other.parameters.len()
    }
}

impl FromStr for MimeType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MimeType {
    /// Wire form with parameters in insertion order, quality included
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        if self.parameters.iter().next().is_some() {
            write!(f, "; {}", self.parameters)?;
        }
        Ok(())
    }
}

impl PartialEq for MimeType {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for MimeType {}

impl Hash for MimeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::error::ParseErrorKind;
    use crate::negotiation::quality::Quality;
    use rstest::rstest;
    use std::collections::HashSet;

    fn mime(s: &str) -> MimeType {
        MimeType::parse(s).unwrap()
    }

    #[test]
    fn test_type_wildcard() {
        let parsed = mime("*/*");
        assert_eq!((parsed.type_(), parsed.subtype()), ("*", "*"));
        assert!(parsed.is_range());
    }

    #[test]
    fn test_subtype_wildcard() {
        let parsed = mime("text/*");
        assert_eq!((parsed.type_(), parsed.subtype()), ("text", "*"));
    }

    #[test]
    fn test_extended_type() {
        let parsed = mime("x-test/test");
        assert_eq!((parsed.type_(), parsed.subtype()), ("x-test", "test"));
    }

    #[rstest]
    #[case("*/test", ParseErrorKind::InvalidType)]
    #[case("test/*", ParseErrorKind::InvalidType)]
    #[case("a>b/c", ParseErrorKind::InvalidType)]
    #[case("text/b[c", ParseErrorKind::InvalidType)]
    #[case("text/html/extra", ParseErrorKind::InvalidType)]
    #[case("texthtml", ParseErrorKind::ParseFailure)]
    #[case("/html", ParseErrorKind::ParseFailure)]
    #[case("text/", ParseErrorKind::ParseFailure)]
    #[case("", ParseErrorKind::ParseFailure)]
    #[case("text/html; foo=b:ar", ParseErrorKind::GrammarViolation)]
    #[case("text/html; q=2", ParseErrorKind::GrammarViolation)]
    fn test_rejected(#[case] input: &str, #[case] kind: ParseErrorKind) {
        let err = MimeType::parse(input).unwrap_err();
        assert_eq!(err.kind(), kind, "input: {input:?}, error: {err}");
    }

    #[test]
    fn test_quality() {
        let parsed = mime("text/plain; q=0.5");
        assert_eq!(parsed.quality(), Quality::from_millis(500).unwrap());
        assert_eq!(mime("text/plain").quality(), Quality::ONE);
    }

    #[test]
    fn test_case_normalized() {
        let parsed = mime("Text/HTML; Level=1");
        assert_eq!(parsed.to_string(), "text/html; level=1");
    }

    #[test]
    fn test_encode() {
        let mut params = ParameterMap::new();
        params.insert("level", "1").unwrap();
        params.insert("foo", "bar").unwrap();
        let mimetype = MimeType::with_parameters("text", "plain", params).unwrap();
        assert_eq!(mimetype.to_string(), "text/plain; level=1; foo=bar");
        assert_eq!(mime(&mimetype.to_string()), mimetype);
    }

    #[test]
    fn test_equality_and_hash_ignore_parameter_order() {
        let a = mime("text/html; level=1; foo=bar");
        let b = mime("text/html;foo=bar;level=1");
        assert_eq!(a, b);

        let set: HashSet<MimeType> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);

        assert_ne!(mime("text/html; q=0.5"), mime("text/html"));
    }

    #[test]
    fn test_with_parameter() {
        let base = mime("text/html; q=0.7");
        let synthesized = base.without_quality().with_parameter("charset", "utf-8").unwrap();
        assert_eq!(synthesized.to_string(), "text/html; charset=utf-8");
        assert_eq!(base.to_string(), "text/html; q=0.7");
    }
}
