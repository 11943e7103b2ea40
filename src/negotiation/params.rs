//! Type parameters
//!
//! The `key=value` list trailing a media type or charset, as in
//! `text/html; level=1; q=0.7`. The `q` key is reserved for quality and is
//! left out of every comparison used for matching.

use std::fmt;

use super::error::ParseError;
use super::grammar::{is_quoted_string, is_token, quote, split_outside_quotes, unquote};
use super::quality::Quality;

/// Reserved quality key
pub const QUALITY_KEY: &str = "q";

/// Ordered parameter list with unique keys
///
/// Insertion order is kept so encoding is deterministic, but equality does
/// not depend on it.
#[derive(Debug, Clone, Default)]
pub struct ParameterMap {
    entries: Vec<(String, String)>,
}

impl ParameterMap {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a `;`-separated parameter list
    ///
    /// A leading `;` is allowed, empty segments are skipped. Each value must
    /// be a token (stored verbatim) or a quoted-string (stored unescaped).
    ///
    /// # Examples
    /// ```
    /// use conneg::negotiation::ParameterMap;
    ///
    /// let params = ParameterMap::parse("; foo=bar; q=0.5").unwrap();
    /// assert_eq!(params.get("foo"), Some("bar"));
    /// assert_eq!(params.len(), 1);
    /// assert!(ParameterMap::parse("foo=b:ar").is_err());
    /// ```
    pub fn parse(encoded: &str) -> Result<Self, ParseError> {
        let mut params = Self::new();

        for segment in split_outside_quotes(encoded, ';') {
            let Some((key, raw)) = segment.split_once('=') else {
                return Err(ParseError::MalformedParameter(segment.to_string()));
            };

            let value = if is_token(raw) {
                raw.to_string()
            } else {
                is_quoted_string(raw)
                    .then(|| unquote(raw))
                    .flatten()
                    .ok_or_else(|| ParseError::MalformedParameter(segment.to_string()))?
            };

            params.insert(key, value)?;
        }

        Ok(params)
    }

    /// Set `key` to `value`, returning the previous value
    ///
    /// Keys must be tokens and are stored lowercase. Values must be ASCII so
    /// they stay encodable; a `q` value must be a valid qvalue.
    pub fn insert(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<Option<String>, ParseError> {
        let value = value.into();
        if !is_token(key) {
            return Err(ParseError::MalformedParameter(format!(
                "invalid parameter name {key:?}"
            )));
        }
        if !value.is_ascii() {
            return Err(ParseError::MalformedParameter(format!(
                "non-ASCII value for {key:?}"
            )));
        }

        let key = key.to_ascii_lowercase();
        if key == QUALITY_KEY {
            value
                .parse::<Quality>()
                .map_err(|e| ParseError::MalformedParameter(e.to_string()))?;
        }

        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Ok(Some(std::mem::replace(&mut entry.1, value)));
        }
        self.entries.push((key, value));
        Ok(None)
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let key = key.to_ascii_lowercase();
        let idx = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of parameters, not counting `q`
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k != QUALITY_KEY)
            .count()
    }

    /// Whether there are no parameters besides `q`
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Quality weight, 1 when no `q` is present
    pub fn quality(&self) -> Quality {
        self.get(QUALITY_KEY)
            .and_then(|q| q.parse().ok())
            .unwrap_or_default()
    }

    /// Whether every non-quality parameter here appears in `other` with the
    /// same value
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.entries
            .iter()
            .filter(|(k, _)| k != QUALITY_KEY)
            .all(|(k, v)| other.get(k) == Some(v.as_str()))
    }

    /// Iterate over `(key, value)` pairs in insertion order, `q` included
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries sorted by key, the order-insensitive form used for equality
    pub(crate) fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable();
        entries
    }

    /// Encode entries as `k=v` joined by `separator`
    pub(crate) fn encode<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
        separator: &str,
    ) -> String {
        entries
            .into_iter()
            .map(|(k, v)| format!("{k}={}", quote(v)))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl PartialEq for ParameterMap {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl Eq for ParameterMap {}

impl fmt::Display for ParameterMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(self.iter(), "; "))
    }
}
