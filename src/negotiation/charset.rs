//! Character sets
//!
//! Charset names resolve to a canonical codec so aliases satisfy each other:
//! `ascii`, `us-ascii` and `iso-ir-6` all name the same codec.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::error::{DecodeError, EncodeError, ParseError};
use super::grammar::is_token;
use super::negotiable::Negotiable;
use super::params::{ParameterMap, QUALITY_KEY};
use super::quality::Quality;

/// Canonical codec identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Ascii,
    Latin1,
    Utf8,
    Utf16,
    Utf16Le,
    Utf16Be,
    Utf32,
    Utf32Le,
    Utf32Be,
}

/// Normalized alias → codec
const ALIASES: &[(&str, Codec)] = &[
    ("ascii", Codec::Ascii),
    ("646", Codec::Ascii),
    ("ansi_x3.4_1968", Codec::Ascii),
    ("ansi_x3_4_1968", Codec::Ascii),
    ("ansi_x3.4_1986", Codec::Ascii),
    ("cp367", Codec::Ascii),
    ("csascii", Codec::Ascii),
    ("ibm367", Codec::Ascii),
    ("iso646_us", Codec::Ascii),
    ("iso_646.irv_1991", Codec::Ascii),
    ("iso_ir_6", Codec::Ascii),
    ("us", Codec::Ascii),
    ("us_ascii", Codec::Ascii),
    ("latin_1", Codec::Latin1),
    ("8859", Codec::Latin1),
    ("cp819", Codec::Latin1),
    ("csisolatin1", Codec::Latin1),
    ("ibm819", Codec::Latin1),
    ("iso8859", Codec::Latin1),
    ("iso8859_1", Codec::Latin1),
    ("iso_8859_1", Codec::Latin1),
    ("iso_8859_1_1987", Codec::Latin1),
    ("iso_ir_100", Codec::Latin1),
    ("l1", Codec::Latin1),
    ("latin", Codec::Latin1),
    ("latin1", Codec::Latin1),
    ("utf_8", Codec::Utf8),
    ("u8", Codec::Utf8),
    ("utf", Codec::Utf8),
    ("utf8", Codec::Utf8),
    ("utf8_ucs2", Codec::Utf8),
    ("utf8_ucs4", Codec::Utf8),
    ("cp65001", Codec::Utf8),
    ("utf_16", Codec::Utf16),
    ("u16", Codec::Utf16),
    ("utf16", Codec::Utf16),
    ("utf_16_le", Codec::Utf16Le),
    ("utf_16le", Codec::Utf16Le),
    ("unicodelittleunmarked", Codec::Utf16Le),
    ("utf_16_be", Codec::Utf16Be),
    ("utf_16be", Codec::Utf16Be),
    ("unicodebigunmarked", Codec::Utf16Be),
    ("utf_32", Codec::Utf32),
    ("u32", Codec::Utf32),
    ("utf32", Codec::Utf32),
    ("utf_32_le", Codec::Utf32Le),
    ("utf_32le", Codec::Utf32Le),
    ("utf_32_be", Codec::Utf32Be),
    ("utf_32be", Codec::Utf32Be),
];

/// Lowercase and collapse every run of punctuation other than `.` into `_`
fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_separator = false;
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

impl Codec {
    /// Resolve a charset label, `None` when it is not known
    ///
    /// # Examples
    /// ```
    /// use conneg::negotiation::Codec;
    ///
    /// assert_eq!(Codec::lookup("US-ASCII"), Some(Codec::Ascii));
    /// assert_eq!(Codec::lookup("iso-ir-6"), Some(Codec::Ascii));
    /// assert_eq!(Codec::lookup("unknown-charset"), None);
    /// ```
    pub fn lookup(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, codec)| *codec)
    }

    /// Canonical name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Latin1 => "iso8859-1",
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Utf16Le => "utf-16-le",
            Self::Utf16Be => "utf-16-be",
            Self::Utf32 => "utf-32",
            Self::Utf32Le => "utf-32-le",
            Self::Utf32Be => "utf-32-be",
        }
    }

    /// Encode `text` in this codec
    ///
    /// `utf-16` and `utf-32` start with a byte-order mark and use
    /// little-endian code units.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::Ascii => encode_single_byte(self, text, 0x7f),
            Self::Latin1 => encode_single_byte(self, text, 0xff),
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Utf16 => {
                let mut out = vec![0xff, 0xfe];
                out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                Ok(out)
            }
            Self::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Self::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Self::Utf32 => {
                let mut out = vec![0xff, 0xfe, 0x00, 0x00];
                out.extend(text.chars().flat_map(|c| u32::from(c).to_le_bytes()));
                Ok(out)
            }
            Self::Utf32Le => Ok(text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect()),
            Self::Utf32Be => Ok(text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect()),
        }
    }

    /// Decode `bytes` from this codec
    ///
    /// `utf-16` and `utf-32` honor a leading byte-order mark and read
    /// little-endian code units without one.
    ///
    /// # Examples
    /// ```
    /// use conneg::negotiation::Codec;
    ///
    /// assert_eq!(Codec::Latin1.decode(b"caf\xe9").unwrap(), "caf\u{e9}");
    /// assert!(Codec::Ascii.decode(b"caf\xe9").is_err());
    /// ```
    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        let invalid = || DecodeError { codec: self.name() };
        match self {
            Self::Ascii => bytes
                .iter()
                .map(|b| b.is_ascii().then_some(char::from(*b)))
                .collect::<Option<String>>()
                .ok_or_else(invalid),
            Self::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| invalid()),
            Self::Utf16 => match bytes {
                [0xfe, 0xff, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
                [0xff, 0xfe, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
                _ => decode_utf16(bytes, u16::from_le_bytes),
            }
            .ok_or_else(invalid),
            Self::Utf16Le => decode_utf16(bytes, u16::from_le_bytes).ok_or_else(invalid),
            Self::Utf16Be => decode_utf16(bytes, u16::from_be_bytes).ok_or_else(invalid),
            Self::Utf32 => match bytes {
                [0x00, 0x00, 0xfe, 0xff, rest @ ..] => decode_utf32(rest, u32::from_be_bytes),
                [0xff, 0xfe, 0x00, 0x00, rest @ ..] => decode_utf32(rest, u32::from_le_bytes),
                _ => decode_utf32(bytes, u32::from_le_bytes),
            }
            .ok_or_else(invalid),
            Self::Utf32Le => decode_utf32(bytes, u32::from_le_bytes).ok_or_else(invalid),
            Self::Utf32Be => decode_utf32(bytes, u32::from_be_bytes).ok_or_else(invalid),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    let chunks = bytes.chunks_exact(2);
    if !chunks.remainder().is_empty() {
        return None;
    }
    char::decode_utf16(chunks.map(|pair| unit([pair[0], pair[1]])))
        .collect::<Result<String, _>>()
        .ok()
}

fn decode_utf32(bytes: &[u8], unit: fn([u8; 4]) -> u32) -> Option<String> {
    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        return None;
    }
    chunks
        .map(|quad| char::from_u32(unit([quad[0], quad[1], quad[2], quad[3]])))
        .collect()
}

fn encode_single_byte(codec: Codec, text: &str, max: u32) -> Result<Vec<u8>, EncodeError> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c))
                .ok()
                .filter(|b| u32::from(*b) <= max)
                .ok_or(EncodeError {
                    codec: codec.name(),
                    character: c,
                })
        })
        .collect()
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A character set with an optional quality weight
#[derive(Debug, Clone)]
pub struct CharacterSet {
    codec: Codec,
    parameters: ParameterMap,
}

impl CharacterSet {
    /// Resolve `name` to a character set of quality 1
    pub fn new(name: &str) -> Result<Self, ParseError> {
        let codec =
            Codec::lookup(name).ok_or_else(|| ParseError::UnknownCharset(name.to_string()))?;
        Ok(Self {
            codec,
            parameters: ParameterMap::new(),
        })
    }

    /// Resolve `name` to a character set of the given quality
    pub fn with_quality(name: &str, quality: Quality) -> Result<Self, ParseError> {
        let mut charset = Self::new(name)?;
        charset
            .parameters
            .insert(QUALITY_KEY, quality.to_string())?;
        Ok(charset)
    }

    /// Parse `name[;q=value]` (RFC 2616 section 14.2)
    ///
    /// A name that is not a token is a parse failure; only the `q` parameter
    /// is accepted after it.
    ///
    /// # Examples
    /// ```
    /// use conneg::negotiation::{CharacterSet, Negotiable, ParseErrorKind};
    ///
    /// let parsed = CharacterSet::parse("utf-8; q=0.5").unwrap();
    /// assert_eq!(parsed.name(), "utf-8");
    /// assert_eq!(parsed.quality().to_string(), "0.5");
    ///
    /// let unknown = CharacterSet::parse("unknown-charset").unwrap_err();
    /// assert_eq!(unknown.kind(), ParseErrorKind::CharsetUnknown);
    /// let malformed = CharacterSet::parse("@no such charset@; q=0.1").unwrap_err();
    /// assert_eq!(malformed.kind(), ParseErrorKind::ParseFailure);
    /// ```
    pub fn parse(encoded: &str) -> Result<Self, ParseError> {
        let (name, params) = match encoded.split_once(';') {
            Some((name, params)) => (name.trim(), Some(params)),
            None => (encoded.trim(), None),
        };
        if !is_token(name) {
            return Err(ParseError::Unparseable(encoded.to_string()));
        }

        let parameters = match params {
            Some(params) => ParameterMap::parse(params)?,
            None => ParameterMap::new(),
        };
        if let Some((key, _)) = parameters.iter().find(|(k, _)| *k != QUALITY_KEY) {
            return Err(ParseError::MalformedParameter(format!(
                "unexpected charset parameter {key:?}"
            )));
        }

        let mut charset = Self::new(name)?;
        charset.parameters = parameters;
        Ok(charset)
    }

    pub const fn codec(&self) -> Codec {
        self.codec
    }

    /// Canonical codec name
    pub const fn name(&self) -> &'static str {
        self.codec.name()
    }
}

impl Negotiable for CharacterSet {
    fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    /// Same codec, so aliases satisfy one another
    fn contains(&self, other: &Self) -> bool {
        self.codec == other.codec
    }

    /// Charsets name exact codecs; none is narrower than another
    fn more_specific_than(&self, _other: &Self) -> bool {
        false
    }
}

impl FromStr for CharacterSet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if let Some(q) = self.parameters.get(QUALITY_KEY) {
            write!(f, "; q={q}")?;
        }
        Ok(())
    }
}

impl PartialEq for CharacterSet {
    fn eq(&self, other: &Self) -> bool {
        self.codec == other.codec && self.quality() == other.quality()
    }
}

impl Eq for CharacterSet {}

impl Hash for CharacterSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.codec.hash(state);
        self.quality().hash(state);
    }
}

impl PartialOrd for CharacterSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CharacterSet {
    /// Alphabetical by canonical name; says nothing about satisfaction
    fn cmp(&self, other: &Self) -> Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| self.quality().cmp(&other.quality()))
    }
}
