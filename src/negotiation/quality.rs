//! Quality values
//!
//! Fixed-point representation of the `q` weight (RFC 7231 section 5.3.1).
//! A qvalue has at most three decimals, so thousandths represent every legal
//! value exactly.

use std::fmt;
use std::str::FromStr;

/// A client-assigned preference weight in `[0, 1]`, stored in thousandths
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u16);

impl Quality {
    /// Weight of a value that carries no `q` parameter
    pub const ONE: Self = Self(1000);
    /// "Not acceptable"
    pub const ZERO: Self = Self(0);

    /// Build a quality from thousandths, `None` when above 1000
    pub const fn from_millis(millis: u16) -> Option<Self> {
        if millis > 1000 {
            None
        } else {
            Some(Self(millis))
        }
    }

    /// Weight in thousandths
    pub const fn millis(self) -> u16 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::ONE
    }
}

/// Raised when a `q` value is not a qvalue
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quality value: {0:?}")]
pub struct InvalidQuality(pub String);

impl FromStr for Quality {
    type Err = InvalidQuality;

    /// Parse `qvalue = ( "0" [ "." 0*3DIGIT ] ) / ( "1" [ "." 0*3("0") ] )`
    ///
    /// # Examples
    /// ```
    /// use conneg::negotiation::Quality;
    /// assert_eq!("0.5".parse::<Quality>().unwrap().millis(), 500);
    /// assert_eq!("1".parse::<Quality>().unwrap(), Quality::ONE);
    /// assert!("1.5".parse::<Quality>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidQuality(s.to_string());

        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut millis: u16 = 0;
        for (i, digit) in fraction.bytes().enumerate() {
            let weight = [100, 10, 1][i];
            millis += u16::from(digit - b'0') * weight;
        }

        match whole {
            "0" => Ok(Self(millis)),
            "1" if millis == 0 => Ok(Self::ONE),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Quality {
    /// Shortest decimal form: `1`, `0`, `0.5`, `0.125`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1000 => f.write_str("1"),
            0 => f.write_str("0"),
            millis => {
                let digits = format!("{millis:03}");
                write!(f, "0.{}", digits.trim_end_matches('0'))
            }
        }
    }
}
