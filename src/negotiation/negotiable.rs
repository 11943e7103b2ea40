//! Shared contract of every negotiable property

use super::params::ParameterMap;
use super::quality::Quality;

/// A value a client can request and a server can offer
pub trait Negotiable {
    fn parameters(&self) -> &ParameterMap;

    /// Client-assigned weight, 1 when no `q` parameter is present
    fn quality(&self) -> Quality {
        self.parameters().quality()
    }

    /// Whether `other`, chosen as the server's offer, satisfies this
    /// requested value
    fn contains(&self, other: &Self) -> bool;

    /// Strict partial order: whether this value is narrower than `other`
    fn more_specific_than(&self, other: &Self) -> bool;
}
