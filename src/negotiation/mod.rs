//! Content negotiation module
//!
//! Parses the preference headers a client sends (Accept, Accept-Charset),
//! and picks the best representation the server can produce, or a typed
//! rejection. Everything here is pure and synchronous; values are immutable
//! once built.

pub mod accept;
mod broker;
mod charset;
mod error;
pub mod grammar;
mod mime;
mod negotiable;
mod params;
mod quality;

// Re-export commonly used types
pub use broker::{best_offer, closest_match, Broker, Endpoint, NegotiationRequest, Resource};
pub use charset::{CharacterSet, Codec};
pub use error::{DecodeError, EncodeError, NegotiationError, ParseError, ParseErrorKind};
pub use mime::{is_media_type, MimeType, MEDIA_TYPES};
pub use negotiable::Negotiable;
pub use params::{ParameterMap, QUALITY_KEY};
pub use quality::{InvalidQuality, Quality};
