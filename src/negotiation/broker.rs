//! Negotiation broker
//!
//! Chooses, among what the server can produce, the option the client weighs
//! highest. The broker is configured once and then only read, so it can be
//! shared across any number of concurrent requests.

use hyper::body::Bytes;

use super::charset::CharacterSet;
use super::error::NegotiationError;
use super::mime::MimeType;
use super::negotiable::Negotiable;
use super::quality::Quality;

/// Per-method capabilities of a resource
pub trait Endpoint {
    /// Content types this endpoint can render its output as
    fn produces(&self) -> &[MimeType];
    /// Content types this endpoint can read its input from
    fn consumes(&self) -> &[MimeType];
}

/// Something addressable by the router that serves one or more methods
pub trait Resource {
    type Endpoint: Endpoint;

    /// Uppercase method names this resource serves
    fn allowed_methods(&self) -> &[String];

    /// Endpoint serving `method`, if implemented
    fn endpoint(&self, method: &str) -> Option<&Self::Endpoint>;
}

/// The parts of a request the broker negotiates over
pub trait NegotiationRequest {
    fn method(&self) -> &str;
    fn content_type(&self) -> Option<&MimeType>;
    fn content_length(&self) -> Option<u64>;
    /// `None` when the client sent no Accept header
    fn accept(&self) -> Option<&[MimeType]>;
    /// `None` when the client sent no Accept-Charset header
    fn accept_charset(&self) -> Option<&[CharacterSet]>;
    fn read_entity(&self) -> Bytes;
}

/// Find the requested value that decides the quality of `offer`
///
/// Among the requested values containing `offer`, the most specific one
/// wins (RFC 2616 section 14.1). Values not ordered by specificity are
/// decided by quality, and the first one seen wins a full tie. `None` when
/// no requested value contains `offer`.
pub fn closest_match<'a, N: Negotiable>(requested: &'a [N], offer: &N) -> Option<&'a N> {
    requested
        .iter()
        .filter(|candidate| candidate.contains(offer))
        .fold(None, |best, candidate| match best {
            None => Some(candidate),
            Some(current) if candidate.more_specific_than(current) => Some(candidate),
            Some(current)
                if !current.more_specific_than(candidate)
                    && candidate.quality() > current.quality() =>
            {
                Some(candidate)
            }
            keep => keep,
        })
}

/// Pick the offer the client assigns the highest quality
///
/// Offers no requested value contains are skipped, and so are offers whose
/// decisive quality is 0. On equal quality the more specific offer wins,
/// otherwise the earlier one. `None` when nothing is acceptable.
///
/// # Examples
/// ```
/// use conneg::negotiation::{best_offer, MimeType};
///
/// let requested = vec![
///     MimeType::parse("text/html;q=0.7").unwrap(),
///     MimeType::parse("application/json").unwrap(),
/// ];
/// let offered = vec![
///     MimeType::parse("text/html").unwrap(),
///     MimeType::parse("application/json").unwrap(),
/// ];
/// assert_eq!(best_offer(&requested, &offered), Some(&offered[1]));
/// ```
pub fn best_offer<'o, N: Negotiable>(requested: &[N], offered: &'o [N]) -> Option<&'o N> {
    let mut best: Option<(&'o N, Quality)> = None;

    for offer in offered {
        let Some(matched) = closest_match(requested, offer) else {
            continue;
        };
        let quality = matched.quality();
        if quality.is_zero() {
            continue;
        }

        let better = match best {
            None => true,
            Some((current, best_quality)) => {
                quality > best_quality
                    || (quality == best_quality && offer.more_specific_than(current))
            }
        };
        if better {
            best = Some((offer, quality));
        }
    }

    best.map(|(offer, _)| offer)
}

/// Server-side negotiation settings
#[derive(Debug, Clone)]
pub struct Broker {
    charsets: Vec<CharacterSet>,
    default_charset: CharacterSet,
    methods: Vec<String>,
    default_mimetype: MimeType,
}

impl Broker {
    /// Create a broker offering `charsets` and `methods`
    ///
    /// `default_charset` is used when the client expresses no charset
    /// preference, `default_mimetype` when it expresses no content type
    /// preference.
    pub const fn new(
        charsets: Vec<CharacterSet>,
        default_charset: CharacterSet,
        methods: Vec<String>,
        default_mimetype: MimeType,
    ) -> Self {
        Self {
            charsets,
            default_charset,
            methods,
            default_mimetype,
        }
    }

    pub fn charsets(&self) -> &[CharacterSet] {
        &self.charsets
    }

    pub const fn default_charset(&self) -> &CharacterSet {
        &self.default_charset
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub const fn default_mimetype(&self) -> &MimeType {
        &self.default_mimetype
    }

    /// Find the endpoint of `resource` serving `method`
    ///
    /// A method unknown to the server is unimplemented; a known method the
    /// resource does not list is not allowed (RFC 2616 section 5.1.1).
    pub fn negotiate_endpoint<'r, R: Resource>(
        &self,
        method: &str,
        resource: &'r R,
    ) -> Result<&'r R::Endpoint, NegotiationError> {
        if !self.methods.iter().any(|m| m == method) {
            return Err(NegotiationError::MethodUnimplemented {
                method: method.to_string(),
            });
        }

        if !resource.allowed_methods().iter().any(|m| m == method) {
            return Err(NegotiationError::MethodNotAllowed {
                method: method.to_string(),
                allowed: resource.allowed_methods().to_vec(),
            });
        }

        resource
            .endpoint(method)
            .ok_or_else(|| NegotiationError::HandlerMissing {
                method: method.to_string(),
            })
    }

    /// Choose the response charset
    ///
    /// No Accept-Charset header means any charset will do, which resolves to
    /// the default (RFC 2616 section 14.2).
    pub fn negotiate_charset(
        &self,
        accepted: Option<&[CharacterSet]>,
    ) -> Result<CharacterSet, NegotiationError> {
        let Some(accepted) = accepted else {
            return Ok(self.default_charset.clone());
        };

        best_offer(accepted, &self.charsets)
            .cloned()
            .ok_or(NegotiationError::NotAcceptable)
    }

    /// Choose the response content type among what `endpoint` produces
    ///
    /// No Accept header means any type will do, which resolves to the
    /// default (RFC 2616 section 14.1).
    pub fn negotiate_output<Q, E>(
        &self,
        request: &Q,
        endpoint: &E,
    ) -> Result<MimeType, NegotiationError>
    where
        Q: NegotiationRequest + ?Sized,
        E: Endpoint + ?Sized,
    {
        let Some(accepted) = request.accept() else {
            return Ok(self.default_mimetype.clone());
        };

        best_offer(accepted, endpoint.produces())
            .cloned()
            .ok_or(NegotiationError::NotAcceptable)
    }

    /// Check the request entity against what `endpoint` consumes
    ///
    /// Returns `None` when the request carries no entity, the raw entity
    /// otherwise (RFC 2616 section 10.4.16).
    pub fn negotiate_input<Q, E>(
        &self,
        request: &Q,
        endpoint: &E,
    ) -> Result<Option<Bytes>, NegotiationError>
    where
        Q: NegotiationRequest + ?Sized,
        E: Endpoint + ?Sized,
    {
        let (Some(content_type), Some(length)) = (request.content_type(), request.content_length())
        else {
            return Ok(None);
        };
        if length == 0 {
            return Ok(None);
        }

        if !endpoint.consumes().iter().any(|c| c.contains(content_type)) {
            return Err(NegotiationError::UnsupportedMediaType {
                content_type: content_type.clone(),
            });
        }

        Ok(Some(request.read_entity()))
    }
}
