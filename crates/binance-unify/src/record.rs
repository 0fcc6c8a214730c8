//! Canonical record output types and the version tagger.

use serde_json::{Value, json};

use crate::endpoint::Endpoint;

/// Schema version written into every version tag; the crate version is a
/// process-wide constant.
pub const SCHEMA_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Key under which the `(exchange_id, schema_version)` tag is stored.
pub const VERSION_TAG_KEY: &str = "unicorn_fied";

/// A frame as it arrives from the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFrame {
    /// Opaque text, expected but not guaranteed to be JSON.
    Text(String),
    /// An already-parsed value.
    Json(Value),
}

impl From<&str> for RawFrame {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RawFrame {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for RawFrame {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Outcome of normalizing one frame.
///
/// Only [`Normalized::Record`] went through a canonicalizer; the other
/// variants are the documented short-circuits, none of which is an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// A canonical record (single or broadcast shape) carrying the
    /// version tag.
    Record(Value),
    /// A subscription acknowledgement or error envelope, tagged and
    /// returned without decoding.
    Control(Value),
    /// The input already carried a version tag and was returned unchanged.
    AlreadyNormalized(Value),
    /// Input the engine does not decode (non-JSON text, a JSON scalar, or
    /// a chain-endpoint frame), returned unchanged.
    Passthrough(RawFrame),
}

impl Normalized {
    /// The payload as a JSON value, when there is one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Record(v) | Self::Control(v) | Self::AlreadyNormalized(v) => Some(v),
            Self::Passthrough(RawFrame::Json(v)) => Some(v),
            Self::Passthrough(RawFrame::Text(_)) => None,
        }
    }

    /// Whether this outcome is a canonical record.
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

/// Append the version tag to a value leaving the engine.
///
/// Applied exactly once per top-level call; for broadcast records the tag
/// wraps the whole record, not each sub-record.
pub(crate) fn tag(mut value: Value, endpoint: Endpoint) -> Value {
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            VERSION_TAG_KEY.to_owned(),
            json!([endpoint.exchange_id(), SCHEMA_VERSION]),
        );
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_carries_exchange_and_version() {
        let tagged = tag(json!({"event_type": "aggTrade"}), Endpoint::Spot);
        assert_eq!(
            tagged[VERSION_TAG_KEY],
            json!(["binance.com", SCHEMA_VERSION])
        );
    }

    #[test]
    fn tag_uses_the_endpoint_literal() {
        let tagged = tag(json!({}), Endpoint::CoinFutures);
        assert_eq!(tagged[VERSION_TAG_KEY][0], "binance.com-coin_futures");
    }
}
