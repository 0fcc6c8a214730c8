//! Envelope normalization.
//!
//! Binance delivers frames in several wire shapes: a bare array broadcast
//! (all-symbols tickers on a raw stream), a combined-stream wrapper
//! (`{stream, data}`), a bare single event (user-data and some futures
//! events), and partial depth snapshots whose level is encoded only in the
//! stream name. [`reshape`] rewrites all of them into one uniform
//! `{ stream?, data, items? }` shape so the dispatcher only ever sees an
//! [`Envelope`]. Each rule is a structural rewrite guarded by the presence
//! of its shape; a frame matching none of them passes through unmodified.

use serde_json::{Map, Value, json};

use crate::endpoint::Family;
use crate::error::NormalizeError;
use crate::fields::{self, FieldSpec};

/// Discriminator codes delivered as a bare JSON array over wildcard streams.
const ARRAY_BROADCAST_CODES: [&str; 4] = [
    "24hrMiniTicker",
    "24hrTicker",
    "markPriceUpdate",
    "indexPriceUpdate",
];

/// Combined-stream names whose `data` is an array of broadcast events,
/// with the discriminator code each implies.
const STREAM_BROADCAST_CODES: [(&str, &str); 3] = [
    ("!ticker@arr", "24hrTicker"),
    ("!miniTicker@arr", "24hrMiniTicker"),
    ("!markPriceUpdate@arr", "markPriceUpdate"),
];

/// Codes delivered as a bare single event without a combined-stream wrapper.
const BARE_EVENT_CODES: [&str; 11] = [
    "outboundAccountInfo",
    "executionReport",
    "outboundAccountPosition",
    "listStatus",
    "balanceUpdate",
    "bookTicker",
    "forceOrder",
    "ORDER_TRADE_UPDATE",
    "ACCOUNT_UPDATE",
    "ACCOUNT_CONFIG_UPDATE",
    "MARGIN_CALL",
];

/// Rewrite a parsed frame into the uniform envelope shape.
///
/// Rules are applied in order and later rules operate on the rewritten
/// value. Only the depth-level rule is family-dependent: spot partial-depth
/// payloads carry no discriminator of their own, so the `depth` code is
/// forced in; futures partial-depth payloads already carry `depthUpdate`.
pub(crate) fn reshape(mut value: Value, family: Family) -> Value {
    // Bare array broadcast.
    if let Some(code) = bare_array_code(&value) {
        value = json!({ "data": { "e": code }, "items": value });
    }

    // Combined-stream wrapper around a broadcast array.
    if let Some(code) = stream_broadcast_code(&value) {
        let items = value
            .get_mut("data")
            .map_or(Value::Null, Value::take);
        value = json!({ "data": { "e": code }, "items": items });
    }

    // Bare single event.
    if value
        .get("e")
        .and_then(Value::as_str)
        .is_some_and(|code| BARE_EVENT_CODES.contains(&code))
    {
        value = json!({ "data": value });
    }

    // Depth level and bookTicker are encoded only in the stream name.
    if let Some(stream) = value.get("stream").and_then(Value::as_str) {
        let depth_level = if stream.contains("@depth5") {
            Some(5)
        } else if stream.contains("@depth10") {
            Some(10)
        } else if stream.contains("@depth20") {
            Some(20)
        } else {
            None
        };
        let book_ticker = stream.contains("@bookTicker");
        if let Some(data) = value.get_mut("data").and_then(Value::as_object_mut) {
            if let Some(level) = depth_level {
                data.insert("depth_level".to_owned(), json!(level));
                if family == Family::Spot {
                    data.insert("e".to_owned(), json!("depth"));
                }
            } else if book_ticker {
                data.insert("e".to_owned(), json!("bookTicker"));
            }
        }
    }

    value
}

fn bare_array_code(value: &Value) -> Option<String> {
    value
        .as_array()?
        .first()?
        .get("e")?
        .as_str()
        .filter(|code| ARRAY_BROADCAST_CODES.contains(code))
        .map(ToOwned::to_owned)
}

fn stream_broadcast_code(value: &Value) -> Option<&'static str> {
    let stream = value.get("stream")?.as_str()?;
    STREAM_BROADCAST_CODES
        .iter()
        .find(|(name, _)| stream.contains(name))
        .map(|(_, code)| *code)
}

/// Borrowed view over a reshaped frame.
///
/// Invariant: exactly one of "single event" (`data` populated, no `items`)
/// or "broadcast" (`items` populated) holds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Envelope<'a> {
    /// Combined-stream name, when the frame carried one.
    pub stream: Option<&'a str>,
    /// The event object (or the synthetic `{ "e": code }` for broadcasts).
    pub data: &'a Map<String, Value>,
    /// Per-symbol event list for broadcast frames.
    pub items: Option<&'a Vec<Value>>,
}

impl<'a> Envelope<'a> {
    /// Build the view, failing when the frame has no event object at all.
    pub(crate) fn of(value: &'a Value) -> Result<Self, NormalizeError> {
        let data = value
            .get("data")
            .and_then(Value::as_object)
            .ok_or(NormalizeError::MissingEventType)?;
        Ok(Self {
            stream: value.get("stream").and_then(Value::as_str),
            data,
            items: value.get("items").and_then(Value::as_array),
        })
    }

    /// The event-type discriminator code.
    pub(crate) fn event_type(&self) -> Result<&'a str, NormalizeError> {
        self.data
            .get("e")
            .and_then(Value::as_str)
            .ok_or(NormalizeError::MissingEventType)
    }

    /// The stream name, required by canonicalizers that derive fields
    /// from it.
    pub(crate) fn stream(&self, kind: &'static str) -> Result<&'a str, NormalizeError> {
        self.stream.ok_or(NormalizeError::MissingField {
            kind,
            field: "stream",
        })
    }
}

/// Canonicalize a broadcast event into the uniform dual-shape output:
/// one sub-record per item when `items` is present, otherwise a single
/// sub-record from `data`, either way nested under a `data` list.
pub(crate) fn broadcast(
    kind: &'static str,
    env: &Envelope<'_>,
    default_stream: &str,
    specs: &[FieldSpec],
) -> Result<Map<String, Value>, NormalizeError> {
    let stream = env.stream.unwrap_or(default_stream);

    let mut record = Map::new();
    record.insert("stream_type".to_owned(), json!(stream));
    fields::apply(
        kind,
        env.data,
        &[FieldSpec::req("event_type", "e")],
        &mut record,
    )?;

    let mut sub_records = Vec::new();
    if let Some(items) = env.items {
        for item in items {
            let obj = item
                .as_object()
                .ok_or(NormalizeError::MissingField { kind, field: "e" })?;
            let mut sub = Map::new();
            sub.insert("stream_type".to_owned(), json!(stream));
            fields::apply(kind, obj, specs, &mut sub)?;
            sub_records.push(Value::Object(sub));
        }
    } else {
        let mut sub = Map::new();
        sub.insert("stream_type".to_owned(), json!(stream));
        fields::apply(kind, env.data, specs, &mut sub)?;
        sub_records.push(Value::Object(sub));
    }
    record.insert("data".to_owned(), Value::Array(sub_records));
    Ok(record)
}
