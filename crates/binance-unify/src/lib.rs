#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::match_same_arms
    )
)]

//! Normalization engine for Binance WebSocket payloads.
//!
//! Binance delivers market and account data in dozens of wire shapes with
//! single-letter field names that differ per endpoint. [`normalize`] converts
//! any such frame into one canonical record schema with spelled-out field
//! names, a `stream_type`/`event_type` pair, and a version tag identifying
//! the source exchange and the schema version that produced the record.
//!
//! Frames the engine does not decode (non-JSON text, JSON scalars, frames
//! from the chain endpoint) pass through unchanged, subscription
//! acknowledgements and error envelopes are tagged and returned undecoded,
//! and already-tagged records short-circuit, so the engine can safely sit
//! inline on a raw stream and be fed its own output.
//!
//! ```
//! use binance_unify::{Endpoint, Normalized, normalize};
//!
//! let frame = r#"{"stream": "btcusdt@aggTrade", "data": {
//!     "e": "aggTrade", "E": 1656000000000, "s": "BTCUSDT",
//!     "a": 12345, "p": "20000.00", "q": "0.5",
//!     "f": 100, "l": 105, "T": 1656000000000, "m": true, "M": true
//! }}"#;
//! let out = normalize(frame, Endpoint::Spot)?;
//! let record = out.as_value().ok_or("expected a record")?;
//! assert_eq!(record["symbol"], "BTCUSDT");
//! assert_eq!(record["price"], "20000.00");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod derivatives;
mod dispatch;
mod endpoint;
mod envelope;
mod error;
mod fields;
mod record;
mod spot;

pub mod release;

pub use dispatch::normalize;
pub use endpoint::{Endpoint, Family};
pub use error::{NormalizeError, ReleaseError};
pub use record::{Normalized, RawFrame, SCHEMA_VERSION, VERSION_TAG_KEY};
