//! Frame classification and event dispatch.
//!
//! [`normalize`] is the single entry point: it parses the frame, reshapes the
//! envelope, applies the idempotency and control short-circuits, routes the
//! discriminator code through the family's canonicalizer table and tags the
//! result. Every outcome is a value; a [`NormalizeError`] means the frame
//! should have been decodable and was not.

use serde_json::Value;
use tracing::debug;

use crate::endpoint::{Endpoint, Family};
use crate::envelope::{self, Envelope};
use crate::error::NormalizeError;
use crate::record::{self, Normalized, RawFrame, VERSION_TAG_KEY};
use crate::{derivatives, fields, spot};

/// Normalize one frame received from `endpoint`.
///
/// Frames the engine does not decode come back as
/// [`Normalized::Passthrough`] unchanged; subscription acknowledgements and
/// error envelopes come back tagged as [`Normalized::Control`]; a frame that
/// already carries a version tag comes back as
/// [`Normalized::AlreadyNormalized`]. Only structurally broken frames of a
/// recognized shape produce an error.
pub fn normalize(
    frame: impl Into<RawFrame>,
    endpoint: Endpoint,
) -> Result<Normalized, NormalizeError> {
    let frame = frame.into();

    let Some(family) = endpoint.family() else {
        debug!(%endpoint, "endpoint has no canonicalizer table, passing frame through");
        return Ok(Normalized::Passthrough(frame));
    };

    let value = match frame {
        RawFrame::Json(value) => value,
        RawFrame::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(error) => {
                debug!(%endpoint, %error, "frame is not JSON, passing through");
                return Ok(Normalized::Passthrough(RawFrame::Text(text)));
            }
        },
    };

    if !value.is_object() && !value.is_array() {
        return Ok(Normalized::Passthrough(RawFrame::Json(value)));
    }

    let shaped = envelope::reshape(value, family);

    if let Some(obj) = shaped.as_object() {
        if obj.contains_key(VERSION_TAG_KEY) {
            return Ok(Normalized::AlreadyNormalized(shaped));
        }
        // Subscription acknowledgements carry a `result` key (commonly
        // null); its presence alone classifies the frame.
        if obj.contains_key("result") {
            debug!(%endpoint, "control message with result payload");
            return Ok(Normalized::Control(record::tag(shaped, endpoint)));
        }
        if obj.get("error").is_some_and(fields::is_truthy) {
            debug!(%endpoint, "control message with error payload");
            return Ok(Normalized::Control(record::tag(shaped, endpoint)));
        }
    }

    let env = Envelope::of(&shaped)?;
    let code = env.event_type()?;
    let rec = match family {
        Family::Spot => spot::canonicalize(&env, code)?,
        Family::Derivatives => derivatives::canonicalize(&env, code)?,
    };
    debug!(%endpoint, kind = code, "canonicalized frame");
    Ok(Normalized::Record(record::tag(Value::Object(rec), endpoint)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_endpoint_passes_through() {
        let out = normalize(r#"{"e": "aggTrade"}"#, Endpoint::Chain).unwrap();
        assert_eq!(
            out,
            Normalized::Passthrough(RawFrame::Text(r#"{"e": "aggTrade"}"#.to_owned()))
        );
    }

    #[test]
    fn non_json_text_passes_through() {
        let out = normalize("ping", Endpoint::Spot).unwrap();
        assert_eq!(out, Normalized::Passthrough(RawFrame::Text("ping".to_owned())));
    }

    #[test]
    fn json_scalar_passes_through() {
        let out = normalize(json!(42), Endpoint::Spot).unwrap();
        assert_eq!(out, Normalized::Passthrough(RawFrame::Json(json!(42))));
    }

    #[test]
    fn tagged_frame_short_circuits() {
        let frame = json!({"event_type": "aggTrade", "unicorn_fied": ["binance.com", "0.1.0"]});
        let out = normalize(frame.clone(), Endpoint::Spot).unwrap();
        assert_eq!(out, Normalized::AlreadyNormalized(frame));
    }

    #[test]
    fn null_result_is_a_control_message() {
        let out = normalize(json!({"result": null, "id": 1}), Endpoint::Spot).unwrap();
        match out {
            Normalized::Control(v) => {
                assert_eq!(v["id"], 1);
                assert_eq!(v[VERSION_TAG_KEY][0], "binance.com");
            }
            other => panic!("expected control, got {other:?}"),
        }
    }

    #[test]
    fn truthy_error_is_a_control_message() {
        let frame = json!({"error": {"code": 2, "msg": "Invalid request"}, "id": 1});
        let out = normalize(frame, Endpoint::Spot).unwrap();
        assert!(matches!(out, Normalized::Control(_)));
    }

    #[test]
    fn falsy_error_is_not_a_control_message() {
        let frame = json!({"error": null, "e": "balanceUpdate"});
        let err = normalize(frame, Endpoint::Spot).unwrap_err();
        // Classified as a decodable event, which then fails on fields.
        assert_eq!(
            err,
            NormalizeError::MissingField {
                kind: "balanceUpdate",
                field: "E"
            }
        );
    }

    #[test]
    fn unknown_code_is_explicit_for_both_families() {
        let frame = json!({"stream": "x@y", "data": {"e": "mysteryEvent"}});
        let err = normalize(frame.clone(), Endpoint::Spot).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::UnrecognizedEvent {
                family: Family::Spot,
                code: "mysteryEvent".to_owned()
            }
        );
        let err = normalize(frame, Endpoint::UsdFutures).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::UnrecognizedEvent {
                family: Family::Derivatives,
                ..
            }
        ));
    }

    #[test]
    fn missing_event_type_is_explicit() {
        let err = normalize(json!({"stream": "x@y", "data": {}}), Endpoint::Spot).unwrap_err();
        assert_eq!(err, NormalizeError::MissingEventType);
    }
}
