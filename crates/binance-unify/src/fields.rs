//! Field mapper primitives.
//!
//! Canonicalizers are declarative tables of [`FieldSpec`] rows, each mapping
//! one short wire key to its canonical output name. The evaluator copies
//! values without interpreting them (Binance sends decimal values as strings
//! and they stay strings), fails explicitly on absent required keys, and
//! applies the declared default for optional ones instead of relying on
//! lookup errors for control flow.

use serde_json::{Map, Value};

use crate::error::NormalizeError;

/// How a missing source key is handled during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Presence {
    /// Absence fails the record with [`NormalizeError::MissingField`].
    Required,
    /// Absence skips the output field entirely; presence, not value,
    /// governs inclusion.
    Optional,
    /// Absence writes a literal `false`. The exchange omits these keys on
    /// the first interval of a session.
    DefaultFalse,
}

/// One `(output_name, source_key, presence)` row of a canonicalizer table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec {
    /// Canonical output name.
    pub out: &'static str,
    /// Short wire key.
    pub src: &'static str,
    /// Missing-key policy.
    pub presence: Presence,
}

impl FieldSpec {
    /// Row for a field that must be present.
    pub(crate) const fn req(out: &'static str, src: &'static str) -> Self {
        Self {
            out,
            src,
            presence: Presence::Required,
        }
    }

    /// Row for a field included only when the source key exists.
    pub(crate) const fn opt(out: &'static str, src: &'static str) -> Self {
        Self {
            out,
            src,
            presence: Presence::Optional,
        }
    }

    /// Row for a field defaulting to `false` when absent.
    pub(crate) const fn or_false(out: &'static str, src: &'static str) -> Self {
        Self {
            out,
            src,
            presence: Presence::DefaultFalse,
        }
    }
}

/// Evaluate a descriptor table against `source`, writing into `out`.
pub(crate) fn apply(
    kind: &'static str,
    source: &Map<String, Value>,
    specs: &[FieldSpec],
    out: &mut Map<String, Value>,
) -> Result<(), NormalizeError> {
    for spec in specs {
        match source.get(spec.src) {
            Some(value) => {
                out.insert(spec.out.to_owned(), value.clone());
            }
            None => match spec.presence {
                Presence::Required => {
                    return Err(NormalizeError::MissingField {
                        kind,
                        field: spec.src,
                    });
                }
                Presence::Optional => {}
                Presence::DefaultFalse => {
                    out.insert(spec.out.to_owned(), Value::Bool(false));
                }
            },
        }
    }
    Ok(())
}

/// Fetch a required value from a source object.
pub(crate) fn required<'a>(
    kind: &'static str,
    source: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Value, NormalizeError> {
    source
        .get(key)
        .ok_or(NormalizeError::MissingField { kind, field: key })
}

/// Fetch a required nested object from a source object.
pub(crate) fn object<'a>(
    kind: &'static str,
    source: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Map<String, Value>, NormalizeError> {
    required(kind, source, key)?
        .as_object()
        .ok_or(NormalizeError::MissingField { kind, field: key })
}

/// Fetch a required array from a source object.
pub(crate) fn array<'a>(
    kind: &'static str,
    source: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Vec<Value>, NormalizeError> {
    required(kind, source, key)?
        .as_array()
        .ok_or(NormalizeError::MissingField { kind, field: key })
}

/// Fetch a required string from a source object.
pub(crate) fn string<'a>(
    kind: &'static str,
    source: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, NormalizeError> {
    required(kind, source, key)?
        .as_str()
        .ok_or(NormalizeError::MissingField { kind, field: key })
}

/// Map every element of a required source list through a descriptor table.
pub(crate) fn map_list(
    kind: &'static str,
    source: &Map<String, Value>,
    key: &'static str,
    specs: &[FieldSpec],
) -> Result<Vec<Value>, NormalizeError> {
    let mut out = Vec::new();
    for item in array(kind, source, key)? {
        let obj = item
            .as_object()
            .ok_or(NormalizeError::MissingField { kind, field: key })?;
        let mut mapped = Map::new();
        apply(kind, obj, specs, &mut mapped)?;
        out.push(Value::Object(mapped));
    }
    Ok(out)
}

/// Truthiness in the sense the wire protocol uses it: an `error` key holding
/// `null`, `false`, `0`, an empty string or an empty container does not
/// signal an error envelope.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> Map<String, Value> {
        json!({"e": "aggTrade", "p": "1.0", "m": true})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn required_field_present() {
        let mut out = Map::new();
        apply(
            "aggTrade",
            &source(),
            &[FieldSpec::req("price", "p")],
            &mut out,
        )
        .unwrap();
        assert_eq!(out["price"], json!("1.0"));
    }

    #[test]
    fn required_field_missing_is_explicit() {
        let mut out = Map::new();
        let err = apply(
            "aggTrade",
            &source(),
            &[FieldSpec::req("quantity", "q")],
            &mut out,
        )
        .unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                kind: "aggTrade",
                field: "q"
            }
        );
    }

    #[test]
    fn optional_field_missing_is_skipped() {
        let mut out = Map::new();
        apply("kline", &source(), &[FieldSpec::opt("pair", "ps")], &mut out).unwrap();
        assert!(!out.contains_key("pair"));
    }

    #[test]
    fn defaulted_field_missing_becomes_false() {
        let mut out = Map::new();
        apply(
            "kline",
            &source(),
            &[FieldSpec::or_false("first_trade_id", "f")],
            &mut out,
        )
        .unwrap();
        assert_eq!(out["first_trade_id"], Value::Bool(false));
    }

    #[test]
    fn truthiness_matches_wire_conventions() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!({"code": 2, "msg": "invalid"})));
        assert!(is_truthy(&json!("boom")));
    }
}
