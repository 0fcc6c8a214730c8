//! Error types for the normalization engine.
//!
//! Classification failures are explicit result values, never panics: callers
//! can distinguish "not my data" (pass-through, not an error) from "malformed
//! data I should have understood" (the variants below). Nothing here is fatal
//! to the process; only the value for one frame is affected.

use thiserror::Error;

use crate::endpoint::Family;

/// A frame that should have been decodable was not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The normalized envelope carries no event-type discriminator.
    #[error("payload carries no event type discriminator")]
    MissingEventType,

    /// The discriminator code matches no canonicalizer for the requested
    /// family.
    #[error("unrecognized {family} event kind: {code}")]
    UnrecognizedEvent {
        /// Family whose table was consulted.
        family: Family,
        /// The unmatched discriminator code.
        code: String,
    },

    /// A required source field was absent during canonicalization.
    #[error("{kind}: missing required field `{field}`")]
    MissingField {
        /// Event kind being decoded.
        kind: &'static str,
        /// Wire name of the missing field.
        field: &'static str,
    },
}

/// Failure while fetching latest-release metadata.
///
/// Callers of [`crate::release::ReleaseMonitor`] never see these: the monitor
/// degrades to the `"unknown"` sentinel instead of propagating.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The HTTP request failed or returned a non-success status.
    #[error("release request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response decoded but carried no `tag_name`.
    #[error("release response carries no tag_name")]
    MissingTag,
}
