//! Recovery of a JSON document from free-form model output.
//!
//! Two tiers: the whole reply as JSON, then the greedy span from the first `{`
//! to the last `}`. Models that wrap JSON in prose or code fences are covered by
//! the second tier. Two separate objects in one reply are spanned together and
//! fail to parse; that case is not repaired.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No parsable JSON in the reply. The raw text is kept for display.
    #[error("model response did not contain a parsable JSON object")]
    Malformed { raw: String },
}

impl ExtractError {
    /// The unparsed model text
    pub fn raw(&self) -> &str {
        match self {
            ExtractError::Malformed { raw } => raw,
        }
    }
}

/// Extract a JSON value from a model reply
pub fn extract_json(raw: &str) -> Result<Value, ExtractError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        debug!("model reply parsed as a whole");
        return Ok(value);
    }

    if let Some(candidate) = greedy_object_span(raw) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => {
                debug!(
                    span = candidate.len(),
                    total = raw.len(),
                    "model reply parsed from embedded object"
                );
                return Ok(value);
            }
            Err(e) => debug!("embedded object did not parse: {}", e),
        }
    }

    Err(ExtractError::Malformed {
        raw: raw.to_string(),
    })
}

/// Slice from the first `{` through the last `}`, if they are in that order
fn greedy_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
