//! Required-field validation.

use serde_json::Value;

use super::model::{Candidate, Event};

/// Result of splitting candidates by validity. Both sides keep source order.
#[derive(Debug, Default)]
pub struct Partitioned {
    pub valid: Vec<Event>,
    pub invalid: Vec<Candidate>,
}

/// Render a required field, or `None` when it does not count as present.
///
/// Strings must be non-empty. Numbers are accepted and rendered as their
/// JSON text. Null, booleans, arrays and objects are rejected.
fn field_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Returns true if every required field is present and non-empty.
///
/// Event fields are strings, so only values with a string rendering count:
/// any number (including `0`) is accepted and booleans are rejected.
pub fn is_valid(candidate: &Candidate) -> bool {
    candidate
        .required()
        .into_iter()
        .all(|value| field_text(value).is_some())
}

fn to_event(candidate: &Candidate) -> Option<Event> {
    Some(Event {
        timestamp: field_text(candidate.timestamp.as_ref())?,
        transaction_id: field_text(candidate.transaction_id.as_ref())?,
        customer_id: field_text(candidate.customer_id.as_ref())?,
        event_type: field_text(candidate.event_type.as_ref())?,
        properties: candidate.properties.clone(),
    })
}

/// Split candidates into valid events and invalid candidates in one pass.
pub fn partition_valid(candidates: Vec<Candidate>) -> Partitioned {
    let mut partitioned = Partitioned::default();
    for candidate in candidates {
        match to_event(&candidate) {
            Some(event) => partitioned.valid.push(event),
            None => partitioned.invalid.push(candidate),
        }
    }
    partitioned
}
