use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded record before any reshaping. Keys keep source order.
pub type RawRecord = Map<String, Value>;

pub const TIMESTAMP: &str = "timestamp";
pub const TRANSACTION_ID: &str = "transaction_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const EVENT_TYPE: &str = "event_type";
pub const PROPERTIES: &str = "properties";

/// Fields every event must carry.
pub const REQUIRED_FIELDS: [&str; 4] = [TIMESTAMP, TRANSACTION_ID, CUSTOMER_ID, EVENT_TYPE];

/// A validated usage event, ready for billing ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: String,
    pub transaction_id: String,
    pub customer_id: String,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

/// A normalized record whose required fields have not been checked yet.
///
/// Required fields hold whatever JSON value the source had, so an invalid
/// candidate serializes back to what the uploader sent (minus relocation of
/// extra keys into `properties`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Candidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl Candidate {
    pub(crate) fn required(&self) -> [Option<&Value>; 4] {
        [
            self.timestamp.as_ref(),
            self.transaction_id.as_ref(),
            self.customer_id.as_ref(),
            self.event_type.as_ref(),
        ]
    }
}

impl From<Event> for Candidate {
    fn from(event: Event) -> Self {
        Candidate {
            timestamp: Some(Value::String(event.timestamp)),
            transaction_id: Some(Value::String(event.transaction_id)),
            customer_id: Some(Value::String(event.customer_id)),
            event_type: Some(Value::String(event.event_type)),
            properties: event.properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_omits_absent_properties() {
        let event = Event {
            timestamp: "2024-01-01T00:00:00Z".into(),
            transaction_id: "t1".into(),
            customer_id: "c1".into(),
            event_type: "api_call".into(),
            properties: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "timestamp": "2024-01-01T00:00:00Z",
                "transaction_id": "t1",
                "customer_id": "c1",
                "event_type": "api_call"
            })
        );
    }

    #[test]
    fn test_candidate_serializes_missing_and_null_differently() {
        let candidate = Candidate {
            timestamp: Some(Value::Null),
            customer_id: Some(json!("c1")),
            ..Default::default()
        };
        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value, json!({"timestamp": null, "customer_id": "c1"}));
    }
}
