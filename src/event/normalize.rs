//! Relocation of non-required fields into `properties`.

use serde_json::{Map, Value};

use super::model::{
    CUSTOMER_ID, Candidate, EVENT_TYPE, PROPERTIES, RawRecord, TIMESTAMP, TRANSACTION_ID,
};

/// Reshape a raw record into a candidate.
///
/// Required fields are copied verbatim. Every other key is moved into
/// `properties` in source order, after any keys an object-valued
/// `properties` already had. A later extra key overwrites an existing
/// property of the same name.
pub fn normalize(raw: RawRecord) -> Candidate {
    let mut candidate = Candidate::default();
    let mut extras: Vec<(String, Value)> = Vec::new();

    for (key, value) in raw {
        match key.as_str() {
            TIMESTAMP => candidate.timestamp = Some(value),
            TRANSACTION_ID => candidate.transaction_id = Some(value),
            CUSTOMER_ID => candidate.customer_id = Some(value),
            EVENT_TYPE => candidate.event_type = Some(value),
            PROPERTIES => match value {
                Value::Object(existing) => {
                    let mut bag = existing;
                    // Extras seen before `properties` go after its own keys.
                    if let Some(previous) = candidate.properties.take() {
                        bag.extend(previous);
                    }
                    candidate.properties = Some(bag);
                }
                Value::Null => {}
                other => extras.push((PROPERTIES.to_string(), other)),
            },
            _ => {
                candidate
                    .properties
                    .get_or_insert_with(Map::new)
                    .insert(key, value);
            }
        }
    }

    if !extras.is_empty() {
        let bag = candidate.properties.get_or_insert_with(Map::new);
        for (key, value) in extras {
            bag.insert(key, value);
        }
    }

    candidate
}

/// Normalize a sequence of raw records, preserving order.
pub fn normalize_all(records: Vec<RawRecord>) -> Vec<Candidate> {
    records.into_iter().map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_extras_move_into_properties() {
        let candidate = normalize(record(json!({
            "timestamp": "2024-01-01T00:00:00Z",
            "region": "eu",
            "transaction_id": "t1",
            "customer_id": "c1",
            "event_type": "api_call",
            "plan": "pro"
        })));

        assert_eq!(candidate.transaction_id, Some(json!("t1")));
        let properties = candidate.properties.unwrap();
        let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["region", "plan"]);
    }

    #[test]
    fn test_no_extras_means_no_properties() {
        let candidate = normalize(record(json!({
            "timestamp": "2024-01-01T00:00:00Z",
            "transaction_id": "t1",
            "customer_id": "c1",
            "event_type": "api_call"
        })));
        assert!(candidate.properties.is_none());
    }

    #[test]
    fn test_existing_properties_kept_and_extended() {
        let candidate = normalize(record(json!({
            "plan": "pro",
            "properties": {"seats": 3},
            "region": "eu"
        })));
        let properties = candidate.properties.unwrap();
        assert_eq!(
            Value::Object(properties),
            json!({"seats": 3, "plan": "pro", "region": "eu"})
        );
    }

    #[test]
    fn test_null_properties_treated_as_absent() {
        let candidate = normalize(record(json!({"properties": null})));
        assert!(candidate.properties.is_none());

        let candidate = normalize(record(json!({"properties": null, "plan": "pro"})));
        assert_eq!(
            Value::Object(candidate.properties.unwrap()),
            json!({"plan": "pro"})
        );
    }

    #[test]
    fn test_scalar_properties_nested_under_own_key() {
        let candidate = normalize(record(json!({"properties": "raw", "plan": "pro"})));
        assert_eq!(
            Value::Object(candidate.properties.unwrap()),
            json!({"plan": "pro", "properties": "raw"})
        );
    }

    #[test]
    fn test_required_fields_never_in_properties() {
        let candidate = normalize(record(json!({
            "customer_id": "",
            "extra": 1
        })));
        let properties = candidate.properties.unwrap();
        assert!(!properties.contains_key("customer_id"));
        assert_eq!(candidate.customer_id, Some(json!("")));
    }
}
