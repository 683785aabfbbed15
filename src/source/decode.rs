//! Decoding of file content into raw records.

use serde_json::{Deserializer, Map, Value};
use snafu::prelude::*;
use tracing::warn;

use crate::error::{DecodeError, InvalidUtf8Snafu, MalformedJsonSnafu};
use crate::event::RawRecord;

use super::format::FileFormat;

/// Decode the bytes of an object into raw records, in source order.
pub fn decode(format: FileFormat, key: &str, bytes: &[u8]) -> Result<Vec<RawRecord>, DecodeError> {
    let text = std::str::from_utf8(bytes).context(InvalidUtf8Snafu { key })?;
    match format {
        FileFormat::Csv => Ok(decode_csv(text)),
        FileFormat::Json => decode_json(key, text),
        FileFormat::Jsonl => decode_jsonl(key, text),
    }
}

/// Header row zipped with each data row. No quoting support.
fn decode_csv(text: &str) -> Vec<RawRecord> {
    let text = text.replace('\r', "");
    let mut lines = text.split('\n');

    let headers: Vec<&str> = match lines.next() {
        Some(header) => header.split(',').map(str::trim).collect(),
        None => return Vec::new(),
    };

    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            headers
                .iter()
                .zip(line.split(','))
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, cell)| (header.to_string(), Value::String(cell.trim().to_string())))
                .collect::<RawRecord>()
        })
        .collect()
}

fn decode_json(key: &str, text: &str) -> Result<Vec<RawRecord>, DecodeError> {
    let document: Value = serde_json::from_str(text).context(MalformedJsonSnafu { key })?;
    Ok(records_from_document(key, document))
}

fn decode_jsonl(key: &str, text: &str) -> Result<Vec<RawRecord>, DecodeError> {
    let documents = Deserializer::from_str(text)
        .into_iter::<Value>()
        .collect::<Result<Vec<_>, _>>()
        .context(MalformedJsonSnafu { key })?;

    if documents.len() <= 1 {
        return decode_json(key, text);
    }

    Ok(documents
        .into_iter()
        .flat_map(|document| records_from_document(key, document))
        .collect())
}

fn records_from_document(key: &str, document: Value) -> Vec<RawRecord> {
    let elements = match document {
        Value::Array(elements) => elements,
        other => vec![other],
    };
    elements
        .into_iter()
        .map(|element| match element {
            Value::Object(record) => record,
            other => {
                warn!(key, element = %other, "Non-object element decoded as empty record");
                Map::new()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(records: Vec<RawRecord>) -> Vec<Value> {
        records.into_iter().map(Value::Object).collect()
    }

    #[test]
    fn test_csv_basic() {
        let text = "timestamp,transaction_id,customer_id,event_type,plan\n\
                    2024-01-01T00:00:00Z,t1,c1,api_call,pro\n";
        let records = decode(FileFormat::Csv, "e.csv", text.as_bytes()).unwrap();
        assert_eq!(
            values(records),
            vec![json!({
                "timestamp": "2024-01-01T00:00:00Z",
                "transaction_id": "t1",
                "customer_id": "c1",
                "event_type": "api_call",
                "plan": "pro"
            })]
        );
    }

    #[test]
    fn test_csv_trims_and_strips_carriage_returns() {
        let text = " a , b \r\n 1 , 2 \r\n\r\n";
        let records = decode(FileFormat::Csv, "e.csv", text.as_bytes()).unwrap();
        assert_eq!(values(records), vec![json!({"a": "1", "b": "2"})]);
    }

    #[test]
    fn test_csv_short_and_long_rows() {
        let text = "a,b,c\n1\n1,2,3,4\n";
        let records = decode(FileFormat::Csv, "e.csv", text.as_bytes()).unwrap();
        assert_eq!(
            values(records),
            vec![json!({"a": "1"}), json!({"a": "1", "b": "2", "c": "3"})]
        );
    }

    #[test]
    fn test_csv_header_only() {
        let records = decode(FileFormat::Csv, "e.csv", b"a,b\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_json_array_and_single_object() {
        let array = decode(FileFormat::Json, "e.json", br#"[{"a":1},{"b":2}]"#).unwrap();
        assert_eq!(values(array), vec![json!({"a": 1}), json!({"b": 2})]);

        let single = decode(FileFormat::Json, "e.json", br#"{"a":1}"#).unwrap();
        assert_eq!(values(single), vec![json!({"a": 1})]);
    }

    #[test]
    fn test_json_preserves_key_order() {
        let records = decode(FileFormat::Json, "e.json", br#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_malformed_json() {
        let err = decode(FileFormat::Json, "e.json", b"[{\"a\":").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson { .. }));
    }

    #[test]
    fn test_non_object_elements_become_empty_records() {
        let records = decode(FileFormat::Json, "e.json", br#"[1, "x", {"a": 1}]"#).unwrap();
        assert_eq!(values(records), vec![json!({}), json!({}), json!({"a": 1})]);
    }

    #[test]
    fn test_jsonl_multiple_documents() {
        let text = "{\"a\":1}\n{\"a\":2}\n[{\"a\":3},{\"a\":4}]\n";
        let records = decode(FileFormat::Jsonl, "e.jsonl", text.as_bytes()).unwrap();
        assert_eq!(
            values(records),
            vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3}), json!({"a": 4})]
        );
    }

    #[test]
    fn test_jsonl_single_document_matches_json() {
        for text in [r#"[{"a":1},{"a":2}]"#, r#"{"a":1}"#] {
            let as_json = decode(FileFormat::Json, "e.json", text.as_bytes()).unwrap();
            let as_jsonl = decode(FileFormat::Jsonl, "e.jsonl", text.as_bytes()).unwrap();
            assert_eq!(as_json, as_jsonl);
        }
    }

    #[test]
    fn test_jsonl_malformed_line() {
        let err = decode(FileFormat::Jsonl, "e.jsonl", b"{\"a\":1}\n{oops}\n").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson { .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = decode(FileFormat::Csv, "e.csv", &[0xff, 0xfe, b'\n']).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidUtf8 { .. }));
    }
}
