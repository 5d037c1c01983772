use crate::timestamp::{self, Timestamp};
use serde::Serialize;
use serde_json::{Map, Value};

pub const REQUIRED_FIELDS: [&str; 3] = ["name", "id", "timestamp"];

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EntryError {
    #[error("entry is not a JSON object")]
    NotAnObject,
    #[error("entry is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// A validated attendance record.
///
/// Only presence of the fields is checked. `name` and `id` are written to the
/// sheet exactly as received, whatever their JSON type.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub name: Value,
    pub id: Value,
    pub timestamp: Value,
}

impl LogEntry {
    pub fn from_value(value: &Value) -> Result<Self, EntryError> {
        let object = value.as_object().ok_or(EntryError::NotAnObject)?;

        let missing = missing_fields(object);
        if !missing.is_empty() {
            return Err(EntryError::MissingFields(missing));
        }

        Ok(LogEntry {
            name: object["name"].clone(),
            id: object["id"].clone(),
            timestamp: object["timestamp"].clone(),
        })
    }

    pub fn normalized_timestamp(&self) -> Timestamp {
        match &self.timestamp {
            Value::String(raw) => timestamp::normalize(raw),
            other => Timestamp::Raw(other.to_string()),
        }
    }

    pub fn into_row(self) -> NormalizedRow {
        let timestamp = self.normalized_timestamp().into_string();
        NormalizedRow(self.name, timestamp, self.id)
    }
}

fn missing_fields(object: &Map<String, Value>) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|field| !object.contains_key(*field))
        .collect()
}

/// One spreadsheet row: `[name, formatted timestamp, id]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedRow(pub Value, pub String, pub Value);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_entry() {
        let entry = LogEntry::from_value(&json!({
            "name": "Alice",
            "id": "42",
            "timestamp": "2024-03-05T14:30:00Z",
        }))
        .unwrap();

        assert_eq!(
            entry.into_row(),
            NormalizedRow(json!("Alice"), "05/03/2024 14:30:00".into(), json!("42"))
        );
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            LogEntry::from_value(&json!({"name": "Alice", "timestamp": "x"})),
            Err(EntryError::MissingFields(vec!["id"]))
        );
        assert_eq!(
            LogEntry::from_value(&json!({"name": "B"})),
            Err(EntryError::MissingFields(vec!["id", "timestamp"]))
        );
        assert_eq!(
            LogEntry::from_value(&json!({})).unwrap_err().to_string(),
            "entry is missing required fields: name, id, timestamp"
        );
    }

    #[test]
    fn test_not_an_object() {
        for value in [json!([]), json!("name"), json!(null), json!(3)] {
            assert_eq!(LogEntry::from_value(&value), Err(EntryError::NotAnObject));
        }
    }

    #[test]
    fn test_presence_only() {
        // Nulls and non-string values count as present.
        let entry = LogEntry::from_value(&json!({
            "name": null,
            "id": 7,
            "timestamp": "not a date",
            "extra": true,
        }))
        .unwrap();

        assert_eq!(
            entry.into_row(),
            NormalizedRow(json!(null), "not a date".into(), json!(7))
        );
    }

    #[test]
    fn test_non_string_timestamp_falls_back_to_json_text() {
        let entry =
            LogEntry::from_value(&json!({"name": "A", "id": "1", "timestamp": 1709649000}))
                .unwrap();
        assert_eq!(
            entry.normalized_timestamp(),
            Timestamp::Raw("1709649000".into())
        );
    }

    #[test]
    fn test_row_serializes_as_array() {
        let row = NormalizedRow(json!("A"), "01/01/2024 00:00:00".into(), json!(1));
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!(["A", "01/01/2024 00:00:00", 1])
        );
    }
}
