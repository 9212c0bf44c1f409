//! Output serialization for extracted records.
//!
//! The core keeps dates as language-neutral values; rendering them with
//! the user-chosen output date format happens here.

use std::fs;
use std::path::{Path, PathBuf};

use templex_core::{FieldValue, OutputRecord};

/// Convert a field value to JSON, rendering dates with `date_format`.
pub fn field_to_json(value: &FieldValue, date_format: &str) -> serde_json::Value {
    match value {
        FieldValue::Text(s) => serde_json::Value::String(s.clone()),
        FieldValue::List(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|item| serde_json::Value::String(item.clone()))
                .collect(),
        ),
        FieldValue::Number(n) => serde_json::json!(n),
        FieldValue::Date(date) => {
            serde_json::Value::String(date.format(date_format).to_string())
        }
        FieldValue::Rows(rows) => serde_json::Value::Array(
            rows.iter()
                .map(|row| {
                    serde_json::Value::Object(
                        row.iter()
                            .map(|(key, value)| (key.clone(), field_to_json(value, date_format)))
                            .collect(),
                    )
                })
                .collect(),
        ),
    }
}

/// Convert a whole record to a JSON object.
pub fn record_to_json(record: &OutputRecord, date_format: &str) -> serde_json::Value {
    serde_json::Value::Object(
        record
            .iter()
            .map(|(key, value)| (key.clone(), field_to_json(value, date_format)))
            .collect(),
    )
}

/// Write records as a pretty-printed JSON array, appending a `.json`
/// extension when the given path lacks one.
pub fn write_json(records: &[serde_json::Value], path: &Path) -> anyhow::Result<PathBuf> {
    let path = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        path.to_path_buf()
    } else {
        let mut with_extension = path.as_os_str().to_owned();
        with_extension.push(".json");
        PathBuf::from(with_extension)
    };

    let content = serde_json::to_string_pretty(records)?;
    fs::write(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn dates_render_with_the_requested_format() {
        let mut record = OutputRecord::new();
        record.insert(
            "date",
            FieldValue::Date(NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()),
        );

        let json = record_to_json(&record, "%d.%m.%Y");
        assert_eq!(json["date"], "15.01.2020");
    }

    #[test]
    fn rows_render_as_nested_objects() {
        let mut row = std::collections::BTreeMap::new();
        row.insert("amount".to_string(), FieldValue::Number(10.0));
        let mut record = OutputRecord::new();
        record.insert("lines", FieldValue::Rows(vec![row]));

        let json = record_to_json(&record, "%Y-%m-%d");
        assert_eq!(json["lines"][0]["amount"], 10.0);
    }

    #[test]
    fn json_extension_is_appended_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_json(&[], &dir.path().join("invoices-output")).unwrap();
        assert_eq!(written.extension().and_then(|e| e.to_str()), Some("json"));
        assert!(written.exists());
    }
}
