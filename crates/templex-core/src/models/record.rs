//! Output record data model.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

/// A single extracted field value.
///
/// Records are shaped by the template rather than by a fixed schema, so
/// values are dynamically typed: scalars for unambiguous matches, lists
/// when several distinct values were captured, rows for structured
/// line-item output produced by plugins.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A single text value.
    Text(String),
    /// Several distinct text values.
    List(Vec<String>),
    /// A numeric value.
    Number(f64),
    /// A calendar date, free of any output formatting.
    Date(NaiveDate),
    /// Structured rows (line items, table bodies).
    Rows(Vec<BTreeMap<String, FieldValue>>),
}

impl FieldValue {
    /// Text content, if this is a scalar text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Date content, if this is a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Structured output for one document.
///
/// Built incrementally by the field extractor and plugins, then returned
/// by the pipeline only once required-field validation has passed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputRecord {
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl OutputRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, overwriting any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Whether a field is present.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate over all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record holds no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_existing_key() {
        let mut record = OutputRecord::new();
        record.insert("amount", FieldValue::Number(1.0));
        record.insert("amount", FieldValue::Number(2.0));

        assert_eq!(record.len(), 1);
        assert_eq!(record.get("amount").and_then(FieldValue::as_number), Some(2.0));
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut record = OutputRecord::new();
        record.insert("issuer", FieldValue::Text("ACME".to_string()));
        record.insert("amount", FieldValue::Number(100.0));
        record.insert("date", FieldValue::Date(NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["issuer"], "ACME");
        assert_eq!(json["amount"], 100.0);
        assert_eq!(json["date"], "2020-01-15");
    }
}
