//! Field extraction against a matched template.

use regex::Regex;
use tracing::{debug, error, warn};

use crate::error::ExtractionError;
use crate::models::{FieldValue, OutputRecord};
use crate::template::{FieldKind, FieldSpec, Template};

use super::coerce;

/// Apply a template's field patterns to normalized text.
///
/// Produces the partial record later handed to plugins and validation:
/// the issuer default first, declared fields in order, currency last.
pub fn extract_fields(template: &Template, text: &str) -> Result<OutputRecord, ExtractionError> {
    let mut record = OutputRecord::new();
    record.insert("issuer", FieldValue::Text(template.issuer.clone()));

    for field in &template.fields {
        extract_field(template, field, text, &mut record)?;
    }

    record.insert("currency", FieldValue::Text(template.options.currency.clone()));
    Ok(record)
}

fn extract_field(
    template: &Template,
    field: &FieldSpec,
    text: &str,
    record: &mut OutputRecord,
) -> Result<(), ExtractionError> {
    if let FieldKind::Static(value) = &field.kind {
        debug!("field {}: static value {value:?}", field.key);
        record.insert(field.key.as_str(), FieldValue::Text(value.clone()));
        return Ok(());
    }

    let matches = collect_matches(&field.patterns, text);
    if matches.is_empty() {
        // Not an error: validation decides later whether the record is
        // still complete enough.
        warn!("patterns for field {} did not match", field.key);
        return Ok(());
    }
    debug!("field {}: {} matches", field.key, matches.len());

    match field.kind {
        FieldKind::Static(_) => unreachable!("handled above"),
        FieldKind::AmountSum => {
            let mut total = 0.0;
            for value in &matches {
                total += coerce::parse_number(value, template.options.decimal_separator)?;
            }
            record.insert(field.key.as_str(), FieldValue::Number(total));
        }
        FieldKind::Date => match coerce::parse_date(&matches[0], &template.options) {
            Some(date) => record.insert(field.key.as_str(), FieldValue::Date(date)),
            None => {
                // A date field is load-bearing: its failure fails the
                // whole document, not just this field.
                error!("date parsing failed on {:?}", matches[0]);
                return Err(ExtractionError::DateParse {
                    field: field.key.clone(),
                    value: matches[0].clone(),
                });
            }
        },
        FieldKind::Amount => {
            let number = coerce::parse_number(&matches[0], template.options.decimal_separator)?;
            record.insert(field.key.as_str(), FieldValue::Number(number));
        }
        FieldKind::Text => {
            let unique = dedup(matches);
            let value = if unique.len() == 1 {
                FieldValue::Text(unique.into_iter().next().unwrap_or_default())
            } else {
                FieldValue::List(unique)
            };
            record.insert(field.key.as_str(), value);
        }
    }

    Ok(())
}

/// Collect every match of every pattern, in pattern declaration order.
///
/// A pattern may match several times; all occurrences are kept. Capture
/// group 1 is taken when the pattern declares groups, the whole match
/// otherwise.
fn collect_matches(patterns: &[Regex], text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for pattern in patterns {
        for caps in pattern.captures_iter(text) {
            let value = if pattern.captures_len() > 1 {
                caps.get(1).map(|m| m.as_str()).unwrap_or("")
            } else {
                caps.get(0).map(|m| m.as_str()).unwrap_or("")
            };
            found.push(value.to_string());
        }
    }
    found
}

/// De-duplicate, keeping first-occurrence order.
fn dedup(values: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}
