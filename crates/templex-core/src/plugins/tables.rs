//! Table extraction plugin.
//!
//! Parses bounded table blocks whose row pattern carries named capture
//! groups; captured values land as top-level record fields, so a table
//! can supply (or override) the same keys the field extractor produces.

use regex::Regex;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::extract::{parse_date, parse_number};
use crate::models::{FieldValue, OutputRecord};
use crate::template::{Template, is_amount_key, is_date_key};

use super::Plugin;

/// One table block: boundary markers plus a row pattern.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Marks where the table begins.
    pub start: Regex,
    /// Marks where the table ends.
    pub end: Regex,
    /// Row pattern; named capture groups become record fields.
    pub body: Regex,
}

/// Table extraction behind the `tables` template section.
pub struct TablesPlugin;

impl Plugin for TablesPlugin {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn declared(&self, template: &Template) -> bool {
        template.tables.is_some()
    }

    fn extract(
        &self,
        template: &Template,
        text: &str,
        record: &mut OutputRecord,
    ) -> Result<(), ExtractionError> {
        let Some(tables) = template.tables.as_ref() else {
            return Ok(());
        };

        for table in tables {
            let Some(start) = table.start.find(text) else {
                warn!("tables: start marker did not match");
                continue;
            };
            let Some(end) = table.end.find(text) else {
                warn!("tables: end marker did not match");
                continue;
            };
            if start.end() > end.start() {
                warn!("tables: start marker sits after end marker");
                continue;
            }

            for line in text[start.end()..end.start()].lines() {
                let Some(caps) = table.body.captures(line) else {
                    continue;
                };
                debug!("tables: row matched {line:?}");

                for name in table.body.capture_names().flatten() {
                    let Some(m) = caps.name(name) else { continue };
                    let value = m.as_str().trim();
                    if value.is_empty() {
                        continue;
                    }

                    // Same key classification the field extractor uses,
                    // so a group named `date` or `amount_net` is typed.
                    let coerced = if is_date_key(name) {
                        match parse_date(value, &template.options) {
                            Some(date) => FieldValue::Date(date),
                            None => {
                                return Err(ExtractionError::DateParse {
                                    field: name.to_string(),
                                    value: value.to_string(),
                                });
                            }
                        }
                    } else if is_amount_key(name) {
                        FieldValue::Number(parse_number(value, template.options.decimal_separator)?)
                    } else {
                        FieldValue::Text(value.to_string())
                    };
                    record.insert(name, coerced);
                }
            }
        }

        Ok(())
    }
}
