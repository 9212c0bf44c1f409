//! Line-item extraction plugin.
//!
//! Parses a repeated-row region of the document, bounded by start/end
//! markers, into structured rows stored under the `lines` key.

use std::collections::BTreeMap;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::extract::{CoerceKind, coerce};
use crate::models::{FieldValue, OutputRecord};
use crate::template::{Options, Template};

use super::Plugin;

/// Configuration for the line-item plugin, compiled at template load.
#[derive(Debug, Clone)]
pub struct LinesConfig {
    /// Marks where the line-item region begins.
    pub start: Regex,
    /// Marks where the line-item region ends.
    pub end: Regex,
    /// Row pattern with named capture groups.
    pub line: Regex,
    /// When set, a row starts only where this matches; subsequent `line`
    /// matches merge into the open row (multi-line items).
    pub first_line: Option<Regex>,
    /// When set, closes the open row with its captures merged in.
    pub last_line: Option<Regex>,
    /// Rows matching this are ignored entirely.
    pub skip_line: Option<Regex>,
    /// Per-group coercion targets; groups without an entry stay text.
    pub types: BTreeMap<String, CoerceKind>,
}

/// Line-item extraction behind the `lines` template section.
pub struct LinesPlugin;

impl Plugin for LinesPlugin {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn declared(&self, template: &Template) -> bool {
        template.lines.is_some()
    }

    fn extract(
        &self,
        template: &Template,
        text: &str,
        record: &mut OutputRecord,
    ) -> Result<(), ExtractionError> {
        let Some(config) = template.lines.as_ref() else {
            return Ok(());
        };

        let Some(start) = config.start.find(text) else {
            warn!("lines: start marker did not match");
            return Ok(());
        };
        let Some(end) = config.end.find(text) else {
            warn!("lines: end marker did not match");
            return Ok(());
        };
        if start.end() > end.start() {
            warn!("lines: start marker sits after end marker");
            return Ok(());
        }
        let body = &text[start.end()..end.start()];

        let mut rows = Vec::new();
        // Raw captured strings for the row being assembled; coercion
        // happens when the row closes.
        let mut open_row: Option<BTreeMap<String, String>> = None;

        for line in body.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(skip) = &config.skip_line {
                if skip.is_match(line) {
                    continue;
                }
            }

            if let Some(first) = &config.first_line {
                if let Some(caps) = first.captures(line) {
                    if let Some(row) = open_row.take() {
                        rows.push(close_row(row, config, &template.options)?);
                    }
                    let mut row = BTreeMap::new();
                    merge_captures(&mut row, first, &caps);
                    open_row = Some(row);
                    continue;
                }
            }

            if let Some(last) = &config.last_line {
                if let Some(caps) = last.captures(line) {
                    let mut row = open_row.take().unwrap_or_default();
                    merge_captures(&mut row, last, &caps);
                    rows.push(close_row(row, config, &template.options)?);
                    continue;
                }
            }

            if let Some(caps) = config.line.captures(line) {
                if config.first_line.is_some() {
                    // Continuation of the open row.
                    let row = open_row.get_or_insert_with(BTreeMap::new);
                    merge_captures(row, &config.line, &caps);
                } else {
                    let mut row = BTreeMap::new();
                    merge_captures(&mut row, &config.line, &caps);
                    rows.push(close_row(row, config, &template.options)?);
                }
                continue;
            }

            debug!("lines: no pattern matched {line:?}");
        }

        if let Some(row) = open_row.take() {
            rows.push(close_row(row, config, &template.options)?);
        }

        if rows.is_empty() {
            warn!("lines: no rows found between markers");
            return Ok(());
        }

        record.insert("lines", FieldValue::Rows(rows));
        Ok(())
    }
}

/// Merge named captures into a row; a repeated group appends with a
/// space, so continuation lines extend e.g. a description.
fn merge_captures(row: &mut BTreeMap<String, String>, pattern: &Regex, caps: &Captures<'_>) {
    for name in pattern.capture_names().flatten() {
        let Some(m) = caps.name(name) else { continue };
        let value = m.as_str().trim();
        if value.is_empty() {
            continue;
        }
        row.entry(name.to_string())
            .and_modify(|existing| {
                existing.push(' ');
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
}

fn close_row(
    row: BTreeMap<String, String>,
    config: &LinesConfig,
    options: &Options,
) -> Result<BTreeMap<String, FieldValue>, ExtractionError> {
    let mut closed = BTreeMap::new();
    for (key, value) in row {
        let coerced = match config.types.get(&key) {
            Some(kind) => coerce(&key, &value, *kind, options)?,
            None => FieldValue::Text(value),
        };
        closed.insert(key, coerced);
    }
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use crate::template::parse_template;

    use super::*;

    fn template(source: &str) -> Template {
        parse_template("lines.yml", source).unwrap()
    }

    fn run(template: &Template, text: &str) -> Result<OutputRecord, ExtractionError> {
        let mut record = OutputRecord::new();
        LinesPlugin.extract(template, text, &mut record)?;
        Ok(record)
    }

    #[test]
    fn extracts_typed_rows_between_markers() {
        let template = template(
            r#"
keywords: [ACME]
fields:
  invoice_number: 'Invoice #(\d+)'
lines:
  start: 'Items:'
  end: 'Total'
  line: '(?P<qty>\d+)\s+(?P<desc>.+?)\s+(?P<amount>[\d.]+)$'
  types:
    qty: int
    amount: float
"#,
        );
        let text = "Items:\n2 Widget large 10.00\n1 Gadget 5.50\nTotal: 15.50";

        let record = run(&template, text).unwrap();
        let Some(FieldValue::Rows(rows)) = record.get("lines") else {
            panic!("expected rows");
        };

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("qty"), Some(&FieldValue::Number(2.0)));
        assert_eq!(rows[0].get("desc"), Some(&FieldValue::Text("Widget large".to_string())));
        assert_eq!(rows[0].get("amount"), Some(&FieldValue::Number(10.0)));
        assert_eq!(rows[1].get("amount"), Some(&FieldValue::Number(5.5)));
    }

    #[test]
    fn missing_markers_are_a_soft_no_op() {
        let template = template(
            r#"
keywords: [ACME]
fields:
  invoice_number: 'Invoice #(\d+)'
lines:
  start: 'Items:'
  end: 'Total'
  line: '(?P<amount>[\d.]+)'
"#,
        );

        let record = run(&template, "no item region here").unwrap();
        assert!(!record.contains("lines"));
    }

    #[test]
    fn skip_line_filters_rows() {
        let template = template(
            r#"
keywords: [ACME]
fields:
  invoice_number: 'Invoice #(\d+)'
lines:
  start: 'Items:'
  end: 'Total'
  line: '(?P<desc>\w+)\s+(?P<amount>[\d.]+)$'
  skip_line: 'Subtotal'
  types:
    amount: float
"#,
        );
        let text = "Items:\nWidget 10.00\nSubtotal 10.00\nGadget 5.00\nTotal: 15.00";

        let record = run(&template, text).unwrap();
        let Some(FieldValue::Rows(rows)) = record.get("lines") else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn first_line_groups_continuations_into_one_row() {
        let template = template(
            r#"
keywords: [ACME]
fields:
  invoice_number: 'Invoice #(\d+)'
lines:
  start: 'Items:'
  end: 'Total'
  first_line: '^(?P<pos>\d+)\s+(?P<desc>.+?)\s+(?P<amount>[\d.]+)$'
  line: '^\s+(?P<desc>\S.*)$'
  types:
    amount: float
"#,
        );
        let text = "Items:\n1 Widget 10.00\n  extra large\n2 Gadget 5.00\nTotal: 15.00";

        let record = run(&template, text).unwrap();
        let Some(FieldValue::Rows(rows)) = record.get("lines") else {
            panic!("expected rows");
        };

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("desc"),
            Some(&FieldValue::Text("Widget extra large".to_string()))
        );
    }

    #[test]
    fn bad_typed_value_propagates_as_an_error() {
        let template = template(
            r#"
keywords: [ACME]
fields:
  invoice_number: 'Invoice #(\d+)'
lines:
  start: 'Items:'
  end: 'Total'
  line: '(?P<desc>\w+)\s+(?P<when>\S+)$'
  types:
    when: date
"#,
        );
        let text = "Items:\nWidget someday\nTotal";

        assert!(run(&template, text).is_err());
    }
}
