//! Template loading from YAML definition files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, error};

use crate::error::TemplateError;
use crate::extract::CoerceKind;
use crate::plugins::{LinesConfig, TableConfig};
use super::{DEFAULT_REQUIRED_FIELDS, FieldKind, FieldSpec, Options, Template, is_amount_key, is_date_key};

/// A raw template document as written in YAML, before validation.
#[derive(Debug, Deserialize)]
struct RawTemplate {
    keywords: OneOrMany,
    fields: serde_yaml::Mapping,
    #[serde(default)]
    options: RawOptions,
    #[serde(default)]
    issuer: Option<String>,
    #[serde(default)]
    required_fields: Option<Vec<String>>,
    #[serde(default)]
    lines: Option<RawLines>,
    #[serde(default)]
    tables: Option<Vec<RawTable>>,
}

/// A keyword entry may be a single string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOptions {
    remove_whitespace: bool,
    remove_accents: bool,
    lowercase: bool,
    currency: Option<String>,
    date_formats: Vec<String>,
    languages: Vec<String>,
    decimal_separator: Option<String>,
    replace: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawLines {
    start: String,
    end: String,
    line: String,
    #[serde(default)]
    first_line: Option<String>,
    #[serde(default)]
    last_line: Option<String>,
    #[serde(default)]
    skip_line: Option<String>,
    #[serde(default)]
    types: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    start: String,
    end: String,
    body: String,
}

/// Parse and validate one template document.
///
/// `name` identifies the template in logs and errors; the loader passes
/// the source file name.
pub fn parse_template(name: &str, source: &str) -> Result<Template, TemplateError> {
    let raw: RawTemplate = serde_yaml::from_str(source)?;
    build_template(name, raw)
}

/// Load every `.yml`/`.yaml` template under `folder`, recursively.
///
/// Files are visited in sorted path order, which fixes the precedence
/// `Extractor::select` relies on: more specific templates sort (or are
/// placed) before more general ones. Invalid templates are reported and
/// skipped so one bad file does not poison the rest of the collection.
pub fn read_templates(folder: &Path) -> crate::Result<Vec<Template>> {
    let mut templates = Vec::new();
    for path in template_files(folder)? {
        let source = fs::read_to_string(&path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        match parse_template(&name, &source) {
            Ok(template) => {
                debug!("loaded template {name}");
                templates.push(template);
            }
            Err(err) => error!("skipping template {name}: {err}"),
        }
    }
    Ok(templates)
}

/// Template definition files under `folder`, in sorted path order.
pub fn template_files(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    collect_files(folder, &mut paths)?;
    paths.sort();
    Ok(paths)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if matches!(path.extension().and_then(|e| e.to_str()), Some("yml" | "yaml")) {
            out.push(path);
        }
    }
    Ok(())
}

fn build_template(name: &str, raw: RawTemplate) -> Result<Template, TemplateError> {
    let keywords = raw.keywords.into_vec();
    if keywords.is_empty() {
        return Err(TemplateError::MissingKeywords(name.to_string()));
    }

    let options = build_options(name, raw.options)?;
    let fields = build_fields(name, raw.fields)?;

    let issuer = raw.issuer.unwrap_or_else(|| keywords[0].clone());
    let required_fields = raw.required_fields.unwrap_or_else(|| {
        DEFAULT_REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect()
    });

    let lines = raw.lines.map(|l| build_lines(name, l)).transpose()?;
    let tables = raw
        .tables
        .map(|tables| {
            tables
                .into_iter()
                .map(|t| build_table(name, t))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(Template {
        name: name.to_string(),
        keywords,
        fields,
        options,
        issuer,
        required_fields,
        lines,
        tables,
    })
}

fn build_options(name: &str, raw: RawOptions) -> Result<Options, TemplateError> {
    for code in &raw.languages {
        if code.chars().count() != 2 {
            return Err(TemplateError::BadLanguageCode {
                template: name.to_string(),
                code: code.clone(),
            });
        }
    }

    let decimal_separator = match raw.decimal_separator {
        None => '.',
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(TemplateError::BadDecimalSeparator {
                        template: name.to_string(),
                        separator: s,
                    });
                }
            }
        }
    };

    let mut replace = Vec::with_capacity(raw.replace.len());
    for entry in raw.replace {
        match <[String; 2]>::try_from(entry) {
            Ok([from, to]) => replace.push((from, to)),
            Err(entry) => {
                return Err(TemplateError::BadReplacePair {
                    template: name.to_string(),
                    len: entry.len(),
                });
            }
        }
    }

    Ok(Options {
        remove_whitespace: raw.remove_whitespace,
        remove_accents: raw.remove_accents,
        lowercase: raw.lowercase,
        currency: raw.currency.unwrap_or_else(|| "EUR".to_string()),
        date_formats: raw.date_formats,
        languages: raw.languages,
        decimal_separator,
        replace,
    })
}

fn build_fields(name: &str, raw: serde_yaml::Mapping) -> Result<Vec<FieldSpec>, TemplateError> {
    let mut fields = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        let Value::String(key) = key else {
            return Err(invalid(name, "field keys must be strings"));
        };
        fields.push(build_field(name, key, value)?);
    }
    Ok(fields)
}

fn build_field(template: &str, key: String, value: Value) -> Result<FieldSpec, TemplateError> {
    if let Some(stripped) = key.strip_prefix("static_") {
        let Value::String(literal) = value else {
            return Err(invalid(template, "static field values must be strings"));
        };
        return Ok(FieldSpec {
            key: stripped.to_string(),
            kind: FieldKind::Static(literal),
            patterns: Vec::new(),
        });
    }

    let (sources, is_list) = match value {
        Value::String(s) => (vec![s], false),
        Value::Sequence(seq) => {
            let mut sources = Vec::with_capacity(seq.len());
            for item in seq {
                let Value::String(s) = item else {
                    return Err(invalid(template, "field patterns must be strings"));
                };
                sources.push(s);
            }
            (sources, true)
        }
        _ => return Err(invalid(template, "a field must declare a pattern or list of patterns")),
    };

    let (key, kind) = if key.starts_with("sum_amount") {
        if !is_list {
            return Err(TemplateError::SumFieldNotList {
                template: template.to_string(),
                field: key,
            });
        }
        (key["sum_".len()..].to_string(), FieldKind::AmountSum)
    } else if is_date_key(&key) {
        (key, FieldKind::Date)
    } else if is_amount_key(&key) {
        (key, FieldKind::Amount)
    } else {
        (key, FieldKind::Text)
    };

    let mut patterns = Vec::with_capacity(sources.len());
    for source in &sources {
        patterns.push(compile(template, &key, source)?);
    }

    Ok(FieldSpec { key, kind, patterns })
}

fn build_lines(template: &str, raw: RawLines) -> Result<LinesConfig, TemplateError> {
    let mut types = BTreeMap::new();
    for (field, kind) in raw.types {
        let Some(kind_tag) = CoerceKind::from_name(&kind) else {
            return Err(TemplateError::UnknownCoercion {
                template: template.to_string(),
                field,
                kind,
            });
        };
        types.insert(field, kind_tag);
    }

    Ok(LinesConfig {
        start: compile(template, "lines.start", &raw.start)?,
        end: compile(template, "lines.end", &raw.end)?,
        line: compile(template, "lines.line", &raw.line)?,
        first_line: raw
            .first_line
            .as_deref()
            .map(|p| compile(template, "lines.first_line", p))
            .transpose()?,
        last_line: raw
            .last_line
            .as_deref()
            .map(|p| compile(template, "lines.last_line", p))
            .transpose()?,
        skip_line: raw
            .skip_line
            .as_deref()
            .map(|p| compile(template, "lines.skip_line", p))
            .transpose()?,
        types,
    })
}

fn build_table(template: &str, raw: RawTable) -> Result<TableConfig, TemplateError> {
    Ok(TableConfig {
        start: compile(template, "tables.start", &raw.start)?,
        end: compile(template, "tables.end", &raw.end)?,
        body: compile(template, "tables.body", &raw.body)?,
    })
}

fn compile(template: &str, field: &str, source: &str) -> Result<Regex, TemplateError> {
    Regex::new(source).map_err(|err| TemplateError::BadPattern {
        template: template.to_string(),
        field: field.to_string(),
        source: err,
    })
}

fn invalid(template: &str, reason: &str) -> TemplateError {
    TemplateError::Invalid {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn single_keyword_becomes_list() {
        let template = parse_template(
            "acme.yml",
            r#"
keywords: ACME
fields:
  invoice_number: 'Invoice #(\d+)'
"#,
        )
        .unwrap();

        assert_eq!(template.keywords, vec!["ACME".to_string()]);
        assert_eq!(template.issuer, "ACME");
    }

    #[test]
    fn issuer_can_be_declared_explicitly() {
        let template = parse_template(
            "acme.yml",
            r#"
keywords: [ACME]
issuer: ACME Corporation
fields:
  invoice_number: 'Invoice #(\d+)'
"#,
        )
        .unwrap();

        assert_eq!(template.issuer, "ACME Corporation");
    }

    #[test]
    fn required_fields_default_when_not_declared() {
        let template = parse_template(
            "acme.yml",
            r#"
keywords: [ACME]
fields:
  invoice_number: 'Invoice #(\d+)'
"#,
        )
        .unwrap();

        assert_eq!(
            template.required_fields,
            vec!["date", "amount", "invoice_number", "issuer"]
        );
    }

    #[test]
    fn field_kinds_resolve_from_key_prefixes() {
        let template = parse_template(
            "kinds.yml",
            r#"
keywords: [ACME]
fields:
  static_vendor: ACME Corp
  sum_amount_fees: ['Fee: ([\d.]+)']
  date: 'Date: (\S+)'
  due_date: 'Due: (\S+)'
  amount_net: 'Net: ([\d.]+)'
  reference: 'Ref: (\S+)'
"#,
        )
        .unwrap();

        let kinds: Vec<(&str, &FieldKind)> = template
            .fields
            .iter()
            .map(|f| (f.key.as_str(), &f.kind))
            .collect();

        assert_eq!(kinds[0], ("vendor", &FieldKind::Static("ACME Corp".to_string())));
        assert_eq!(kinds[1], ("amount_fees", &FieldKind::AmountSum));
        assert_eq!(kinds[2], ("date", &FieldKind::Date));
        assert_eq!(kinds[3], ("due_date", &FieldKind::Date));
        assert_eq!(kinds[4], ("amount_net", &FieldKind::Amount));
        assert_eq!(kinds[5], ("reference", &FieldKind::Text));
    }

    #[test]
    fn sum_field_with_single_pattern_is_rejected() {
        let err = parse_template(
            "bad.yml",
            r#"
keywords: [ACME]
fields:
  sum_amount: 'Fee: ([\d.]+)'
"#,
        )
        .unwrap_err();

        assert!(matches!(err, TemplateError::SumFieldNotList { .. }));
    }

    #[test]
    fn replace_entries_must_be_pairs() {
        let err = parse_template(
            "bad.yml",
            r#"
keywords: [ACME]
fields:
  invoice_number: '(\d+)'
options:
  replace:
    - [only-one]
"#,
        )
        .unwrap_err();

        assert!(matches!(err, TemplateError::BadReplacePair { len: 1, .. }));
    }

    #[test]
    fn language_codes_must_have_two_letters() {
        let err = parse_template(
            "bad.yml",
            r#"
keywords: [ACME]
fields:
  invoice_number: '(\d+)'
options:
  languages: [deu]
"#,
        )
        .unwrap_err();

        assert!(matches!(err, TemplateError::BadLanguageCode { .. }));
    }

    #[test]
    fn unknown_coercion_type_is_rejected() {
        let err = parse_template(
            "bad.yml",
            r#"
keywords: [ACME]
fields:
  invoice_number: '(\d+)'
lines:
  start: 'Items'
  end: 'Total'
  line: '(?P<qty>\d+)'
  types:
    qty: decimal
"#,
        )
        .unwrap_err();

        assert!(matches!(err, TemplateError::UnknownCoercion { .. }));
    }

    #[test]
    fn options_defaults_apply() {
        let template = parse_template(
            "acme.yml",
            r#"
keywords: [ACME]
fields:
  invoice_number: '(\d+)'
"#,
        )
        .unwrap();

        assert_eq!(template.options.currency, "EUR");
        assert_eq!(template.options.decimal_separator, '.');
        assert!(!template.options.lowercase);
    }

    #[test]
    fn reads_templates_from_folder_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b-general.yml"),
            "keywords: [Corp]\nfields:\n  reference: '(\\d+)'\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a-specific.yml"),
            "keywords: [ACME Corp]\nfields:\n  reference: '(\\d+)'\n",
        )
        .unwrap();
        // Invalid template: reported and skipped, not fatal.
        fs::write(dir.path().join("c-broken.yml"), "fields: {}\n").unwrap();

        let templates = read_templates(dir.path()).unwrap();

        let names: Vec<&str> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a-specific.yml", "b-general.yml"]);
    }
}
