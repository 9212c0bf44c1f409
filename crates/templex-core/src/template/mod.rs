//! Extraction templates: keyword triggers, field patterns, parsing options.

mod loader;
mod normalize;

pub use loader::{parse_template, read_templates, template_files};
pub use normalize::normalize;

use regex::Regex;
use tracing::debug;

use crate::plugins::{LinesConfig, TableConfig};

/// Fields an output record must contain when a template does not declare
/// its own `required_fields`.
pub const DEFAULT_REQUIRED_FIELDS: [&str; 4] = ["date", "amount", "invoice_number", "issuer"];

/// Normalization and parsing options for one template.
#[derive(Debug, Clone)]
pub struct Options {
    /// Collapse runs of the space character to nothing.
    pub remove_whitespace: bool,
    /// Transliterate accented characters to their ASCII base form.
    pub remove_accents: bool,
    /// Case-fold the whole buffer.
    pub lowercase: bool,
    /// Currency code injected into every output record.
    pub currency: String,
    /// Date formats (chrono syntax) tried before the built-in defaults.
    pub date_formats: Vec<String>,
    /// 2-letter language codes used for month-name date parsing.
    pub languages: Vec<String>,
    /// Decimal separator used when parsing numeric fields.
    pub decimal_separator: char,
    /// Literal substring replacements applied in declaration order.
    pub replace: Vec<(String, String)>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            remove_whitespace: false,
            remove_accents: false,
            lowercase: false,
            currency: "EUR".to_string(),
            date_formats: Vec::new(),
            languages: Vec::new(),
            decimal_separator: '.',
            replace: Vec::new(),
        }
    }
}

/// How a field's captured text is interpreted.
///
/// Resolved once from the declared key when the template is loaded,
/// instead of re-deriving it from the key string on every extraction.
/// Precedence when a key satisfies several rules: `static_` wins, then
/// `sum_amount`, then the `date` prefix/suffix, then the `amount` prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Literal value copied into the record; no pattern is applied.
    Static(String),
    /// Every match of every pattern parsed as a number and summed.
    AmountSum,
    /// First match parsed as a date; failure aborts the document.
    Date,
    /// First match parsed as a number.
    Amount,
    /// Matches de-duplicated; scalar if one unique value, list otherwise.
    Text,
}

/// One declared field: output key, kind tag and compiled patterns.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Output key, with the `static_`/`sum_` prefix already stripped.
    pub key: String,
    /// Interpretation of captured values.
    pub kind: FieldKind,
    /// Patterns in declaration order; empty for static fields.
    pub patterns: Vec<Regex>,
}

/// A declarative extraction template for one document issuer/format.
///
/// Immutable after load: the extractor shares templates read-only across
/// documents and worker threads.
#[derive(Debug, Clone)]
pub struct Template {
    /// Identifier, taken from the source file name.
    pub name: String,
    /// Literal substrings that must all appear in the normalized text.
    pub keywords: Vec<String>,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Normalization and parsing options.
    pub options: Options,
    /// Issuer name; defaults to the first keyword.
    pub issuer: String,
    /// Keys the output record must contain to count as a success.
    pub required_fields: Vec<String>,
    /// Line-item plugin configuration, when declared.
    pub lines: Option<LinesConfig>,
    /// Table plugin configuration, when declared.
    pub tables: Option<Vec<TableConfig>>,
}

impl Template {
    /// Normalize raw text according to this template's options.
    pub fn normalize(&self, text: &str) -> String {
        normalize::normalize(text, &self.options)
    }

    /// True when every keyword appears as a literal substring of `text`.
    ///
    /// Case-sensitive: case folding, if wanted, already happened during
    /// normalization. Short-circuits on the first missing keyword.
    pub fn matches_keywords(&self, text: &str) -> bool {
        let matched = self.keywords.iter().all(|keyword| text.contains(keyword.as_str()));
        if matched {
            debug!("matched template {}", self.name);
        }
        matched
    }
}

/// True when a key denotes a date field (`date` prefix or suffix).
pub(crate) fn is_date_key(key: &str) -> bool {
    key.starts_with("date") || key.ends_with("date")
}

/// True when a key denotes a numeric amount field.
pub(crate) fn is_amount_key(key: &str) -> bool {
    key.starts_with("amount")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_keywords(keywords: &[&str]) -> Template {
        Template {
            name: "test.yml".to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            fields: Vec::new(),
            options: Options::default(),
            issuer: keywords[0].to_string(),
            required_fields: Vec::new(),
            lines: None,
            tables: None,
        }
    }

    #[test]
    fn all_keywords_must_be_present() {
        let template = template_with_keywords(&["ACME", "Invoice"]);

        assert!(template.matches_keywords("ACME Corp Invoice #42"));
        assert!(!template.matches_keywords("ACME Corp receipt #42"));
        assert!(!template.matches_keywords(""));
    }

    #[test]
    fn keyword_matching_is_case_sensitive() {
        let template = template_with_keywords(&["ACME"]);

        assert!(!template.matches_keywords("acme corp"));
    }

    #[test]
    fn matching_tracks_substring_presence_after_normalization() {
        // The selector contract: matched iff every keyword is a literal
        // substring of the normalized text.
        let texts = ["ACME Corp\nInvoice", "Acme Corp", "Invoice from ACME", "nothing here"];
        let keyword_sets: [&[&str]; 3] = [&["ACME"], &["ACME", "Invoice"], &["Corp", "ACME"]];

        for text in texts {
            for keywords in keyword_sets {
                let template = template_with_keywords(keywords);
                let normalized = template.normalize(text);
                let expected = keywords.iter().all(|k| normalized.contains(k));
                assert_eq!(template.matches_keywords(&normalized), expected);
            }
        }
    }

    #[test]
    fn date_and_amount_key_classification() {
        assert!(is_date_key("date"));
        assert!(is_date_key("date_due"));
        assert!(is_date_key("issue_date"));
        assert!(!is_date_key("deadline"));

        assert!(is_amount_key("amount"));
        assert!(is_amount_key("amount_net"));
        assert!(!is_amount_key("total"));
    }
}
