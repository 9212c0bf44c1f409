//! Error types for the templex-core library.

use thiserror::Error;

/// Main error type for the templex library.
#[derive(Error, Debug)]
pub enum TemplexError {
    /// Template configuration error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Document extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating a template definition.
///
/// Fatal for the offending template only: the loader reports these and
/// keeps going with the remaining files.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template declares no keywords.
    #[error("template {0}: keywords must not be empty")]
    MissingKeywords(String),

    /// A replace entry is not a 2-element pair.
    #[error("template {template}: a replace entry must be a pair, got {len} items")]
    BadReplacePair { template: String, len: usize },

    /// A sum field was declared with a single pattern instead of a list.
    #[error("template {template}: sum field {field} must declare a list of patterns")]
    SumFieldNotList { template: String, field: String },

    /// A declared pattern failed to compile.
    #[error("template {template}: bad pattern for {field}: {source}")]
    BadPattern {
        template: String,
        field: String,
        source: regex::Error,
    },

    /// A language code is not a 2-letter code.
    #[error("template {template}: language code {code:?} must have 2 letters")]
    BadLanguageCode { template: String, code: String },

    /// The decimal separator is not a single character.
    #[error("template {template}: decimal separator {separator:?} must be a single character")]
    BadDecimalSeparator { template: String, separator: String },

    /// A plugin types map names a coercion target that does not exist.
    #[error("template {template}: unknown coercion type {kind:?} for {field}")]
    UnknownCoercion {
        template: String,
        field: String,
        kind: String,
    },

    /// A section has the wrong shape.
    #[error("template {template}: {reason}")]
    Invalid { template: String, reason: String },

    /// The template file is not valid YAML.
    #[error("failed to parse template: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The template file could not be read.
    #[error("failed to read template: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while extracting fields from a single document.
///
/// These are expected, reportable outcomes: a batch of documents carries
/// on past any of them.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No template keyword set matched the document text.
    #[error("no template matched the document")]
    NoTemplateMatched,

    /// A date field matched but its value could not be parsed.
    #[error("date parsing failed for {field}: {value:?}")]
    DateParse { field: String, value: String },

    /// A numeric fragment could not be parsed.
    #[error("number parsing failed: {value:?}")]
    NumberParse { value: String },

    /// The output record does not cover the required field set.
    #[error("missing required fields: required {required:?}, present {present:?}")]
    MissingRequiredFields {
        required: Vec<String>,
        present: Vec<String>,
    },

    /// A plugin failed while post-processing the record.
    #[error("plugin {plugin}: {reason}")]
    Plugin {
        plugin: &'static str,
        reason: String,
    },
}

/// Result type for the templex library.
pub type Result<T> = std::result::Result<T, TemplexError>;
