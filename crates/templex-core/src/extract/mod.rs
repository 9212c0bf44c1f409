//! Template selection and the extraction pipeline.

mod coerce;
mod fields;

pub use coerce::{CoerceKind, coerce, parse_date, parse_number};
pub use fields::extract_fields;

use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::{FieldValue, OutputRecord};
use crate::plugins::{self, Plugin};
use crate::template::Template;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Template-driven document extractor.
///
/// Owns the ordered template collection and the plugin registry, both
/// fixed at construction. Everything here is read-only per call, so one
/// `process` invocation per document can run from any number of threads.
pub struct Extractor {
    templates: Vec<Template>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Extractor {
    /// Create an extractor over an ordered template collection, with the
    /// built-in plugins registered in their fixed order.
    pub fn new(templates: Vec<Template>) -> Self {
        Self {
            templates,
            plugins: plugins::builtin(),
        }
    }

    /// Number of loaded templates.
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Find the first template whose keyword set matches the document.
    ///
    /// Templates are tried in load order, each against text normalized
    /// with its own options; the first match wins. Load order is the
    /// precedence contract: more specific templates must come before
    /// more general ones.
    pub fn select(&self, raw_text: &str) -> Option<(&Template, String)> {
        debug!("testing {} templates", self.templates.len());
        for template in &self.templates {
            let normalized = template.normalize(raw_text);
            if template.matches_keywords(&normalized) {
                return Some((template, normalized));
            }
        }
        None
    }

    /// Extract a structured record from one document's raw text.
    ///
    /// Failures are expected outcomes, returned as values: no matching
    /// template, an unparsable date field, a plugin error, or a record
    /// missing required fields.
    pub fn process(&self, raw_text: &str) -> Result<OutputRecord> {
        let (template, normalized) = self
            .select(raw_text)
            .ok_or(ExtractionError::NoTemplateMatched)?;
        info!("matched template {}", template.name);

        let mut record = fields::extract_fields(template, &normalized)?;

        for plugin in &self.plugins {
            if plugin.declared(template) {
                debug!("running plugin {}", plugin.name());
                plugin.extract(template, &normalized, &mut record)?;
            }
        }

        let missing: Vec<&String> = template
            .required_fields
            .iter()
            .filter(|field| !record.contains(field))
            .collect();
        if !missing.is_empty() {
            let present: Vec<String> = record.keys().map(str::to_string).collect();
            warn!(
                "unable to match all required fields: required {:?}, present {:?}",
                template.required_fields, present
            );
            return Err(ExtractionError::MissingRequiredFields {
                required: template.required_fields.clone(),
                present,
            });
        }

        record.insert(
            "desc",
            FieldValue::Text(format!("Invoice from {}", template.issuer)),
        );
        Ok(record)
    }
}
