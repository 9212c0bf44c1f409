//! Core library for template-driven document field extraction.
//!
//! This crate provides:
//! - Declarative extraction templates loaded from YAML (keyword triggers,
//!   field patterns, normalization and parsing options)
//! - First-match-wins template selection over normalized text
//! - Field extraction with locale-aware number and date parsing
//! - Line-item and table plugins for structured output

pub mod error;
pub mod models;
pub mod template;
pub mod extract;
pub mod plugins;

pub use error::{TemplexError, TemplateError, ExtractionError, Result};
pub use models::{FieldValue, OutputRecord};
pub use template::{Template, FieldKind, FieldSpec, Options, parse_template, read_templates, template_files};
pub use extract::{Extractor, CoerceKind};
pub use plugins::Plugin;
