//! Template-declared extension points run after core field extraction.

pub mod lines;
pub mod tables;

pub use lines::{LinesConfig, LinesPlugin};
pub use tables::{TableConfig, TablesPlugin};

use crate::error::ExtractionError;
use crate::models::OutputRecord;
use crate::template::Template;

/// A post-processing extension point.
///
/// Plugins run in registration order after the field extractor, only for
/// templates that declare their section. They mutate the record in place
/// and may overwrite extractor-written keys; keys they did not add must
/// be left alone. The host does not catch plugin errors: they propagate
/// as extraction failures for the document.
pub trait Plugin: Send + Sync {
    /// Section name a template declares to enable this plugin.
    fn name(&self) -> &'static str;

    /// Whether the template declares this plugin's section.
    fn declared(&self, template: &Template) -> bool;

    /// Post-process the text/record pair.
    fn extract(
        &self,
        template: &Template,
        text: &str,
        record: &mut OutputRecord,
    ) -> Result<(), ExtractionError>;
}

/// Built-in plugins in their fixed registration order.
pub fn builtin() -> Vec<Box<dyn Plugin>> {
    vec![Box::new(LinesPlugin), Box::new(TablesPlugin)]
}
