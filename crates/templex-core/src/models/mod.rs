//! Data models for extraction output.

mod record;

pub use record::{FieldValue, OutputRecord};
