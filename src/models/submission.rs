use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

/// Decoded form fields, keyed by field name.
pub type FormFields = BTreeMap<String, String>;

/// Format of the `date` key on stored messages, e.g. `2024-04-28 20:21:11.812177`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A decoded submission stamped with the time the ingestion role received it.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub fields: FormFields,
    pub received_at: DateTime<Local>,
}

impl FormSubmission {
    pub fn new(fields: FormFields, received_at: DateTime<Local>) -> Self {
        Self {
            fields,
            received_at,
        }
    }

    /// Build the stored document: every field as a top-level string plus
    /// `date`. A submitted field named `date` is replaced by the timestamp.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for (key, value) in &self.fields {
            doc.insert(key.clone(), Value::String(value.clone()));
        }
        doc.insert(
            "date".to_string(),
            Value::String(self.received_at.format(DATE_FORMAT).to_string()),
        );
        Value::Object(doc)
    }
}
