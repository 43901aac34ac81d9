//! Record types for storing data.

use crate::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field map carried by a record, excluding `id` and `created_at`.
pub type Fields = serde_json::Map<String, Value>;

/// A data record in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier allocated by the store
    pub id: RecordId,
    /// ISO-8601 creation time, set once at insert
    pub created_at: String,
    /// Everything else
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Create a new record.
    pub fn new(id: RecordId, created_at: impl Into<String>, mut fields: Fields) -> Self {
        strip_reserved(&mut fields);
        Self {
            id,
            created_at: created_at.into(),
            fields,
        }
    }

    /// Look up a field by name, including `id` and `created_at`.
    pub fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::from(self.id)),
            "created_at" => Some(Value::from(self.created_at.as_str())),
            _ => self.fields.get(field).cloned(),
        }
    }

    /// Merge fields into this record. `id` and `created_at` are never touched.
    pub fn merge(&mut self, mut fields: Fields) {
        strip_reserved(&mut fields);
        self.fields.extend(fields);
    }
}

fn strip_reserved(fields: &mut Fields) {
    fields.remove("id");
    fields.remove("created_at");
}
