use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{new_id, now_utc_rfc3339};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Select,
    Checkbox,
}

/// One field in a user-defined module schema. `options` only matters for
/// Select fields and stays empty otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
}

/// A user-defined record type: a name, an icon, and an ordered field schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub fields: Vec<ModuleField>,
}

impl Module {
    pub fn new(name: impl Into<String>, fields: Vec<ModuleField>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            icon: String::new(),
            fields,
        }
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|field| field.key == key)
    }
}

/// An entry under a module: a free-form value map constrained to the module's
/// declared field keys at the store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntry {
    pub id: String,
    pub module_id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl ModuleEntry {
    pub fn new(
        module_id: impl Into<String>,
        title: impl Into<String>,
        values: BTreeMap<String, Value>,
    ) -> Self {
        let now = now_utc_rfc3339();
        Self {
            id: new_id(),
            module_id: module_id.into(),
            title: title.into(),
            tags: Vec::new(),
            values,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
