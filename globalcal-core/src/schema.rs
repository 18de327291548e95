//! Model field catalogs (schema introspection).

use serde::{Deserialize, Serialize};

use crate::value::FieldType;

/// Declaration of one field of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Target model for relation fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl FieldDef {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        FieldDef {
            name: name.to_string(),
            field_type,
            relation: None,
        }
    }

    pub fn relation(name: &str, field_type: FieldType, target: &str) -> Self {
        FieldDef {
            name: name.to_string(),
            field_type,
            relation: Some(target.to_string()),
        }
    }

    pub fn points_to(&self, model: &str) -> bool {
        self.relation.as_deref() == Some(model)
    }
}

/// Field catalog of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub model: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl ModelSchema {
    pub fn new(model: &str, fields: Vec<FieldDef>) -> Self {
        ModelSchema {
            model: model.to_string(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}
