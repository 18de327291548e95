//! Field types, field values and source records.
//!
//! These types describe what the record store hands to the engine. They are
//! deliberately loose: a date field may hold text, a numeric field may hold
//! garbage. Typing is enforced when the engine reads a value through a slot.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Declared type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Char,
    Text,
    Date,
    Datetime,
    Float,
    Integer,
    Boolean,
    Many2one,
    Many2many,
}

impl FieldType {
    pub fn is_temporal(self) -> bool {
        matches!(self, FieldType::Date | FieldType::Datetime)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Float | FieldType::Integer)
    }

    pub fn is_relation(self) -> bool {
        matches!(self, FieldType::Many2one | FieldType::Many2many)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Char => "char",
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Many2one => "many2one",
            FieldType::Many2many => "many2many",
        };
        write!(f, "{}", name)
    }
}

/// Reference to a related record (relation fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: i64,
    /// Display label of the related record
    #[serde(default)]
    pub name: String,
}

impl RecordRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        RecordRef {
            id,
            name: name.into(),
        }
    }
}

/// A raw value as stored on a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
    Ref(RecordRef),
    Refs(Vec<RecordRef>),
}

impl FieldValue {
    /// Whether the value counts as set (`False` in domain comparisons matches unset values).
    pub fn is_set(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Refs(refs) => !refs.is_empty(),
            _ => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One record of a source model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: i64) -> Self {
        Record {
            id,
            display_name: None,
            values: BTreeMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with(mut self, field: &str, value: FieldValue) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Human label: display name, else the `name` field, else `model #id`.
    pub fn label(&self, model: &str) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| {
                self.get("name")
                    .and_then(FieldValue::as_text)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
            })
            .unwrap_or_else(|| format!("{} #{}", model, self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_set() {
        assert!(!FieldValue::Null.is_set());
        assert!(!FieldValue::Bool(false).is_set());
        assert!(!FieldValue::Text(String::new()).is_set());
        assert!(!FieldValue::Refs(vec![]).is_set());
        assert!(FieldValue::Integer(0).is_set());
        assert!(FieldValue::Ref(RecordRef::new(1, "Admin")).is_set());
    }

    #[test]
    fn test_label_fallbacks() {
        let named = Record::new(4).with_display_name("Lead A");
        assert_eq!(named.label("crm.lead"), "Lead A");

        let by_field = Record::new(4).with("name", FieldValue::Text("Task".into()));
        assert_eq!(by_field.label("project.task"), "Task");

        assert_eq!(Record::new(4).label("project.task"), "project.task #4");
    }

    #[test]
    fn test_value_json_shape() {
        let record = Record::new(1)
            .with("date_deadline", FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()))
            .with("user_id", FieldValue::Ref(RecordRef::new(2, "Mitchell")));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["values"]["date_deadline"]["date"], "2024-01-10");
        assert_eq!(json["values"]["user_id"]["ref"]["id"], 2);
    }
}
