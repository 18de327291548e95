//! Field mapping.
//!
//! A source names fields of its model by role. Binding resolves each name
//! once against the model's field catalog, checks the declared type against
//! the role, and picks a typed reader for it. Reading a record afterwards is
//! a map lookup plus that reader; nothing is re-resolved per record.

use std::fmt;

use crate::error::{GlobalCalError, GlobalCalResult};
use crate::schema::{FieldDef, ModelSchema};
use crate::source::SourceConfig;
use crate::temporal::{Temporal, parse_temporal_text};
use crate::value::{FieldType, FieldValue, Record};

/// Calendar role a model field can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Title,
    Start,
    Stop,
    Duration,
    OwnerSingle,
    OwnerMany,
}

impl SlotRole {
    /// Whether `field` may play this role. Owner roles must point at `owner_model`.
    pub fn accepts(self, field: &FieldDef, owner_model: &str) -> bool {
        match self {
            SlotRole::Title => matches!(
                field.field_type,
                FieldType::Char | FieldType::Text | FieldType::Many2one
            ),
            SlotRole::Start | SlotRole::Stop => field.field_type.is_temporal(),
            SlotRole::Duration => field.field_type.is_numeric(),
            SlotRole::OwnerSingle => {
                field.field_type == FieldType::Many2one && field.points_to(owner_model)
            }
            SlotRole::OwnerMany => {
                field.field_type == FieldType::Many2many && field.points_to(owner_model)
            }
        }
    }

    fn expected(self) -> &'static str {
        match self {
            SlotRole::Title => "char, text or many2one",
            SlotRole::Start | SlotRole::Stop => "date or datetime",
            SlotRole::Duration => "float or integer",
            SlotRole::OwnerSingle => "many2one to the owner model",
            SlotRole::OwnerMany => "many2many to the owner model",
        }
    }
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotRole::Title => "title",
            SlotRole::Start => "start",
            SlotRole::Stop => "stop",
            SlotRole::Duration => "duration",
            SlotRole::OwnerSingle => "owner",
            SlotRole::OwnerMany => "owners",
        };
        write!(f, "{}", name)
    }
}

type Reader<T> = fn(&str, &FieldValue) -> GlobalCalResult<Option<T>>;

/// A field bound to a role, with the reader chosen for its declared type.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    role: SlotRole,
    field: String,
    reader: Reader<T>,
}

impl<T> Slot<T> {
    pub fn role(&self) -> SlotRole {
        self.role
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Read the slot on `record`. A missing or null value is `Ok(None)`.
    pub fn read(&self, record: &Record) -> GlobalCalResult<Option<T>> {
        match record.get(&self.field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(value) => (self.reader)(&self.field, value),
        }
    }
}

/// All slots of a source, resolved against its model.
#[derive(Debug, Clone)]
pub struct SlotMap {
    pub title: Option<Slot<String>>,
    pub start: Slot<Temporal>,
    pub stop: Option<Slot<Temporal>>,
    pub duration: Option<Slot<f64>>,
    pub owner_single: Option<Slot<i64>>,
    pub owner_many: Option<Slot<Vec<i64>>>,
}

/// Bind every configured field of `source` against `schema`.
pub fn resolve_slots(
    source: &SourceConfig,
    schema: &ModelSchema,
    owner_model: &str,
) -> GlobalCalResult<SlotMap> {
    let binder = Binder {
        schema,
        owner_model,
    };

    let title = source
        .title_field
        .as_deref()
        .map(|name| {
            binder.bind(SlotRole::Title, name, |field| match field.field_type {
                FieldType::Many2one => read_relation_label,
                _ => read_text,
            })
        })
        .transpose()?;

    if source.start_field.trim().is_empty() {
        return Err(GlobalCalError::Configuration(format!(
            "Source '{}' has no start field",
            source.name
        )));
    }
    let start = binder.bind(SlotRole::Start, &source.start_field, |_| read_temporal)?;

    let stop = source
        .stop_field
        .as_deref()
        .map(|name| binder.bind(SlotRole::Stop, name, |_| read_temporal))
        .transpose()?;

    let duration = source
        .duration_field
        .as_deref()
        .map(|name| binder.bind(SlotRole::Duration, name, |_| read_hours))
        .transpose()?;

    let owner_single = source
        .owner_single_field
        .as_deref()
        .map(|name| binder.bind(SlotRole::OwnerSingle, name, |_| read_relation_id))
        .transpose()?;

    let owner_many = source
        .owner_many_field
        .as_deref()
        .map(|name| binder.bind(SlotRole::OwnerMany, name, |_| read_relation_ids))
        .transpose()?;

    Ok(SlotMap {
        title,
        start,
        stop,
        duration,
        owner_single,
        owner_many,
    })
}

struct Binder<'a> {
    schema: &'a ModelSchema,
    owner_model: &'a str,
}

impl Binder<'_> {
    fn bind<T>(
        &self,
        role: SlotRole,
        name: &str,
        pick_reader: impl FnOnce(&FieldDef) -> Reader<T>,
    ) -> GlobalCalResult<Slot<T>> {
        let field = self.schema.field(name).ok_or_else(|| {
            GlobalCalError::Configuration(format!(
                "{} field '{}' does not exist on model '{}'",
                role, name, self.schema.model
            ))
        })?;

        if !role.accepts(field, self.owner_model) {
            return Err(GlobalCalError::Configuration(format!(
                "{} field '{}' on model '{}' is {}{}, expected {}",
                role,
                name,
                self.schema.model,
                field.field_type,
                field
                    .relation
                    .as_deref()
                    .map(|r| format!(" to '{}'", r))
                    .unwrap_or_default(),
                role.expected()
            )));
        }

        Ok(Slot {
            role,
            field: name.to_string(),
            reader: pick_reader(field),
        })
    }
}

// READERS:

fn mismatch<T>(field: &str, value: &FieldValue, expected: &str) -> GlobalCalResult<T> {
    Err(GlobalCalError::value(
        field,
        format!("expected {}, found {:?}", expected, value),
    ))
}

fn read_text(field: &str, value: &FieldValue) -> GlobalCalResult<Option<String>> {
    match value {
        FieldValue::Text(s) if s.is_empty() => Ok(None),
        FieldValue::Text(s) => Ok(Some(s.clone())),
        other => mismatch(field, other, "text"),
    }
}

fn read_relation_label(field: &str, value: &FieldValue) -> GlobalCalResult<Option<String>> {
    match value {
        FieldValue::Ref(r) if r.name.is_empty() => Ok(None),
        FieldValue::Ref(r) => Ok(Some(r.name.clone())),
        other => mismatch(field, other, "a related record"),
    }
}

fn read_temporal(field: &str, value: &FieldValue) -> GlobalCalResult<Option<Temporal>> {
    match value {
        FieldValue::Date(d) => Ok(Some(Temporal::Date(*d))),
        FieldValue::Datetime(dt) => Ok(Some(Temporal::DateTime(*dt))),
        FieldValue::Text(s) if s.trim().is_empty() => Ok(None),
        FieldValue::Text(s) => parse_temporal_text(s)
            .map(Some)
            .ok_or_else(|| GlobalCalError::value(field, format!("'{}' is not a date", s))),
        FieldValue::Bool(false) => Ok(None),
        other => mismatch(field, other, "a date or datetime"),
    }
}

fn read_hours(field: &str, value: &FieldValue) -> GlobalCalResult<Option<f64>> {
    match value {
        FieldValue::Float(f) => Ok(Some(*f)),
        FieldValue::Integer(i) => Ok(Some(*i as f64)),
        FieldValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| GlobalCalError::value(field, format!("'{}' is not a number", s))),
        FieldValue::Bool(false) => Ok(None),
        other => mismatch(field, other, "a number"),
    }
}

fn read_relation_id(field: &str, value: &FieldValue) -> GlobalCalResult<Option<i64>> {
    match value {
        FieldValue::Ref(r) => Ok(Some(r.id)),
        FieldValue::Integer(id) => Ok(Some(*id)),
        FieldValue::Bool(false) => Ok(None),
        other => mismatch(field, other, "a related record"),
    }
}

fn read_relation_ids(field: &str, value: &FieldValue) -> GlobalCalResult<Option<Vec<i64>>> {
    match value {
        FieldValue::Refs(refs) => Ok(Some(refs.iter().map(|r| r.id).collect())),
        FieldValue::Ref(r) => Ok(Some(vec![r.id])),
        FieldValue::Bool(false) => Ok(None),
        other => mismatch(field, other, "related records"),
    }
}
