//! Calendar source configuration.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::color::is_valid_hex;
use crate::error::{GlobalCalError, GlobalCalResult};

pub type SourceId = u64;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_SEQUENCE: i64 = 10;

fn default_true() -> bool {
    true
}

fn default_sequence() -> i64 {
    DEFAULT_SEQUENCE
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Which model feeds the calendar and which of its fields play each role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: SourceId,
    pub name: String,

    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_sequence")]
    pub sequence: i64,

    /// Scanned model
    pub model: String,

    // Field mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,
    pub start_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_field: Option<String>,
    /// Numeric field holding a duration in hours, used when there is no stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_single_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_many_field: Option<String>,

    /// Domain filter text; empty selects every record
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,

    // Colors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,

    /// Applied to events that resolve no owner
    #[serde(default)]
    pub visible_to_everyone_fallback: bool,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl SourceConfig {
    pub fn new(id: SourceId, name: &str, model: &str, start_field: &str) -> Self {
        SourceConfig {
            id,
            name: name.to_string(),
            active: true,
            sequence: DEFAULT_SEQUENCE,
            model: model.to_string(),
            title_field: None,
            start_field: start_field.to_string(),
            stop_field: None,
            duration_field: None,
            owner_single_field: None,
            owner_many_field: None,
            domain: String::new(),
            color_index: None,
            color_hex: None,
            visible_to_everyone_fallback: false,
            batch_size: DEFAULT_BATCH_SIZE,
            last_sync: None,
        }
    }

    /// Checks that do not need the model's field catalog.
    pub fn validate(&self) -> GlobalCalResult<()> {
        if self.name.trim().is_empty() {
            return Err(GlobalCalError::Configuration(format!(
                "Source {} has no name",
                self.id
            )));
        }

        if self.model.trim().is_empty() {
            return Err(GlobalCalError::Configuration(format!(
                "Source '{}' has no model",
                self.name
            )));
        }

        if self.start_field.trim().is_empty() {
            return Err(GlobalCalError::Configuration(format!(
                "Source '{}' has no start field",
                self.name
            )));
        }

        match &self.color_hex {
            Some(hex) if !is_valid_hex(hex) => {
                return Err(GlobalCalError::Configuration(format!(
                    "Invalid hex color '{}' on source '{}'. Use #RRGGBB.",
                    hex, self.name
                )));
            }
            _ => {}
        }

        Ok(())
    }

    /// Scan page size (never zero).
    pub fn scan_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

impl fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.model)
    }
}
