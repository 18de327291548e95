//! Projected calendar events.
//!
//! A projected event is the calendar-side image of one source record. It is
//! created, overwritten and deleted by the reconciler only.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::color::HexColor;
use crate::source::SourceId;
use crate::temporal::Window;

pub type EventId = u64;

/// Identity of a projected event: at most one event per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OriginKey {
    pub model: String,
    pub record_id: i64,
    pub source_id: SourceId,
}

impl OriginKey {
    pub fn new(model: &str, record_id: i64, source_id: SourceId) -> Self {
        OriginKey {
            model: model.to_string(),
            record_id,
            source_id,
        }
    }

    /// Stable identifier used when exporting the event.
    pub fn uid(&self) -> String {
        format!("{}-{}-{}@globalcal", self.model, self.record_id, self.source_id)
    }
}

impl fmt::Display for OriginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.model, self.record_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub all_day: bool,

    /// Sorted, deduplicated owner ids
    #[serde(default)]
    pub owner_ids: Vec<i64>,
    pub visible_to_everyone: bool,

    pub origin: OriginKey,

    pub background: HexColor,
    pub text_color: HexColor,
    pub legacy_color_index: u8,
}

impl ProjectedEvent {
    /// First owner, if any.
    pub fn primary_owner(&self) -> Option<i64> {
        self.owner_ids.first().copied()
    }

    pub fn window(&self) -> Window {
        Window {
            start: self.start,
            stop: self.stop,
            all_day: self.all_day,
        }
    }
}

impl fmt::Display for ProjectedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// A projected event as persisted by a record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: EventId,
    #[serde(flatten)]
    pub event: ProjectedEvent,
}
