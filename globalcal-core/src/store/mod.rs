//! Record store seam.
//!
//! The engine never owns persistence. It reads source models and writes
//! projected events through [`RecordStore`], a blocking interface over
//! whatever storage backs the installation.

mod memory;

pub use memory::MemoryStore;

use crate::domain::Domain;
use crate::error::GlobalCalResult;
use crate::event::{EventId, ProjectedEvent, StoredEvent};
use crate::schema::ModelSchema;
use crate::source::SourceId;
use crate::value::Record;

/// Offset/limit window over a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Page { offset: 0, limit }
    }

    pub fn next(self) -> Self {
        Page {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

pub trait RecordStore {
    /// Field catalog of `model`, or `None` if the model does not exist.
    fn schema(&self, model: &str) -> Option<ModelSchema>;

    /// Records of `model` matching `domain`, ordered by ascending id.
    fn search(&self, model: &str, domain: &Domain, page: Page) -> GlobalCalResult<Vec<Record>>;

    /// Projected events originating from `model`, whatever their source.
    fn events_for_model(&self, model: &str) -> GlobalCalResult<Vec<StoredEvent>>;

    fn events_for_source(&self, source_id: SourceId) -> GlobalCalResult<Vec<StoredEvent>>;

    fn all_events(&self) -> GlobalCalResult<Vec<StoredEvent>>;

    /// Fails with `DuplicateEvent` if an event with the same origin key exists.
    fn create_event(&mut self, event: ProjectedEvent) -> GlobalCalResult<EventId>;

    /// Full overwrite. Fails with `DuplicateEvent` if the new origin key
    /// belongs to another event.
    fn update_event(&mut self, id: EventId, event: ProjectedEvent) -> GlobalCalResult<()>;

    /// Returns how many events were removed. Unknown ids are ignored.
    fn delete_events(&mut self, ids: &[EventId]) -> GlobalCalResult<usize>;
}
