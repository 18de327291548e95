//! In-memory record store, persisted as a JSON snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::{GlobalCalError, GlobalCalResult};
use crate::event::{EventId, OriginKey, ProjectedEvent, StoredEvent};
use crate::schema::{FieldDef, ModelSchema};
use crate::source::SourceId;
use crate::store::{Page, RecordStore};
use crate::value::Record;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ModelData {
    #[serde(default)]
    fields: Vec<FieldDef>,
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    models: BTreeMap<String, ModelData>,
    #[serde(default)]
    events: BTreeMap<EventId, ProjectedEvent>,
    #[serde(default)]
    next_event_id: EventId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot, or an empty store if the file does not exist.
    pub fn load(path: &Path) -> GlobalCalResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            GlobalCalError::Serialization(format!("{}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> GlobalCalResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| GlobalCalError::Serialization(e.to_string()))?;

        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, path)?;
        Ok(())
    }

    /// Declare a model (replaces its field catalog, keeps its records).
    pub fn define_model(&mut self, schema: ModelSchema) {
        self.models.entry(schema.model).or_default().fields = schema.fields;
    }

    /// Insert or replace a record of a declared model.
    pub fn put_record(&mut self, model: &str, record: Record) -> GlobalCalResult<()> {
        let data = self
            .models
            .get_mut(model)
            .ok_or_else(|| GlobalCalError::ModelNotFound(model.to_string()))?;

        match data.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => data.records.push(record),
        }
        Ok(())
    }

    /// Returns whether a record was removed.
    pub fn remove_record(&mut self, model: &str, id: i64) -> bool {
        let Some(data) = self.models.get_mut(model) else {
            return false;
        };
        let before = data.records.len();
        data.records.retain(|r| r.id != id);
        data.records.len() != before
    }

    pub fn record_mut(&mut self, model: &str, id: i64) -> Option<&mut Record> {
        self.models
            .get_mut(model)?
            .records
            .iter_mut()
            .find(|r| r.id == id)
    }

    pub fn event(&self, id: EventId) -> Option<&ProjectedEvent> {
        self.events.get(&id)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn find_by_origin(&self, origin: &OriginKey) -> Option<EventId> {
        self.events
            .iter()
            .find(|(_, e)| e.origin == *origin)
            .map(|(id, _)| *id)
    }

    fn stored(&self, filter: impl Fn(&ProjectedEvent) -> bool) -> Vec<StoredEvent> {
        self.events
            .iter()
            .filter(|(_, e)| filter(e))
            .map(|(id, e)| StoredEvent {
                id: *id,
                event: e.clone(),
            })
            .collect()
    }

    fn duplicate(origin: &OriginKey) -> GlobalCalError {
        GlobalCalError::DuplicateEvent {
            model: origin.model.clone(),
            record_id: origin.record_id,
            source_id: origin.source_id,
        }
    }
}

impl RecordStore for MemoryStore {
    fn schema(&self, model: &str) -> Option<ModelSchema> {
        self.models
            .get(model)
            .map(|data| ModelSchema::new(model, data.fields.clone()))
    }

    fn search(&self, model: &str, domain: &Domain, page: Page) -> GlobalCalResult<Vec<Record>> {
        let data = self
            .models
            .get(model)
            .ok_or_else(|| GlobalCalError::ModelNotFound(model.to_string()))?;

        let mut matching: Vec<&Record> = data.records.iter().filter(|r| domain.matches(r)).collect();
        matching.sort_by_key(|r| r.id);

        Ok(matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }

    fn events_for_model(&self, model: &str) -> GlobalCalResult<Vec<StoredEvent>> {
        Ok(self.stored(|e| e.origin.model == model))
    }

    fn events_for_source(&self, source_id: SourceId) -> GlobalCalResult<Vec<StoredEvent>> {
        Ok(self.stored(|e| e.origin.source_id == source_id))
    }

    fn all_events(&self) -> GlobalCalResult<Vec<StoredEvent>> {
        Ok(self.stored(|_| true))
    }

    fn create_event(&mut self, event: ProjectedEvent) -> GlobalCalResult<EventId> {
        if self.find_by_origin(&event.origin).is_some() {
            return Err(Self::duplicate(&event.origin));
        }

        self.next_event_id += 1;
        let id = self.next_event_id;
        self.events.insert(id, event);
        Ok(id)
    }

    fn update_event(&mut self, id: EventId, event: ProjectedEvent) -> GlobalCalResult<()> {
        if !self.events.contains_key(&id) {
            return Err(GlobalCalError::EventNotFound(id));
        }

        match self.find_by_origin(&event.origin) {
            Some(other) if other != id => Err(Self::duplicate(&event.origin)),
            _ => {
                self.events.insert(id, event);
                Ok(())
            }
        }
    }

    fn delete_events(&mut self, ids: &[EventId]) -> GlobalCalResult<usize> {
        Ok(ids
            .iter()
            .filter(|id| self.events.remove(*id).is_some())
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;
    use crate::value::{FieldType, FieldValue};
    use chrono::NaiveDate;

    fn store_with_tasks(n: i64) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.define_model(ModelSchema::new(
            "project.task",
            vec![FieldDef::new("priority", FieldType::Integer)],
        ));
        // inserted out of order on purpose
        for id in (1..=n).rev() {
            store
                .put_record(
                    "project.task",
                    Record::new(id).with("priority", FieldValue::Integer(id % 3)),
                )
                .unwrap();
        }
        store
    }

    fn event(record_id: i64, source_id: SourceId) -> ProjectedEvent {
        let start = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        ProjectedEvent {
            title: format!("Task {record_id}"),
            start,
            stop: start,
            all_day: false,
            owner_ids: vec![],
            visible_to_everyone: false,
            origin: OriginKey::new("project.task", record_id, source_id),
            background: HexColor::default_background(),
            text_color: HexColor::white(),
            legacy_color_index: 0,
        }
    }

    #[test]
    fn test_search_pages_in_id_order() {
        let store = store_with_tasks(7);
        let mut page = Page::first(3);
        let mut seen = Vec::new();
        loop {
            let batch = store.search("project.task", &Domain::All, page).unwrap();
            if batch.is_empty() {
                break;
            }
            seen.extend(batch.iter().map(|r| r.id));
            page = page.next();
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_search_applies_domain() {
        let store = store_with_tasks(7);
        let domain = Domain::parse("[('priority', '=', 0)]").unwrap();
        let ids: Vec<i64> = store
            .search("project.task", &domain, Page::first(100))
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![3, 6]);
    }

    #[test]
    fn test_search_unknown_model() {
        let store = MemoryStore::new();
        let err = store
            .search("crm.lead", &Domain::All, Page::first(10))
            .unwrap_err();
        assert!(matches!(err, GlobalCalError::ModelNotFound(_)));
    }

    #[test]
    fn test_create_enforces_origin_uniqueness() {
        let mut store = MemoryStore::new();
        store.create_event(event(1, 1)).unwrap();
        store.create_event(event(1, 2)).unwrap();
        let err = store.create_event(event(1, 1)).unwrap_err();
        assert!(matches!(err, GlobalCalError::DuplicateEvent { .. }));
        assert_eq!(store.event_count(), 2);
    }

    #[test]
    fn test_update_enforces_origin_uniqueness() {
        let mut store = MemoryStore::new();
        let first = store.create_event(event(1, 1)).unwrap();
        let second = store.create_event(event(2, 1)).unwrap();

        store.update_event(first, event(1, 1)).unwrap();
        assert!(matches!(
            store.update_event(second, event(1, 1)),
            Err(GlobalCalError::DuplicateEvent { .. })
        ));
        assert!(matches!(
            store.update_event(99, event(3, 1)),
            Err(GlobalCalError::EventNotFound(99))
        ));
    }

    #[test]
    fn test_delete_ignores_unknown_ids() {
        let mut store = MemoryStore::new();
        let id = store.create_event(event(1, 1)).unwrap();
        assert_eq!(store.delete_events(&[id, 42]).unwrap(), 1);
        assert_eq!(store.event_count(), 0);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = store_with_tasks(2);
        store.create_event(event(1, 1)).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.event_count(), 1);
        assert_eq!(loaded.event(1).unwrap().origin.record_id, 1);
        assert_eq!(
            loaded.search("project.task", &Domain::All, Page::first(10)).unwrap().len(),
            2
        );

        let mut reloaded = loaded;
        assert_eq!(reloaded.create_event(event(2, 1)).unwrap(), 2);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.event_count(), 0);
    }
}
