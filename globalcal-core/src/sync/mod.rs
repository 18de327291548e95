//! Reconciliation of projected events with their source records.
//!
//! One pass over one source:
//! 1. index the model's existing projected events by origin record id
//! 2. scan matching records in id order, page by page
//! 3. overwrite the event of every record with a start, or create it
//! 4. delete the model's events whose record was not seen
//!
//! Configuration problems abort the pass before anything is written. Value
//! problems on a single record degrade that record's projection only.

mod projection;
mod stats;

pub use projection::Projector;
pub use stats::{SyncAction, SyncStats};

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::Domain;
use crate::error::{GlobalCalError, GlobalCalResult};
use crate::event::EventId;
use crate::mapping::resolve_slots;
use crate::source::{SourceConfig, SourceId};
use crate::store::{Page, RecordStore};

/// Runs sync passes against a record store.
pub struct Reconciler<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
    owner_model: &'a str,
}

/// Existing event currently standing for an origin record.
#[derive(Debug, Clone, Copy)]
struct Existing {
    id: EventId,
    source_id: SourceId,
}

impl<'a, S: RecordStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a mut S, owner_model: &'a str) -> Self {
        Reconciler { store, owner_model }
    }

    /// Reconcile the projected events of `source` with its records and
    /// stamp `source.last_sync`.
    ///
    /// Existing events are matched per model, not per source: an event
    /// projected by another source for the same record is taken over, and
    /// events of other sources on the same model are deleted when their
    /// record is not part of this scan.
    #[tracing::instrument(
        level = "debug",
        skip(self, source),
        fields(source_id = source.id, model = %source.model)
    )]
    pub fn sync(&mut self, source: &mut SourceConfig) -> GlobalCalResult<SyncStats> {
        source.validate()?;

        let schema = self.store.schema(&source.model).ok_or_else(|| {
            GlobalCalError::Configuration(format!(
                "Model '{}' of source '{}' does not exist",
                source.model, source.name
            ))
        })?;
        let slots = resolve_slots(source, &schema, self.owner_model)?;
        let domain = Domain::compile(&source.domain, &schema)?;

        let previous = self.store.events_for_model(&source.model)?;
        let mut existing: HashMap<i64, Existing> = HashMap::with_capacity(previous.len());
        for stored in &previous {
            let candidate = Existing {
                id: stored.id,
                source_id: stored.event.origin.source_id,
            };
            // prefer this source's own event when several share a record
            existing
                .entry(stored.event.origin.record_id)
                .and_modify(|current| {
                    if current.source_id != source.id && candidate.source_id == source.id {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }

        let projector = Projector::new(source, &slots);
        let mut stats = SyncStats::default();
        let mut seen: HashSet<i64> = HashSet::new();
        let mut page = Page::first(source.scan_batch_size());

        loop {
            let batch = self.store.search(&source.model, &domain, page)?;
            if batch.is_empty() {
                break;
            }

            for record in &batch {
                let Some(event) = projector.project(record) else {
                    stats.skipped += 1;
                    continue;
                };

                match existing.get(&record.id) {
                    Some(current) => {
                        self.store.update_event(current.id, event)?;
                        stats.record(SyncAction::Update);
                        debug!(record_id = record.id, event_id = current.id, "updated");
                    }
                    None => {
                        let id = self.store.create_event(event)?;
                        existing.insert(
                            record.id,
                            Existing {
                                id,
                                source_id: source.id,
                            },
                        );
                        stats.record(SyncAction::Create);
                        debug!(record_id = record.id, event_id = id, "created");
                    }
                }

                seen.insert(record.id);
            }

            if batch.len() < page.limit {
                break;
            }
            page = page.next();
        }

        let stale: Vec<EventId> = previous
            .iter()
            .filter(|stored| !seen.contains(&stored.event.origin.record_id))
            .map(|stored| stored.id)
            .collect();
        stats.deleted = self.store.delete_events(&stale)?;

        source.last_sync = Some(Utc::now());

        info!(
            source_id = source.id,
            model = %source.model,
            created = stats.created,
            updated = stats.updated,
            deleted = stats.deleted,
            skipped = stats.skipped,
            "sync finished"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, ModelSchema};
    use crate::store::MemoryStore;
    use crate::value::{FieldType, FieldValue, Record, RecordRef};
    use chrono::NaiveDate;

    const USERS: &str = "res.users";

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.define_model(ModelSchema::new(
            "crm.lead",
            vec![
                FieldDef::new("name", FieldType::Char),
                FieldDef::new("date_deadline", FieldType::Date),
                FieldDef::new("stage", FieldType::Char),
                FieldDef::relation("user_id", FieldType::Many2one, USERS),
            ],
        ));
        for id in 1..=5 {
            store.put_record("crm.lead", lead(id, "open")).unwrap();
        }
        store
    }

    fn lead(id: i64, stage: &str) -> Record {
        Record::new(id)
            .with("name", FieldValue::Text(format!("Lead {id}")))
            .with("stage", FieldValue::Text(stage.into()))
            .with(
                "date_deadline",
                FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, id as u32).unwrap()),
            )
            .with("user_id", FieldValue::Ref(RecordRef::new(id % 2 + 1, "User")))
    }

    fn source() -> SourceConfig {
        let mut source = SourceConfig::new(1, "Leads", "crm.lead", "date_deadline");
        source.title_field = Some("name".into());
        source.owner_single_field = Some("user_id".into());
        source.batch_size = 2;
        source
    }

    #[test]
    fn test_first_pass_creates_every_event() {
        let mut store = store();
        let mut source = source();

        let stats = Reconciler::new(&mut store, USERS).sync(&mut source).unwrap();

        assert_eq!(stats.created, 5);
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.deleted, 0);
        assert_eq!(store.event_count(), 5);
        assert!(source.last_sync.is_some());
    }

    #[test]
    fn test_second_pass_updates_in_place() {
        let mut store = store();
        let mut source = source();
        Reconciler::new(&mut store, USERS).sync(&mut source).unwrap();
        let before = store.all_events().unwrap();

        let stats = Reconciler::new(&mut store, USERS).sync(&mut source).unwrap();

        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 5);
        assert_eq!(store.all_events().unwrap(), before);
    }

    #[test]
    fn test_record_losing_start_is_deleted() {
        let mut store = store();
        let mut source = source();
        Reconciler::new(&mut store, USERS).sync(&mut source).unwrap();

        store
            .record_mut("crm.lead", 2)
            .unwrap()
            .values
            .insert("date_deadline".into(), FieldValue::Null);

        let stats = Reconciler::new(&mut store, USERS).sync(&mut source).unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(store.event_count(), 4);
    }

    #[test]
    fn test_invalid_domain_fails_before_writing() {
        let mut store = store();
        let mut source = source();
        source.domain = "[('stage', '=', 'open')".into();

        let err = Reconciler::new(&mut store, USERS).sync(&mut source).unwrap_err();
        assert!(matches!(err, GlobalCalError::Configuration(_)));
        assert_eq!(store.event_count(), 0);
        assert!(source.last_sync.is_none());
    }

    #[test]
    fn test_missing_model_is_configuration_error() {
        let mut store = store();
        let mut source = source();
        source.model = "sale.order".into();

        let err = Reconciler::new(&mut store, USERS).sync(&mut source).unwrap_err();
        assert!(matches!(err, GlobalCalError::Configuration(_)));
    }

    #[test]
    fn test_takes_over_event_of_other_source_on_same_model() {
        let mut store = store();
        let mut first = source();
        Reconciler::new(&mut store, USERS).sync(&mut first).unwrap();

        let mut second = source();
        second.id = 2;
        second.domain = "[('id', '<=', 2)]".into();
        let stats = Reconciler::new(&mut store, USERS).sync(&mut second).unwrap();

        // records 1-2 move to source 2, events of records 3-5 disappear
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.deleted, 3);
        let events = store.all_events().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event.origin.source_id == 2));
    }
}
