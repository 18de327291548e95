//! Building the projected event of one source record.

use tracing::warn;

use crate::color::{HexColor, effective_background, fallback_seed, legacy_index, text_color_for};
use crate::event::{OriginKey, ProjectedEvent};
use crate::mapping::{Slot, SlotMap};
use crate::source::SourceConfig;
use crate::temporal::resolve_window;
use crate::value::Record;

/// Projects records of one source. Colors that only depend on the source
/// are derived once per pass.
pub struct Projector<'a> {
    source: &'a SourceConfig,
    slots: &'a SlotMap,
    background: HexColor,
    text_color: HexColor,
}

impl<'a> Projector<'a> {
    pub fn new(source: &'a SourceConfig, slots: &'a SlotMap) -> Self {
        let background = effective_background(source.color_hex.as_deref());
        let text_color = text_color_for(&background);
        Projector {
            source,
            slots,
            background,
            text_color,
        }
    }

    /// `None` when the record has no resolvable start.
    pub fn project(&self, record: &Record) -> Option<ProjectedEvent> {
        let start = read_or_absorb(Some(&self.slots.start), record);
        let stop = read_or_absorb(self.slots.stop.as_ref(), record);
        let duration = read_or_absorb(self.slots.duration.as_ref(), record);

        let window = resolve_window(start, stop, duration)?;

        let title = read_or_absorb(self.slots.title.as_ref(), record)
            .unwrap_or_else(|| record.label(&self.source.model));

        let owner_ids = self.owners(record);
        let visible_to_everyone = owner_ids.is_empty() && self.source.visible_to_everyone_fallback;
        let legacy_color_index = legacy_index(
            self.source.color_index,
            fallback_seed(owner_ids.first().copied(), &self.source.model),
        );

        Some(ProjectedEvent {
            title,
            start: window.start,
            stop: window.stop,
            all_day: window.all_day,
            owner_ids,
            visible_to_everyone,
            origin: OriginKey::new(&self.source.model, record.id, self.source.id),
            background: self.background.clone(),
            text_color: self.text_color.clone(),
            legacy_color_index,
        })
    }

    /// Union of the single and multi owner slots, sorted and deduplicated.
    fn owners(&self, record: &Record) -> Vec<i64> {
        let mut owners: Vec<i64> = read_or_absorb(self.slots.owner_single.as_ref(), record)
            .into_iter()
            .collect();
        owners.extend(
            read_or_absorb(self.slots.owner_many.as_ref(), record)
                .unwrap_or_default(),
        );
        owners.sort_unstable();
        owners.dedup();
        owners
    }
}

/// Read a slot, degrading a value error to "absent".
fn read_or_absorb<T>(slot: Option<&Slot<T>>, record: &Record) -> Option<T> {
    let slot = slot?;
    match slot.read(record) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                record_id = record.id,
                field = slot.field(),
                role = %slot.role(),
                error = %e,
                "unreadable value, using fallback"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::resolve_slots;
    use crate::schema::{FieldDef, ModelSchema};
    use crate::temporal::parse_datetime_text;
    use crate::value::{FieldType, FieldValue, RecordRef};

    const USERS: &str = "res.users";

    fn schema() -> ModelSchema {
        ModelSchema::new(
            "project.task",
            vec![
                FieldDef::new("name", FieldType::Char),
                FieldDef::new("date_start", FieldType::Datetime),
                FieldDef::new("planned_hours", FieldType::Float),
                FieldDef::relation("user_id", FieldType::Many2one, USERS),
                FieldDef::relation("user_ids", FieldType::Many2many, USERS),
            ],
        )
    }

    fn source() -> SourceConfig {
        let mut source = SourceConfig::new(5, "Tasks", "project.task", "date_start");
        source.title_field = Some("name".into());
        source.duration_field = Some("planned_hours".into());
        source.owner_single_field = Some("user_id".into());
        source.owner_many_field = Some("user_ids".into());
        source
    }

    fn task(id: i64) -> Record {
        Record::new(id).with(
            "date_start",
            FieldValue::Datetime(parse_datetime_text("2024-01-10 09:00:00").unwrap()),
        )
    }

    #[test]
    fn test_project_full_record() {
        let source = source();
        let slots = resolve_slots(&source, &schema(), USERS).unwrap();
        let projector = Projector::new(&source, &slots);

        let record = task(3)
            .with("name", FieldValue::Text("Write report".into()))
            .with("planned_hours", FieldValue::Float(2.5))
            .with("user_id", FieldValue::Ref(RecordRef::new(9, "B")))
            .with(
                "user_ids",
                FieldValue::Refs(vec![RecordRef::new(9, "B"), RecordRef::new(4, "A")]),
            );

        let event = projector.project(&record).unwrap();
        assert_eq!(event.title, "Write report");
        assert_eq!(event.stop, parse_datetime_text("2024-01-10 11:30:00").unwrap());
        assert!(!event.all_day);
        assert_eq!(event.owner_ids, vec![4, 9]);
        assert_eq!(event.primary_owner(), Some(4));
        assert!(!event.visible_to_everyone);
        assert_eq!(event.origin, OriginKey::new("project.task", 3, 5));
        assert_eq!(event.legacy_color_index, 4);
        assert_eq!(event.background.as_str(), "#3A53BB");
        assert_eq!(event.text_color.as_str(), "#FFFFFF");
    }

    #[test]
    fn test_visibility_fallback_only_without_owners() {
        let mut source = source();
        source.visible_to_everyone_fallback = true;
        let slots = resolve_slots(&source, &schema(), USERS).unwrap();
        let projector = Projector::new(&source, &slots);

        assert!(projector.project(&task(1)).unwrap().visible_to_everyone);

        let owned = task(2).with("user_id", FieldValue::Ref(RecordRef::new(1, "Admin")));
        assert!(!projector.project(&owned).unwrap().visible_to_everyone);
    }

    #[test]
    fn test_bad_duration_degrades_to_instant() {
        let source = source();
        let slots = resolve_slots(&source, &schema(), USERS).unwrap();
        let projector = Projector::new(&source, &slots);

        let record = task(1).with("planned_hours", FieldValue::Text("a while".into()));
        let event = projector.project(&record).unwrap();
        assert_eq!(event.stop, event.start);
    }

    #[test]
    fn test_title_falls_back_to_label() {
        let source = source();
        let slots = resolve_slots(&source, &schema(), USERS).unwrap();
        let projector = Projector::new(&source, &slots);

        let event = projector.project(&task(8).with_display_name("T-8")).unwrap();
        assert_eq!(event.title, "T-8");

        let event = projector.project(&task(8)).unwrap();
        assert_eq!(event.title, "project.task #8");
    }

    #[test]
    fn test_explicit_colors_and_index() {
        let mut source = source();
        source.color_hex = Some("#ffff00".into());
        source.color_index = Some(13);
        let slots = resolve_slots(&source, &schema(), USERS).unwrap();
        let projector = Projector::new(&source, &slots);

        let event = projector.project(&task(1)).unwrap();
        assert_eq!(event.background.as_str(), "#FFFF00");
        assert_eq!(event.text_color.as_str(), "#000000");
        assert_eq!(event.legacy_color_index, 1);
    }

    #[test]
    fn test_no_start_projects_nothing() {
        let source = source();
        let slots = resolve_slots(&source, &schema(), USERS).unwrap();
        let projector = Projector::new(&source, &slots);
        assert!(projector.project(&Record::new(1)).is_none());
    }
}
