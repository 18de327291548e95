use anyhow::Result;
use globalcal_core::event::StoredEvent;
use globalcal_core::store::RecordStore;
use owo_colors::OwoColorize;

use super::Workspace;
use crate::render::Render;

pub fn run(workspace: &Workspace, source: Option<u64>) -> Result<()> {
    let events = selected_events(workspace, source)?;

    if events.is_empty() {
        println!("{}", "No events".dimmed());
        return Ok(());
    }

    for stored in &events {
        println!("{}", stored.render());
    }

    Ok(())
}

/// Events of one source, or all of them, in start order.
pub fn selected_events(workspace: &Workspace, source: Option<u64>) -> Result<Vec<StoredEvent>> {
    let mut events = match source {
        Some(id) => workspace.store.events_for_source(id)?,
        None => workspace.store.all_events()?,
    };
    events.sort_by(|a, b| {
        a.event
            .start
            .cmp(&b.event.start)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(events)
}
