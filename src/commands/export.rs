use std::path::Path;

use anyhow::{Context, Result};
use globalcal_core::ics::generate_ics;

use super::Workspace;
use super::events::selected_events;

pub fn run(workspace: &Workspace, file: &Path, source: Option<u64>) -> Result<()> {
    let events = selected_events(workspace, source)?;
    let ics = generate_ics(&events);

    std::fs::write(file, ics).with_context(|| format!("Could not write {}", file.display()))?;

    println!(
        "Exported {} {} to {}",
        events.len(),
        if events.len() == 1 { "event" } else { "events" },
        file.display()
    );

    Ok(())
}
