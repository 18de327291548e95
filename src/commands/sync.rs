use anyhow::Result;
use owo_colors::OwoColorize;

use super::{Workspace, require_sources};
use crate::render::Render;

pub fn run(mut workspace: Workspace, source: Option<u64>) -> Result<()> {
    require_sources(&workspace)?;

    let owner_model = workspace.config.owner_model.clone();

    match source {
        Some(id) => {
            let stats = workspace
                .registry
                .sync_one(&mut workspace.store, &owner_model, id);

            // events written before a failure are kept
            workspace.save()?;

            let stats = stats?;
            if let Some(source) = workspace.registry.get(id) {
                println!("{}", source.render());
            }
            println!("{}", stats.render());
        }
        None => {
            let report = workspace
                .registry
                .sync_all_active(&mut workspace.store, &owner_model);
            workspace.save()?;

            if report.outcomes.is_empty() {
                println!("{}", "No active sources".dimmed());
                return Ok(());
            }

            println!("{}", report.render());

            let failed = report.failures().count();
            if failed > 0 {
                anyhow::bail!("{} of {} sources failed", failed, report.outcomes.len());
            }
        }
    }

    Ok(())
}
