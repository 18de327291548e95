use anyhow::Result;
use owo_colors::OwoColorize;

use super::Workspace;
use crate::render::Render;

pub fn run(mut workspace: Workspace) -> Result<()> {
    let created = workspace.registry.bootstrap_defaults(
        &workspace.store,
        &workspace.config.owner_model,
        workspace.config.default_batch_size,
    )?;

    if created.is_empty() {
        println!("{}", "Nothing to add, every installed model is configured".dimmed());
        return Ok(());
    }

    workspace.registry.save(&workspace.sources_path)?;

    for id in &created {
        if let Some(source) = workspace.registry.get(*id) {
            println!("{} {}", "+".green(), source.render());
        }
    }

    println!(
        "\nAdded {} {}. Run `globalcal sync` to project their records.",
        created.len(),
        if created.len() == 1 { "source" } else { "sources" }
    );

    Ok(())
}
