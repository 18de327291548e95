use anyhow::Result;

use super::{Workspace, require_sources};
use crate::render::Render;

pub fn run(workspace: &Workspace) -> Result<()> {
    require_sources(workspace)?;

    for source in workspace.registry.sources() {
        println!("{}", source.render());
    }

    Ok(())
}
