pub mod bootstrap;
pub mod events;
pub mod export;
pub mod sources;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use globalcal_core::config::GlobalConfig;
use globalcal_core::registry::SourceRegistry;
use globalcal_core::store::MemoryStore;

/// Everything a command works on, loaded once per invocation.
pub struct Workspace {
    pub config: GlobalConfig,
    pub registry: SourceRegistry,
    pub store: MemoryStore,
    pub sources_path: PathBuf,
    pub store_path: PathBuf,
}

impl Workspace {
    pub fn load(store_path: Option<PathBuf>, sources_path: Option<PathBuf>) -> Result<Self> {
        let config = GlobalConfig::load()?;

        let store_path = store_path.unwrap_or_else(|| config.store_path());
        let sources_path = sources_path.unwrap_or_else(|| config.sources_path());

        let store = MemoryStore::load(&store_path)
            .with_context(|| format!("Could not load record store {}", store_path.display()))?;
        let registry = SourceRegistry::load(&sources_path)
            .with_context(|| format!("Could not load sources {}", sources_path.display()))?;

        Ok(Workspace {
            config,
            registry,
            store,
            sources_path,
            store_path,
        })
    }

    /// Write registry and store back.
    pub fn save(&self) -> Result<()> {
        self.registry.save(&self.sources_path)?;
        self.store.save(&self.store_path)?;
        Ok(())
    }
}

/// Shared error message for an empty registry
pub fn require_sources(workspace: &Workspace) -> Result<()> {
    if workspace.registry.sources().is_empty() {
        anyhow::bail!(
            "No sources configured.\n\n\
            Create the default ones with:\n  \
            globalcal bootstrap\n\n\
            or add [[sources]] entries to {}",
            workspace.sources_path.display()
        );
    }
    Ok(())
}
