//! Source registry: holds every source configuration and runs sync passes
//! over one or all of them.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bootstrap::CATALOG;
use crate::error::{GlobalCalError, GlobalCalResult};
use crate::source::{SourceConfig, SourceId};
use crate::store::RecordStore;
use crate::sync::{Reconciler, SyncStats};

/// Persisted as `sources.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRegistry {
    #[serde(default)]
    sources: Vec<SourceConfig>,
}

/// Outcome of one source within a sweep.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source_id: SourceId,
    pub name: String,
    pub result: GlobalCalResult<SyncStats>,
}

/// Outcome of `sync_all_active`.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl SweepReport {
    /// Sum of the stats of every source that synced.
    pub fn totals(&self) -> SyncStats {
        let mut totals = SyncStats::default();
        for outcome in &self.outcomes {
            if let Ok(stats) = &outcome.result {
                totals += *stats;
            }
        }
        totals
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SourceOutcome, &GlobalCalError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry, or an empty one if the file does not exist.
    ///
    /// Sources are not validated here: an invalid source fails its own sync
    /// pass and leaves the others alone.
    pub fn load(path: &Path) -> GlobalCalResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let registry: SourceRegistry = toml::from_str(&content)
            .map_err(|e| GlobalCalError::Configuration(format!("{}: {}", path.display(), e)))?;

        let mut ids = HashSet::with_capacity(registry.sources.len());
        for source in &registry.sources {
            if !ids.insert(source.id) {
                return Err(GlobalCalError::Configuration(format!(
                    "{}: source id {} is used more than once",
                    path.display(),
                    source.id
                )));
            }
        }

        Ok(registry)
    }

    pub fn save(&self, path: &Path) -> GlobalCalResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GlobalCalError::Serialization(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Sources in `(sequence, id)` order.
    pub fn sources(&self) -> Vec<&SourceConfig> {
        let mut sources: Vec<&SourceConfig> = self.sources.iter().collect();
        sources.sort_by_key(|s| (s.sequence, s.id));
        sources
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.sources.iter().any(|s| s.model == model)
    }

    /// Validate and add a source, assigning it the next free id.
    pub fn add(&mut self, mut source: SourceConfig) -> GlobalCalResult<SourceId> {
        source.validate()?;
        source.id = self.sources.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let id = source.id;
        info!(source_id = id, name = %source.name, model = %source.model, "source added");
        self.sources.push(source);
        Ok(id)
    }

    pub fn remove(&mut self, id: SourceId) -> GlobalCalResult<SourceConfig> {
        let index = self
            .sources
            .iter()
            .position(|s| s.id == id)
            .ok_or(GlobalCalError::SourceNotFound(id))?;
        Ok(self.sources.remove(index))
    }

    /// Run one sync pass for `id`. Configuration errors are returned as is.
    #[tracing::instrument(level = "debug", skip(self, store))]
    pub fn sync_one<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        owner_model: &str,
        id: SourceId,
    ) -> GlobalCalResult<SyncStats> {
        let source = self
            .sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(GlobalCalError::SourceNotFound(id))?;

        Reconciler::new(store, owner_model).sync(source)
    }

    /// Sync every active source in `(sequence, id)` order. A failing source
    /// is reported and the sweep moves on.
    #[tracing::instrument(level = "debug", skip(self, store))]
    pub fn sync_all_active<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        owner_model: &str,
    ) -> SweepReport {
        let mut order: Vec<usize> = (0..self.sources.len())
            .filter(|&i| self.sources[i].active)
            .collect();
        order.sort_by_key(|&i| (self.sources[i].sequence, self.sources[i].id));

        let mut report = SweepReport::default();
        for i in order {
            let source = &mut self.sources[i];
            let result = Reconciler::new(&mut *store, owner_model).sync(source);

            if let Err(e) = &result {
                warn!(source_id = source.id, name = %source.name, error = %e, "source sync failed");
            }

            report.outcomes.push(SourceOutcome {
                source_id: source.id,
                name: source.name.clone(),
                result,
            });
        }

        report
    }

    /// Add the catalog sources whose model is installed and not configured yet.
    /// Returns the ids of the new sources.
    #[tracing::instrument(level = "debug", skip(self, store))]
    pub fn bootstrap_defaults<S: RecordStore + ?Sized>(
        &mut self,
        store: &S,
        owner_model: &str,
        batch_size: usize,
    ) -> GlobalCalResult<Vec<SourceId>> {
        let mut created = Vec::new();

        for candidate in CATALOG {
            let Some(schema) = store.schema(candidate.model) else {
                continue;
            };
            if self.has_model(candidate.model) {
                continue;
            }
            let Some(mut source) = candidate.configure(&schema, owner_model) else {
                continue;
            };

            source.batch_size = batch_size;
            created.push(self.add(source)?);
        }

        Ok(created)
    }
}
