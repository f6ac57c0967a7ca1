//! Cache Registry Module
//!
//! Named engines, one per logical domain, created on first use and kept for
//! the life of the registry. Built once at startup and shared by reference.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::backing::{BackingConfig, BackingStore, BackingTier};
use crate::cache::{CacheEngine, EngineConfig, EngineSettings, StatsSnapshot};

/// Name of the engine that always exists.
pub const DEFAULT_CACHE: &str = "default";

// == Cache Registry ==
/// Owner and sole creator of every named engine.
#[derive(Debug)]
pub struct CacheRegistry {
    engines: RwLock<HashMap<String, Arc<CacheEngine>>>,
    config: EngineConfig,
    backing_store: Option<Arc<dyn BackingStore>>,
    backing_config: BackingConfig,
}

impl CacheRegistry {
    // == Constructors ==
    /// Registry whose engines use `config` and the optional shared store.
    pub fn new(
        config: EngineConfig,
        backing_store: Option<Arc<dyn BackingStore>>,
        backing_config: BackingConfig,
    ) -> Self {
        let registry = Self {
            engines: RwLock::new(HashMap::new()),
            config,
            backing_store,
            backing_config,
        };
        registry.get_or_create(DEFAULT_CACHE);
        registry
    }

    /// Registry without a backing tier.
    pub fn local(config: EngineConfig) -> Self {
        Self::new(config, None, BackingConfig::default())
    }

    fn build(&self, name: &str) -> CacheEngine {
        let backing = match &self.backing_store {
            Some(store) => {
                let prefix = format!("{}{}:", self.backing_config.key_prefix, name);
                BackingTier::new(store.clone(), prefix, &self.backing_config)
            }
            None => BackingTier::none(),
        };
        CacheEngine::new(name, &self.config, backing)
    }

    // == Get Or Create ==
    /// Returns the engine for `name`, creating it on first request.
    ///
    /// Concurrent first requests for the same name get the same engine.
    pub fn get_or_create(&self, name: &str) -> Arc<CacheEngine> {
        if let Some(engine) = self.engines.read().get(name) {
            return engine.clone();
        }

        let mut engines = self.engines.write();
        engines
            .entry(name.to_string())
            .or_insert_with(|| {
                info!("Creating cache '{}'", name);
                Arc::new(self.build(name))
            })
            .clone()
    }

    /// Returns the engine for `name` if it exists.
    pub fn get(&self, name: &str) -> Option<Arc<CacheEngine>> {
        self.engines.read().get(name).cloned()
    }

    pub fn default_cache(&self) -> Arc<CacheEngine> {
        self.get_or_create(DEFAULT_CACHE)
    }

    /// Names of all engines, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn all(&self) -> Vec<Arc<CacheEngine>> {
        self.engines.read().values().cloned().collect()
    }

    // == Global Stats ==
    /// Statistics snapshot of every engine, by name.
    pub fn global_stats(&self) -> BTreeMap<String, StatsSnapshot> {
        self.all()
            .into_iter()
            .map(|engine| (engine.name().to_string(), engine.stats()))
            .collect()
    }

    // == Optimize All ==
    /// Runs a tuning pass on every engine.
    pub fn optimize_all(&self) -> BTreeMap<String, EngineSettings> {
        self.all()
            .into_iter()
            .map(|engine| (engine.name().to_string(), engine.optimize()))
            .collect()
    }

    // == Purge Expired ==
    /// Drops expired entries from every engine. Returns the total removed.
    pub fn purge_expired_all(&self) -> usize {
        self.all().iter().map(|engine| engine.purge_expired()).sum()
    }
}
