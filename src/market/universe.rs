// src/market/universe.rs
use crate::config::UniverseConfig;
use crate::connectors::traits::UniverseSource;
use crate::types::Symbol;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Resolves the symbols to scan. Never fails: provider trouble falls back to
/// a static list. Not cached, so index rebalances show up on the next pass.
pub struct UniverseResolver {
    source: Arc<dyn UniverseSource>,
    index_id: String,
    fallback: Vec<Symbol>,
    always_watch: Vec<Symbol>,
}

impl UniverseResolver {
    pub fn new(source: Arc<dyn UniverseSource>, index_id: &str, config: &UniverseConfig) -> Self {
        let symbols = |codes: &[String]| -> Vec<Symbol> { codes.iter().map(|c| Symbol::new(c.trim())).collect() };
        Self {
            source,
            index_id: index_id.to_string(),
            fallback: symbols(&config.fallback),
            always_watch: symbols(&config.always_watch),
        }
    }

    pub async fn resolve(&self) -> Vec<Symbol> {
        let base = match self.source.index_constituents(&self.index_id).await {
            Ok(list) if !list.is_empty() => {
                info!(index = %self.index_id, count = list.len(), "Index constituents loaded");
                list
            }
            Ok(_) => {
                warn!(index = %self.index_id, "Index returned no constituents, using fallback list");
                self.fallback.clone()
            }
            Err(e) => {
                warn!(index = %self.index_id, error = %e, "Index lookup failed, using fallback list");
                self.fallback.clone()
            }
        };

        merge_unique(base, &self.always_watch)
    }
}

/// `base` first, then unseen `extra` symbols, each symbol once.
pub fn merge_unique(base: Vec<Symbol>, extra: &[Symbol]) -> Vec<Symbol> {
    let mut seen = HashSet::with_capacity(base.len() + extra.len());
    base.into_iter()
        .chain(extra.iter().cloned())
        .filter(|symbol| seen.insert(symbol.clone()))
        .collect()
}
