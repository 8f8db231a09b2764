//! Per-title cache of gene-map analyses.
//!
//! Entries live in the shared [`KeyValueStore`] under
//! `analysis_cache_<title>` as serialized JSON. A parseable entry is
//! authoritative and never refreshed automatically; an unparseable one is
//! deleted the moment it is read.

use crate::analysis::{Analysis, Analyst};
use crate::api::ChatCompletion;
use crate::error::Result;
use crate::models::GeneMapAnalysis;
use crate::store::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const CACHE_KEY_PREFIX: &str = "analysis_cache_";

pub fn cache_key(title: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{title}")
}

#[derive(Clone)]
pub struct AnalysisCache {
    store: Arc<dyn KeyValueStore>,
}

impl AnalysisCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Look up a cached analysis. Corrupt entries are removed and reported absent.
    pub fn get(&self, title: &str) -> Option<GeneMapAnalysis> {
        let key = cache_key(title);
        let raw = self.store.get(&key)?;
        match serde_json::from_str::<GeneMapAnalysis>(&raw) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!(%title, error = %e, "Discarding corrupt cache entry");
                if let Err(e) = self.store.remove(&key) {
                    warn!(%title, error = %e, "Failed to remove corrupt cache entry");
                }
                None
            }
        }
    }

    /// Store an analysis, overwriting whatever was there.
    pub fn put(&self, title: &str, analysis: &GeneMapAnalysis) -> Result<()> {
        let json = serde_json::to_string(analysis)?;
        self.store.set(&cache_key(title), &json)
    }

    pub fn invalidate(&self, title: &str) -> Result<()> {
        self.store.remove(&cache_key(title))
    }

    /// Titles that currently have an entry (parseable or not).
    pub fn titles(&self) -> Vec<String> {
        self.store
            .keys_with_prefix(CACHE_KEY_PREFIX)
            .into_iter()
            .map(|k| k[CACHE_KEY_PREFIX.len()..].to_string())
            .collect()
    }
}

/// Where a per-item analysis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Cache,
    Fresh,
    Fallback,
}

/// Cache-first per-item analysis.
///
/// A cache hit never calls the analyst. A fresh analysis is written back;
/// the fallback record is not, so the next call retries the service.
/// Only [`crate::error::Error::MissingCredential`] escapes.
#[instrument(level = "info", skip(cache, analyst))]
pub async fn analyze_cached<C: ChatCompletion>(
    cache: &AnalysisCache,
    analyst: &Analyst<C>,
    title: &str,
) -> Result<(Analysis, Provenance)> {
    if let Some(analysis) = cache.get(title) {
        debug!("Cache hit");
        return Ok((
            Analysis {
                analysis,
                usage: None,
                fallback: false,
            },
            Provenance::Cache,
        ));
    }

    let result = analyst.analyze_item(title).await?;
    if result.fallback {
        return Ok((result, Provenance::Fallback));
    }
    if let Err(e) = cache.put(title, &result.analysis) {
        warn!(error = %e, "Failed to write analysis to cache");
    } else {
        info!("Cached fresh analysis");
    }
    Ok((result, Provenance::Fresh))
}
