//! Process-local `VectorIndex` backed by a vector of entries.
//!
//! Exact cosine search in insertion order; used for tests and throwaway runs
//! where a persistent index is not wanted.
use std::sync::RwLock;

use anyhow::anyhow;

use crate::text::cosine;
use crate::traits::VectorIndex;
use crate::types::{HitMetadata, IndexEntry, RetrievalHit};

#[derive(Default)]
pub struct InMemoryIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryIndex {
    pub fn new() -> Self { Self::default() }

    pub fn ids(&self) -> anyhow::Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        Ok(entries.iter().map(|e| e.chunk.id.clone()).collect())
    }
}

impl VectorIndex for InMemoryIndex {
    fn upsert(&self, batch: &[IndexEntry]) -> anyhow::Result<()> {
        let mut entries = self.entries.write().map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        for entry in batch {
            match entries.iter_mut().find(|e| e.chunk.id == entry.chunk.id) {
                Some(existing) => *existing = entry.clone(),
                None => entries.push(entry.clone()),
            }
        }
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<RetrievalHit>> {
        let entries = self.entries.read().map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        let mut scored: Vec<(f32, &IndexEntry)> = entries.iter().map(|e| (1.0 - cosine(vector, &e.vector), e)).collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, e)| RetrievalHit {
                text: e.chunk.text.clone(),
                metadata: HitMetadata { id: e.chunk.id.clone(), distance, chunk: e.chunk.metadata.clone() },
            })
            .collect())
    }

    fn count(&self) -> anyhow::Result<usize> {
        Ok(self.entries.read().map_err(|_| anyhow!("in-memory index lock poisoned"))?.len())
    }

    fn prune_from(&self, source: &str, from_ordinal: usize) -> anyhow::Result<usize> {
        let mut entries = self.entries.write().map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        let before = entries.len();
        entries.retain(|e| !(e.chunk.metadata.source == source && e.chunk.metadata.chunk_index >= from_ordinal));
        Ok(before - entries.len())
    }
}
