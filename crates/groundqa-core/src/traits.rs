use crate::error::Error;
use crate::types::{IndexEntry, RetrievalHit};

/// Maps text to fixed-dimension, L2-normalised vectors.
///
/// Implementations must be order-preserving and deterministic for a given
/// `model_id`.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model, recorded in chunk metadata.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// `embed_batch` plus a check of the provider contract (one vector per
    /// input, each of width `dim`).
    fn embed_checked(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let vectors = self.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!("expected {} vectors, got {}", texts.len(), vectors.len())).into());
        }
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim()) {
            return Err(Error::Embedding(format!("dim mismatch: got {} expected {}", v.len(), self.dim())).into());
        }
        Ok(vectors)
    }

    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vectors = self.embed_checked(&[text.to_string()])?;
        vectors.pop().ok_or_else(|| Error::Embedding("no vector returned".into()).into())
    }
}

/// Keyed store of `(vector, text, metadata)` entries with nearest-neighbour lookup.
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite by chunk id.
    fn upsert(&self, entries: &[IndexEntry]) -> anyhow::Result<()>;
    /// The `k` nearest entries, best first. Ties keep the store's native order.
    fn query(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<RetrievalHit>>;
    fn count(&self) -> anyhow::Result<usize>;
    /// Delete entries of `source` whose ordinal is `>= from_ordinal`; returns how many went.
    fn prune_from(&self, source: &str, from_ordinal: usize) -> anyhow::Result<usize>;
}
