//! Query-time nearest-neighbour lookup.
use anyhow::Result;
use std::sync::Arc;

use groundqa_core::error::Error;
use groundqa_core::traits::{Embedder, VectorIndex};
use groundqa_core::types::RetrievalHit;

/// Embeds a query and asks the index for its `k` nearest chunks.
///
/// The embedder must be the one the index was built with; this is not checked.
#[derive(Clone)]
pub struct Retriever {
	embedder: Arc<dyn Embedder>,
	index: Arc<dyn VectorIndex>,
}

impl Retriever {
	pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self { Self { embedder, index } }

	/// Hits best first, in the order the index returns them. An empty index yields
	/// an empty result.
	pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>> {
		if k == 0 {
			return Err(Error::InvalidArgument("k must be at least 1".into()).into());
		}
		if self.index.count()? == 0 {
			tracing::debug!("Index is empty, nothing to retrieve");
			return Ok(Vec::new());
		}
		let vector = self.embedder.embed_one(query)?;
		let hits = self.index.query(&vector, k)?;
		tracing::debug!(k, hits = hits.len(), "Retrieved");
		Ok(hits)
	}
}
