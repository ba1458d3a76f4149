//! groundqa-vector
//!
//! LanceDB-backed `VectorIndex`, the directory `Indexer` (with its advisory
//! index lock) and the `Retriever`.
use anyhow::Result;
use std::path::Path;

use groundqa_core::traits::Embedder;

pub mod indexer;
pub mod loader;
pub mod lock;
pub mod retriever;
pub mod schema;
pub mod table;

pub use indexer::{DocumentFailure, DocumentOutcome, IndexOptions, IndexStats, Indexer};
pub use lock::IndexLock;
pub use retriever::Retriever;
pub use table::LanceVectorIndex;

/// Open (or create) the LanceDB index at `index_dir` and index `docs_dir` into `table`.
pub fn build_index(docs_dir: &Path, index_dir: &Path, table: &str, embedder: &dyn Embedder, options: IndexOptions) -> Result<IndexStats> {
	let index = LanceVectorIndex::open(index_dir, table)?;
	Indexer::new(embedder, &index, options)?.build(docs_dir, index_dir)
}
