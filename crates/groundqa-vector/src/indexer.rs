//! Directory indexing: scan, segment, embed, upsert.
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use groundqa_core::config::IndexSettings;
use groundqa_core::error::Error;
use groundqa_core::segmenter::{chunk, normalize};
use groundqa_core::text::estimate_tokens;
use groundqa_core::traits::{Embedder, VectorIndex};
use groundqa_core::types::{Chunk, ChunkMetadata, IndexEntry};

use crate::loader::{discover_documents, doc_stem, load_document};
use crate::lock::IndexLock;

/// Per-build chunking and batching parameters. The embedding model is whatever
/// `Embedder` the indexer is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
	pub chunk_size: usize,
	pub chunk_overlap: usize,
	pub batch_size: usize,
	pub prune_stale: bool,
}

impl Default for IndexOptions {
	fn default() -> Self { Self { chunk_size: 900, chunk_overlap: 150, batch_size: 128, prune_stale: false } }
}

impl From<&IndexSettings> for IndexOptions {
	fn from(s: &IndexSettings) -> Self {
		Self { chunk_size: s.chunk_size, chunk_overlap: s.chunk_overlap, batch_size: s.batch_size, prune_stale: s.prune_stale }
	}
}

impl IndexOptions {
	pub fn validate(&self) -> Result<(), Error> {
		if self.chunk_size == 0 {
			return Err(Error::InvalidConfig("chunk_size must be at least 1".into()));
		}
		if self.chunk_overlap >= self.chunk_size {
			return Err(Error::InvalidConfig(format!("chunk_overlap ({}) must be smaller than chunk_size ({})", self.chunk_overlap, self.chunk_size)));
		}
		if self.batch_size == 0 {
			return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
	pub path: PathBuf,
	pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
	pub documents_seen: usize,
	pub documents_indexed: usize,
	/// Empty after normalisation.
	pub documents_skipped: usize,
	pub chunks_written: usize,
	pub pruned: usize,
	pub avg_tokens_per_chunk: f64,
	pub failures: Vec<DocumentFailure>,
}

/// What happened to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
	Skipped,
	Indexed { chunks: usize, tokens: usize, pruned: usize },
}

pub struct Indexer<'a> {
	embedder: &'a dyn Embedder,
	index: &'a dyn VectorIndex,
	options: IndexOptions,
}

impl<'a> Indexer<'a> {
	pub fn new(embedder: &'a dyn Embedder, index: &'a dyn VectorIndex, options: IndexOptions) -> Result<Self> {
		options.validate()?;
		Ok(Self { embedder, index, options })
	}

	/// Index every supported document under `docs_dir` while holding the lock on
	/// `index_dir`. A failing document is recorded in `IndexStats::failures` and the
	/// run moves on; batches already written stay written.
	pub fn build(&self, docs_dir: &Path, index_dir: &Path) -> Result<IndexStats> {
		let _lock = IndexLock::acquire(index_dir)?;
		let start = Instant::now();
		let docs = discover_documents(docs_dir);
		if docs.is_empty() {
			tracing::warn!(dir = %docs_dir.display(), "No supported documents found");
		}
		tracing::info!(
			documents = docs.len(),
			model = self.embedder.model_id(),
			chunk_size = self.options.chunk_size,
			chunk_overlap = self.options.chunk_overlap,
			"Indexing documents"
		);

		let pb = ProgressBar::new(docs.len() as u64);
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")?.progress_chars("#>-"));

		let mut stats = IndexStats::default();
		let mut total_tokens = 0usize;
		for path in &docs {
			stats.documents_seen += 1;
			pb.set_message(doc_stem(path));
			match self.index_document(path) {
				Ok(DocumentOutcome::Skipped) => {
					tracing::debug!(path = %path.display(), "Skipping empty document");
					stats.documents_skipped += 1;
				}
				Ok(DocumentOutcome::Indexed { chunks, tokens, pruned }) => {
					stats.documents_indexed += 1;
					stats.chunks_written += chunks;
					stats.pruned += pruned;
					total_tokens += tokens;
				}
				Err(e) => {
					let error = format!("{e:#}");
					tracing::warn!(path = %path.display(), error = %error, "Failed to index document");
					stats.failures.push(DocumentFailure { path: path.clone(), error });
				}
			}
			pb.inc(1);
		}
		pb.finish_and_clear();

		if stats.chunks_written > 0 {
			stats.avg_tokens_per_chunk = total_tokens as f64 / stats.chunks_written as f64;
		}
		tracing::info!(
			indexed = stats.documents_indexed,
			skipped = stats.documents_skipped,
			failed = stats.failures.len(),
			chunks = stats.chunks_written,
			avg_tokens = stats.avg_tokens_per_chunk,
			elapsed_ms = start.elapsed().as_millis() as u64,
			"Indexing finished"
		);
		Ok(stats)
	}

	/// Load, segment, embed (one call for the whole document) and upsert in
	/// `batch_size` slices. Does not take the index lock.
	pub fn index_document(&self, path: &Path) -> Result<DocumentOutcome> {
		let text = load_document(path)?;
		if normalize(&text).trim().is_empty() {
			return Ok(DocumentOutcome::Skipped);
		}
		let chunks = self.prepare_chunks(path, &text);
		if chunks.is_empty() {
			return Ok(DocumentOutcome::Skipped);
		}

		let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
		let vectors = self.embedder.embed_checked(&texts)?;
		let tokens = chunks.iter().map(|c| c.metadata.tokens_est).sum();
		let entries: Vec<IndexEntry> = chunks.into_iter().zip(vectors).map(|(chunk, vector)| IndexEntry { chunk, vector }).collect();

		let source = path.to_string_lossy().to_string();
		for (batch, slice) in entries.chunks(self.options.batch_size).enumerate() {
			self.index.upsert(slice).map_err(|e| Error::Upsert { doc: source.clone(), batch, reason: format!("{e:#}") })?;
			tracing::debug!(doc = %source, batch, rows = slice.len(), "Upserted batch");
		}

		let pruned = if self.options.prune_stale { self.index.prune_from(&source, entries.len())? } else { 0 };
		if pruned > 0 {
			tracing::info!(doc = %source, pruned, "Pruned stale trailing chunks");
		}
		Ok(DocumentOutcome::Indexed { chunks: entries.len(), tokens, pruned })
	}

	/// Chunks of one document with ids and metadata filled in.
	pub fn prepare_chunks(&self, path: &Path, text: &str) -> Vec<Chunk> {
		let stem = doc_stem(path);
		let source = path.to_string_lossy().to_string();
		chunk(text, self.options.chunk_size, self.options.chunk_overlap)
			.into_iter()
			.enumerate()
			.map(|(ordinal, text)| {
				let metadata = ChunkMetadata {
					source: source.clone(),
					chunk_index: ordinal,
					char_count: text.chars().count(),
					tokens_est: estimate_tokens(&text),
					content_hash: blake3::hash(text.as_bytes()).to_hex().to_string(),
					embed_model: self.embedder.model_id().to_string(),
					chunk_size: self.options.chunk_size,
					chunk_overlap: self.options.chunk_overlap,
				};
				Chunk { id: Chunk::make_id(&stem, ordinal), text, metadata }
			})
			.collect()
	}
}
