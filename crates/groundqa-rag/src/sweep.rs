//! Grid search over indexing and retrieval parameters.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use groundqa_core::traits::{Embedder, VectorIndex};
use groundqa_vector::{IndexOptions, Indexer, LanceVectorIndex};

use crate::eval::round3;
use crate::pipeline::RagPipeline;

pub const DEFAULT_SWEEP_QUESTIONS: &[&str] = &["What is a vector store used for?", "How does retrieval augmented generation work?"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSpace {
	pub embed_models: Vec<String>,
	pub chunk_sizes: Vec<usize>,
	pub chunk_overlaps: Vec<usize>,
	pub ks: Vec<usize>,
}

impl Default for SweepSpace {
	fn default() -> Self {
		Self {
			embed_models: vec!["sentence-transformers/all-MiniLM-L6-v2".into(), "sentence-transformers/all-MiniLM-L12-v2".into()],
			chunk_sizes: vec![600, 900],
			chunk_overlaps: vec![100, 150],
			ks: vec![3, 5],
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
	pub embed_model: String,
	pub chunk_size: usize,
	pub chunk_overlap: usize,
	pub k: usize,
	pub avg_support_rate: f32,
	pub avg_relevance: f32,
	pub composite_score: f32,
}

/// Support weighs 0.7, relevance (clamped to `[0, 1]`) 0.3.
pub fn composite_score(support_rate: f32, relevance: f32) -> f32 {
	0.7 * support_rate + 0.3 * relevance.clamp(0.0, 1.0)
}

pub struct Sweep<'a> {
	pub docs_dir: &'a Path,
	/// Each indexing configuration gets a fresh sub-directory here.
	pub work_dir: &'a Path,
	pub table: &'a str,
	pub batch_size: usize,
	pub questions: Vec<String>,
}

impl Sweep<'_> {
	/// Rows for every grid point, best composite score first. `load_embedder` is
	/// called once per model.
	pub fn run<F>(&self, space: &SweepSpace, load_embedder: F) -> Result<Vec<SweepRow>>
	where
		F: Fn(&str) -> Result<Arc<dyn Embedder>>,
	{
		let mut rows = Vec::new();
		for model in &space.embed_models {
			let embedder = load_embedder(model)?;
			for &chunk_size in &space.chunk_sizes {
				for &chunk_overlap in &space.chunk_overlaps {
					if chunk_overlap >= chunk_size {
						tracing::warn!(chunk_size, chunk_overlap, "Skipping grid point with overlap >= size");
						continue;
					}
					let dir = self.fresh_dir(model, chunk_size, chunk_overlap)?;
					let index = Arc::new(LanceVectorIndex::open(&dir, self.table)?);
					let options = IndexOptions { chunk_size, chunk_overlap, batch_size: self.batch_size, prune_stale: false };
					let stats = Indexer::new(embedder.as_ref(), index.as_ref(), options)?.build(self.docs_dir, &dir)?;
					tracing::info!(model = %model, chunk_size, chunk_overlap, chunks = stats.chunks_written, "Indexed sweep configuration");

					let pipeline = RagPipeline::new(Arc::clone(&embedder), index as Arc<dyn VectorIndex>);
					for &k in &space.ks {
						rows.push(self.score(&pipeline, model, chunk_size, chunk_overlap, k)?);
					}
				}
			}
		}
		rows.sort_by(|a, b| b.composite_score.partial_cmp(&a.composite_score).unwrap_or(std::cmp::Ordering::Equal));
		Ok(rows)
	}

	fn score(&self, pipeline: &RagPipeline, model: &str, chunk_size: usize, chunk_overlap: usize, k: usize) -> Result<SweepRow> {
		let mut support = 0.0f32;
		let mut relevance = 0.0f32;
		for q in &self.questions {
			if let Some(eval) = pipeline.ask(q, k, true)?.eval {
				support += eval.support_rate;
				relevance += eval.relevance;
			}
		}
		let n = self.questions.len().max(1) as f32;
		let (support, relevance) = (support / n, relevance / n);
		Ok(SweepRow {
			embed_model: model.to_string(),
			chunk_size,
			chunk_overlap,
			k,
			avg_support_rate: round3(support),
			avg_relevance: round3(relevance),
			composite_score: round3(composite_score(support, relevance)),
		})
	}

	fn fresh_dir(&self, model: &str, chunk_size: usize, chunk_overlap: usize) -> Result<PathBuf> {
		let name = model.rsplit('/').next().unwrap_or(model);
		let safe: String = name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' }).collect();
		let dir = self.work_dir.join(format!("m={}_cs={}_co={}", safe, chunk_size, chunk_overlap));
		if dir.exists() {
			std::fs::remove_dir_all(&dir)?;
		}
		std::fs::create_dir_all(&dir)?;
		Ok(dir)
	}
}
