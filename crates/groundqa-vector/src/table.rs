//! LanceDB-backed `VectorIndex`.
//!
//! LanceDB is async; the index owns a tokio runtime and blocks on it so the
//! indexing and query paths stay synchronous.
use anyhow::{anyhow, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{connect, Connection, DistanceType, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

use groundqa_core::traits::VectorIndex;
use groundqa_core::types::{ChunkMetadata, HitMetadata, IndexEntry, RetrievalHit};

use crate::schema::build_arrow_schema;

pub struct LanceVectorIndex {
	rt: Runtime,
	db: Connection,
	table_name: String,
	location: PathBuf,
}

impl LanceVectorIndex {
	pub fn open(db_path: &Path, table_name: &str) -> Result<Self> {
		std::fs::create_dir_all(db_path)?;
		let rt = Runtime::new()?;
		let uri = db_path.to_string_lossy().to_string();
		let db = rt.block_on(async { connect(&uri).execute().await })?;
		Ok(Self { rt, db, table_name: table_name.to_string(), location: db_path.to_path_buf() })
	}

	pub fn location(&self) -> &Path { &self.location }
	pub fn table_name(&self) -> &str { &self.table_name }

	/// All stored chunk ids, in storage order.
	pub fn ids(&self) -> Result<Vec<String>> {
		self.rt.block_on(self.ids_async())
	}

	async fn existing_table(&self) -> Result<Option<Table>> {
		if !self.db.table_names().execute().await?.contains(&self.table_name) {
			return Ok(None);
		}
		Ok(Some(self.db.open_table(&self.table_name).execute().await?))
	}

	async fn ensure_table(&self, dim: i32) -> Result<Table> {
		if let Some(table) = self.existing_table().await? {
			return Ok(table);
		}
		let schema = build_arrow_schema(dim);
		let iter = RecordBatchIterator::new(vec![].into_iter(), schema);
		tracing::info!(table = %self.table_name, dim, "Creating chunk table");
		Ok(self.db.create_table(&self.table_name, Box::new(iter)).execute().await?)
	}
}

fn entries_to_record_batch(entries: &[IndexEntry], dim: i32) -> Result<RecordBatch> {
	let mut ids = Vec::new(); let mut texts = Vec::new(); let mut sources = Vec::new();
	let mut ordinals = Vec::new(); let mut char_counts = Vec::new(); let mut tokens = Vec::new();
	let mut hashes = Vec::new(); let mut models = Vec::new(); let mut sizes = Vec::new(); let mut overlaps = Vec::new();
	let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
	for e in entries {
		let m = &e.chunk.metadata;
		if e.vector.len() != dim as usize {
			return Err(anyhow!("vector for '{}' has dim {} expected {}", e.chunk.id, e.vector.len(), dim));
		}
		ids.push(e.chunk.id.clone()); texts.push(e.chunk.text.clone()); sources.push(m.source.clone());
		ordinals.push(m.chunk_index as i32); char_counts.push(m.char_count as i32); tokens.push(m.tokens_est as i32);
		hashes.push(m.content_hash.clone()); models.push(m.embed_model.clone());
		sizes.push(m.chunk_size as i32); overlaps.push(m.chunk_overlap as i32);
		vectors.push(Some(e.vector.iter().map(|&x| Some(x)).collect()));
	}
	Ok(RecordBatch::try_new(build_arrow_schema(dim), vec![
		Arc::new(StringArray::from(ids)),
		Arc::new(StringArray::from(texts)),
		Arc::new(StringArray::from(sources)),
		Arc::new(Int32Array::from(ordinals)),
		Arc::new(Int32Array::from(char_counts)),
		Arc::new(Int32Array::from(tokens)),
		Arc::new(StringArray::from(hashes)),
		Arc::new(StringArray::from(models)),
		Arc::new(Int32Array::from(sizes)),
		Arc::new(Int32Array::from(overlaps)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
	])?)
}

fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("{} column missing", name))
}

fn i32_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<Int32Array>()).ok_or_else(|| anyhow!("{} column missing", name))
}

fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<RetrievalHit>> {
	let id = str_col(batch, "id")?; let text = str_col(batch, "text")?; let source = str_col(batch, "source")?;
	let ordinal = i32_col(batch, "chunk_index")?; let chars = i32_col(batch, "char_count")?; let tokens = i32_col(batch, "tokens_est")?;
	let hash = str_col(batch, "content_hash")?; let model = str_col(batch, "embed_model")?;
	let size = i32_col(batch, "chunk_size")?; let overlap = i32_col(batch, "chunk_overlap")?;
	let distance = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
	Ok((0..batch.num_rows())
		.map(|i| RetrievalHit {
			text: text.value(i).to_string(),
			metadata: HitMetadata {
				id: id.value(i).to_string(),
				distance: distance.filter(|d| d.is_valid(i)).map(|d| d.value(i)).unwrap_or(f32::NAN),
				chunk: ChunkMetadata {
					source: source.value(i).to_string(),
					chunk_index: ordinal.value(i) as usize,
					char_count: chars.value(i) as usize,
					tokens_est: tokens.value(i) as usize,
					content_hash: hash.value(i).to_string(),
					embed_model: model.value(i).to_string(),
					chunk_size: size.value(i) as usize,
					chunk_overlap: overlap.value(i) as usize,
				},
			},
		})
		.collect())
}

fn sql_quote(s: &str) -> String { format!("'{}'", s.replace('\'', "''")) }

impl LanceVectorIndex {
	async fn upsert_async(&self, batch: RecordBatch, dim: i32) -> Result<()> {
		let rows = batch.num_rows();
		let table = self.ensure_table(dim).await?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		// Upsert by chunk id
		let mut mi = table.merge_insert(&["id"]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		let _ = mi.execute(reader).await?;
		tracing::debug!(rows, table = %self.table_name, "Upserted batch");
		Ok(())
	}

	async fn query_async(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievalHit>> {
		let Some(table) = self.existing_table().await? else { return Ok(Vec::new()) };
		let mut stream = table
			.vector_search(vector.to_vec())?
			.distance_type(DistanceType::Cosine)
			.limit(k)
			.execute()
			.await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			hits.extend(batch_to_hits(&batch)?);
		}
		Ok(hits)
	}

	async fn count_async(&self) -> Result<usize> {
		match self.existing_table().await? {
			Some(table) => Ok(table.count_rows(None).await?),
			None => Ok(0),
		}
	}

	async fn prune_async(&self, source: &str, from_ordinal: usize) -> Result<usize> {
		let Some(table) = self.existing_table().await? else { return Ok(0) };
		let filter = format!("source = {} AND chunk_index >= {}", sql_quote(source), from_ordinal);
		let stale = table.count_rows(Some(filter.clone())).await?;
		if stale > 0 {
			table.delete(&filter).await?;
		}
		Ok(stale)
	}

	async fn ids_async(&self) -> Result<Vec<String>> {
		let Some(table) = self.existing_table().await? else { return Ok(Vec::new()) };
		let mut stream = table.query().select(Select::columns(&["id"])).execute().await?;
		let mut ids = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let col = str_col(&batch, "id")?;
			ids.extend((0..batch.num_rows()).map(|i| col.value(i).to_string()));
		}
		Ok(ids)
	}
}

impl VectorIndex for LanceVectorIndex {
	fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
		let Some(first) = entries.first() else { return Ok(()) };
		let dim = first.vector.len() as i32;
		let batch = entries_to_record_batch(entries, dim)?;
		self.rt.block_on(self.upsert_async(batch, dim))
	}

	fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievalHit>> {
		self.rt.block_on(self.query_async(vector, k))
	}

	fn count(&self) -> Result<usize> {
		self.rt.block_on(self.count_async())
	}

	fn prune_from(&self, source: &str, from_ordinal: usize) -> Result<usize> {
		self.rt.block_on(self.prune_async(source, from_ordinal))
	}
}
