//! Domain types shared by the indexer, the vector index and the query path.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Per-chunk record stored next to the text and vector.
///
/// - `source`: path of the document the chunk was cut from
/// - `chunk_index`: ordinal position within that document
/// - `char_count`/`tokens_est`: size of the chunk text (tokens are a ~4 chars/token estimate)
/// - `content_hash`: BLAKE3 hex digest of the chunk text
/// - `embed_model`/`chunk_size`/`chunk_overlap`: configuration that produced the entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub chunk_index: usize,
    pub char_count: usize,
    pub tokens_est: usize,
    pub content_hash: String,
    pub embed_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// A segment of a document, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Positional identity `<document-stem>:<ordinal>`. Independent of content, so
    /// re-indexing an unchanged document overwrites its entries in place.
    pub fn make_id(doc_stem: &str, ordinal: usize) -> ChunkId {
        format!("{}:{}", doc_stem, ordinal)
    }
}

/// A chunk paired with its embedding, ready for upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Chunk metadata enriched with the hit identity and its distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitMetadata {
    pub id: ChunkId,
    /// Cosine distance (`1 - cosine`); lower is closer.
    pub distance: f32,
    #[serde(flatten)]
    pub chunk: ChunkMetadata,
}

/// One ranked result of a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub text: String,
    pub metadata: HitMetadata,
}
