//! groundqa-core
//!
//! Configuration, error taxonomy, domain types and the collaborator traits
//! (`Embedder`, `VectorIndex`) shared by the indexing and query crates, plus the
//! paragraph segmenter and sentence/vector helpers.
pub mod config;
pub mod error;
pub mod memory;
pub mod segmenter;
pub mod text;
pub mod traits;
pub mod types;
