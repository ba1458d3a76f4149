use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Columns of the chunk table. `vector` width is fixed when the table is created.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("text", DataType::Utf8, false),
		Field::new("source", DataType::Utf8, false),
		Field::new("chunk_index", DataType::Int32, false),
		Field::new("char_count", DataType::Int32, false),
		Field::new("tokens_est", DataType::Int32, false),
		Field::new("content_hash", DataType::Utf8, false),
		Field::new("embed_model", DataType::Utf8, false),
		Field::new("chunk_size", DataType::Int32, false),
		Field::new("chunk_overlap", DataType::Int32, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
