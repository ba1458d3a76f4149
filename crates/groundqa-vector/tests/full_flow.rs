use std::fs;
use std::path::Path;

use groundqa_core::error::Error;
use groundqa_core::traits::VectorIndex;
use groundqa_embed::HashEmbedder;
use groundqa_vector::{build_index, IndexLock, IndexOptions, Indexer, LanceVectorIndex, Retriever};
use std::sync::Arc;
use tempfile::TempDir;

const TABLE: &str = "ai_docs_test";

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write doc");
}

fn sorted_ids(index: &LanceVectorIndex) -> Vec<String> {
    let mut ids = index.ids().expect("ids");
    ids.sort();
    ids
}

#[test]
fn reindexing_unchanged_docs_is_idempotent() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    write(docs.path(), "notes.md", "# Notes\n\nVector stores keep embeddings for similarity search.\n\nChunks are the unit of retrieval.");
    write(docs.path(), "guide.txt", &vec!["Retrieval augmented generation grounds answers in documents."; 12].join("\n\n"));

    let embedder = HashEmbedder::new(64);
    let options = IndexOptions { chunk_size: 300, chunk_overlap: 50, batch_size: 4, prune_stale: false };

    let first = build_index(docs.path(), store.path(), TABLE, &embedder, options.clone()).expect("first build");
    assert_eq!(first.documents_indexed, 2);
    assert!(first.failures.is_empty());
    let index = LanceVectorIndex::open(store.path(), TABLE).expect("open");
    let ids_before = sorted_ids(&index);
    let count_before = index.count().expect("count");
    assert_eq!(count_before, first.chunks_written);

    let second = build_index(docs.path(), store.path(), TABLE, &embedder, options).expect("second build");
    assert_eq!(second.chunks_written, first.chunks_written);
    assert_eq!(sorted_ids(&index), ids_before);
    assert_eq!(index.count().expect("count"), count_before);
    assert!(ids_before.contains(&"notes:0".to_string()));
    assert!(ids_before.contains(&"guide:1".to_string()));
}

#[test]
fn short_paragraphs_pack_into_one_chunk() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    write(docs.path(), "pair.md", "Cats sleep a lot during the day.\n\nInterest rates moved up this quarter.");

    let embedder = HashEmbedder::new(32);
    let stats = build_index(docs.path(), store.path(), TABLE, &embedder, IndexOptions { chunk_size: 500, chunk_overlap: 50, ..Default::default() }).expect("build");
    assert_eq!(stats.chunks_written, 1);
    let index = LanceVectorIndex::open(store.path(), TABLE).expect("open");
    assert_eq!(index.count().expect("count"), 1);
}

#[test]
fn oversized_paragraph_is_one_truncated_chunk() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    write(docs.path(), "long.txt", &"word ".repeat(100));

    let embedder = Arc::new(HashEmbedder::new(32));
    let stats = build_index(docs.path(), store.path(), TABLE, embedder.as_ref(), IndexOptions { chunk_size: 50, chunk_overlap: 10, ..Default::default() }).expect("build");
    assert_eq!(stats.chunks_written, 1);

    let index = Arc::new(LanceVectorIndex::open(store.path(), TABLE).expect("open"));
    let hits = Retriever::new(embedder, index).retrieve("word", 5).expect("retrieve");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text.chars().count(), 50);
    assert_eq!(hits[0].metadata.chunk.char_count, 50);
    assert_eq!(hits[0].metadata.chunk.chunk_size, 50);
}

#[test]
fn retrieval_returns_enriched_hits() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    write(docs.path(), "rag.md", "# retrieval\n\nVector databases like Chroma store document chunks and enable similarity search for RAG.");

    let embedder = Arc::new(HashEmbedder::new(128));
    build_index(docs.path(), store.path(), TABLE, embedder.as_ref(), IndexOptions::default()).expect("build");

    let index = Arc::new(LanceVectorIndex::open(store.path(), TABLE).expect("open"));
    let hits = Retriever::new(embedder, index).retrieve("What is a vector store used for?", 3).expect("retrieve");
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.metadata.id, "rag:0");
    assert!(hit.metadata.distance.is_finite());
    assert!(hit.metadata.chunk.source.ends_with("rag.md"));
    assert_eq!(hit.metadata.chunk.embed_model, "hash:d128");
    assert_eq!(hit.metadata.chunk.content_hash, blake3::hash(hit.text.as_bytes()).to_hex().to_string());
}

#[test]
fn fresh_index_retrieves_nothing() {
    let store = TempDir::new().expect("store");
    let index = Arc::new(LanceVectorIndex::open(store.path(), TABLE).expect("open"));
    assert_eq!(index.count().expect("count"), 0);
    let hits = Retriever::new(Arc::new(HashEmbedder::new(16)), index).retrieve("anything", 3).expect("retrieve");
    assert!(hits.is_empty());
}

#[test]
fn held_lock_fails_the_build() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    write(docs.path(), "a.md", "Some content that would be indexed.");

    let _held = IndexLock::acquire(store.path()).expect("lock");
    let embedder = HashEmbedder::new(16);
    let err = build_index(docs.path(), store.path(), TABLE, &embedder, IndexOptions::default()).expect_err("locked");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::IndexLocked(_))));
}

#[test]
fn second_lock_on_same_dir_is_contention() {
    let store = TempDir::new().expect("store");
    let first = IndexLock::acquire(store.path()).expect("first lock");
    let err = IndexLock::acquire(store.path()).expect_err("contended");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::IndexLocked(dir)) if dir == store.path()));
    drop(first);
    assert!(IndexLock::acquire(store.path()).is_ok());
}

#[test]
fn lock_is_released_after_build() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    write(docs.path(), "a.md", "Some content that would be indexed.");
    let embedder = HashEmbedder::new(16);
    build_index(docs.path(), store.path(), TABLE, &embedder, IndexOptions::default()).expect("build");
    assert!(IndexLock::acquire(store.path()).is_ok());
}

#[test]
fn unreadable_pdf_does_not_abort_the_run() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    fs::write(docs.path().join("broken.pdf"), b"this is not a pdf").expect("write pdf");
    write(docs.path(), "ok.md", "A perfectly readable markdown document.");
    write(docs.path(), "skip.md", "  \n\n\t ");
    write(docs.path(), "ignored.csv", "a,b,c");

    let embedder = HashEmbedder::new(16);
    let stats = build_index(docs.path(), store.path(), TABLE, &embedder, IndexOptions::default()).expect("build");
    assert_eq!(stats.documents_seen, 3);
    assert_eq!(stats.documents_indexed, 1);
    assert_eq!(stats.documents_skipped, 1);
    assert_eq!(stats.failures.len(), 1);
    assert!(stats.failures[0].path.ends_with("broken.pdf"));
    let index = LanceVectorIndex::open(store.path(), TABLE).expect("open");
    assert_eq!(index.count().expect("count"), 1);
}

#[test]
fn prune_drops_trailing_chunks_of_a_shrunk_document() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    let para = "Paragraph about indexing and retrieval of chunks.";
    write(docs.path(), "shrink.md", &vec![para; 6].join("\n\n"));

    let embedder = HashEmbedder::new(16);
    let index = LanceVectorIndex::open(store.path(), TABLE).expect("open");
    let options = IndexOptions { chunk_size: 60, chunk_overlap: 0, batch_size: 2, prune_stale: true };
    let indexer = Indexer::new(&embedder, &index, options).expect("indexer");

    let first = indexer.build(docs.path(), store.path()).expect("first");
    assert_eq!(first.chunks_written, 6);

    write(docs.path(), "shrink.md", &vec![para; 2].join("\n\n"));
    let second = indexer.build(docs.path(), store.path()).expect("second");
    assert_eq!(second.chunks_written, 2);
    assert_eq!(second.pruned, 4);
    assert_eq!(sorted_ids(&index), vec!["shrink:0".to_string(), "shrink:1".to_string()]);
}
