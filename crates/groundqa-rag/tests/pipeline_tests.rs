use std::fs;
use std::sync::Arc;

use groundqa_core::error::Error;
use groundqa_core::memory::InMemoryIndex;
use groundqa_core::traits::{Embedder, VectorIndex};
use groundqa_embed::HashEmbedder;
use groundqa_rag::{RagPipeline, EMPTY_INDEX_MESSAGE};
use groundqa_vector::{build_index, IndexOptions, Indexer, LanceVectorIndex};
use tempfile::TempDir;

fn embedder() -> Arc<dyn Embedder> { Arc::new(HashEmbedder::new(256)) }

fn indexed_memory(docs: &[(&str, &str)]) -> (TempDir, Arc<InMemoryIndex>) {
    let dir = TempDir::new().expect("docs");
    for (name, body) in docs {
        fs::write(dir.path().join(name), body).expect("write");
    }
    let index = Arc::new(InMemoryIndex::new());
    let e = embedder();
    let store = dir.path().join(".store");
    Indexer::new(e.as_ref(), index.as_ref(), IndexOptions::default()).expect("indexer").build(dir.path(), &store).expect("build");
    (dir, index)
}

#[test]
fn ask_over_lance_returns_answer_and_sources() {
    let docs = TempDir::new().expect("docs");
    let store = TempDir::new().expect("store");
    fs::write(docs.path().join("sample.md"), "# retrieval\n\nVector databases like Chroma store document chunks and enable similarity search for RAG.").expect("write");
    let e = embedder();
    build_index(docs.path(), store.path(), "ai_docs", e.as_ref(), IndexOptions::default()).expect("build");

    let index: Arc<dyn VectorIndex> = Arc::new(LanceVectorIndex::open(store.path(), "ai_docs").expect("open"));
    let pipeline = RagPipeline::new(e, index);
    let res = pipeline.ask("What is a vector store used for?", 3, false).expect("ask");
    assert!(!res.answer.is_empty());
    assert_eq!(res.answer, "Vector databases like Chroma store document chunks and enable similarity search for RAG.");
    assert_eq!(res.sources.len(), 1);
    assert_eq!(res.sources[0].id, "sample:0");
    assert_eq!(res.sources[0].chunk_index, 0);
    assert_eq!(res.retrieved, 1);
    assert!(res.eval.is_none());
}

#[test]
fn ask_with_eval_reports_bounded_scores() {
    let (_docs, index) = indexed_memory(&[(
        "rag.md",
        "# retrieval\n\nRetrieval augmented generation uses top-k document chunks from a vector store to ground answers and provide citations.",
    )]);
    let pipeline = RagPipeline::new(embedder(), index);
    let res = pipeline.ask("what is retrieval augmented generation", 3, true).expect("ask");
    let eval = res.eval.expect("eval requested");
    assert!((0.0..=1.0).contains(&eval.support_rate));
    assert!((-1.0..=1.0).contains(&eval.relevance));
    // the answer is lifted verbatim from the context, so it is fully supported
    assert_eq!(eval.support_rate, 1.0);
    assert!(!eval.low_support);
    assert!(res.context_chars > res.answer.chars().count());
    assert!(res.answer_tokens_est >= 1);
    assert_eq!(res.question_tokens_est, 10);
}

#[test]
fn empty_index_degrades_to_message_and_zero_scores() {
    let pipeline = RagPipeline::new(embedder(), Arc::new(InMemoryIndex::new()));
    let res = pipeline.ask("anything at all?", 5, true).expect("ask");
    assert_eq!(res.answer, EMPTY_INDEX_MESSAGE);
    assert!(res.sources.is_empty());
    assert_eq!((res.retrieved, res.context_chars), (0, 0));
    let eval = res.eval.expect("eval requested");
    assert_eq!((eval.relevance, eval.support_rate), (0.0, 0.0));
    assert!(eval.low_relevance && eval.low_support);
}

#[test]
fn blank_question_and_zero_k_are_rejected() {
    let pipeline = RagPipeline::new(embedder(), Arc::new(InMemoryIndex::new()));
    for err in [pipeline.ask("   ", 3, false).expect_err("blank"), pipeline.ask("fine question", 0, false).expect_err("k=0")] {
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidArgument(_))));
    }
}

#[test]
fn response_serializes_with_camel_case_eval() {
    let (_docs, index) = indexed_memory(&[("a.md", "Vector stores are used for similarity search over embedded chunks.")]);
    let res = RagPipeline::new(embedder(), index).ask("What is a vector store used for?", 2, true).expect("ask");
    let json = serde_json::to_value(&res).expect("json");
    assert!(json["eval"]["supportRate"].is_number());
    assert!(json["eval"]["lowRelevance"].is_boolean());
    assert_eq!(json["sources"][0]["id"], "a:0");
    assert!(json["sources"][0]["tokens_est"].is_number());
}
