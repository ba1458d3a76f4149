//! Extractive answers: rank context sentences against the question, keep the
//! best few, then read them back in source order.
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;

use groundqa_core::text::{cosine, split_sentences};
use groundqa_core::traits::Embedder;

pub const FALLBACK_ANSWER: &str = "I couldn't find enough grounded context to answer.";
pub const DEFAULT_TOP_SENTENCES: usize = 6;

/// A sentence and where it came from.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
	context: usize,
	sentence: usize,
	text: String,
}

pub struct AnswerSynthesizer {
	embedder: Arc<dyn Embedder>,
}

impl AnswerSynthesizer {
	pub fn new(embedder: Arc<dyn Embedder>) -> Self { Self { embedder } }

	/// Build an answer from at most `top_sentences` verbatim sentences of `contexts`.
	///
	/// Selection is by cosine similarity to the question (ties keep scan order);
	/// the selected sentences are then put back in `(context, sentence)` order,
	/// deduplicated case-insensitively and joined with a space. Returns
	/// `FALLBACK_ANSWER` when no sentence survives splitting.
	pub fn synthesize(&self, question: &str, contexts: &[String], top_sentences: usize) -> Result<String> {
		let candidates: Vec<Candidate> = contexts
			.iter()
			.enumerate()
			.flat_map(|(ci, ctx)| {
				split_sentences(ctx).into_iter().enumerate().map(move |(si, text)| Candidate { context: ci, sentence: si, text })
			})
			.collect();
		if candidates.is_empty() {
			return Ok(FALLBACK_ANSWER.to_string());
		}

		let q = self.embedder.embed_one(question)?;
		let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
		let vectors = self.embedder.embed_checked(&texts)?;
		let scores: Vec<f32> = vectors.iter().map(|v| cosine(&q, v)).collect();

		let mut order: Vec<usize> = (0..candidates.len()).collect();
		// stable: equal scores stay in scan order
		order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));
		let mut picked: Vec<&Candidate> = order.into_iter().take(top_sentences).map(|i| &candidates[i]).collect();
		picked.sort_by_key(|c| (c.context, c.sentence));

		let mut seen = HashSet::new();
		let lines: Vec<&str> = picked.into_iter().filter(|c| seen.insert(c.text.to_lowercase())).map(|c| c.text.as_str()).collect();
		tracing::debug!(candidates = candidates.len(), kept = lines.len(), "Synthesized extractive answer");
		Ok(lines.join(" "))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use groundqa_core::traits::Embedder;

	/// Scores a sentence by how many times it mentions "vector".
	struct CountingEmbedder;

	impl Embedder for CountingEmbedder {
		fn model_id(&self) -> &str { "counting" }
		fn dim(&self) -> usize { 2 }
		fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
			Ok(texts
				.iter()
				.map(|t| {
					let hits = t.to_lowercase().matches("vector").count() as f32;
					let v = [hits, 1.0];
					let n = (v[0] * v[0] + v[1] * v[1]).sqrt();
					vec![v[0] / n, v[1] / n]
				})
				.collect())
		}
	}

	fn synth() -> AnswerSynthesizer { AnswerSynthesizer::new(Arc::new(CountingEmbedder)) }

	#[test]
	fn no_sentences_gives_fallback() {
		let out = synth().synthesize("vector vector", &["# Title".to_string(), "- bullet".to_string()], 6).unwrap();
		assert_eq!(out, FALLBACK_ANSWER);
		assert_eq!(synth().synthesize("anything", &[], 6).unwrap(), FALLBACK_ANSWER);
	}

	#[test]
	fn picks_by_score_but_reads_in_source_order() {
		let contexts = vec![
			"This sentence has one vector in it. This sentence has nothing relevant at all.".to_string(),
			"Vector vector vector shows up three times here.".to_string(),
		];
		let out = synth().synthesize("vector vector vector", &contexts, 2).unwrap();
		assert_eq!(out, "This sentence has one vector in it. Vector vector vector shows up three times here.");
	}

	#[test]
	fn duplicates_are_dropped_case_insensitively() {
		let contexts = vec!["The vector store keeps embeddings.".to_string(), "THE VECTOR STORE KEEPS EMBEDDINGS.".to_string()];
		let out = synth().synthesize("vector", &contexts, 6).unwrap();
		assert_eq!(out, "The vector store keeps embeddings.");
	}

	#[test]
	fn ties_keep_scan_order() {
		let contexts = vec!["First plain sentence without the word.\nSecond plain sentence without the word.\nThird plain sentence without the word.".to_string()];
		let out = synth().synthesize("vector", &contexts, 2).unwrap();
		assert_eq!(out, "First plain sentence without the word. Second plain sentence without the word.");
	}
}
