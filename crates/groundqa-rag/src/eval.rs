//! Answer quality signals: question/context relevance and answer support.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use groundqa_core::text::{cosine, dot, mean_vector, split_sentences};
use groundqa_core::traits::Embedder;

pub const DEFAULT_SUPPORT_THRESHOLD: f32 = 0.6;
/// Below this relevance an answer is flagged `low_relevance`.
pub const LOW_RELEVANCE: f32 = 0.4;
/// Below this support rate an answer is flagged `low_support`.
pub const LOW_SUPPORT: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalReport {
	pub relevance: f32,
	pub support_rate: f32,
	pub low_relevance: bool,
	pub low_support: bool,
}

impl EvalReport {
	pub fn new(relevance: f32, support_rate: f32) -> Self {
		Self { relevance, support_rate, low_relevance: relevance < LOW_RELEVANCE, low_support: support_rate < LOW_SUPPORT }
	}
}

pub(crate) fn round3(x: f32) -> f32 { (x * 1000.0).round_ties_even() / 1000.0 }

pub struct Evaluator {
	embedder: Arc<dyn Embedder>,
}

impl Evaluator {
	pub fn new(embedder: Arc<dyn Embedder>) -> Self { Self { embedder } }

	/// Dot product of the question vector with the mean of the context vectors
	/// (the mean is not re-normalised). 0.0 without contexts.
	pub fn score_relevance(&self, question: &str, contexts: &[String]) -> Result<f32> {
		if contexts.is_empty() {
			return Ok(0.0);
		}
		let q = self.embedder.embed_one(question)?;
		let ctx = self.embedder.embed_checked(contexts)?;
		let Some(centroid) = mean_vector(&ctx) else { return Ok(0.0) };
		Ok(dot(&q, &centroid).clamp(-1.0, 1.0))
	}

	/// Share of answer sentences whose best match among the context sentences
	/// reaches `threshold`, rounded to 3 decimals. 0.0 when either side has no
	/// sentences.
	pub fn score_support(&self, answer: &str, contexts: &[String], threshold: f32) -> Result<f32> {
		let answer_sents = split_sentences(answer);
		let context_sents: Vec<String> = contexts.iter().flat_map(|c| split_sentences(c)).collect();
		if answer_sents.is_empty() || context_sents.is_empty() {
			return Ok(0.0);
		}
		let a = self.embedder.embed_checked(&answer_sents)?;
		let c = self.embedder.embed_checked(&context_sents)?;
		let supported = a
			.iter()
			.filter(|av| c.iter().map(|cv| cosine(av, cv)).fold(f32::NEG_INFINITY, f32::max) >= threshold)
			.count();
		Ok(round3(supported as f32 / answer_sents.len() as f32))
	}

	pub fn evaluate(&self, question: &str, answer: &str, contexts: &[String], threshold: f32) -> Result<EvalReport> {
		let relevance = self.score_relevance(question, contexts)?;
		let support = self.score_support(answer, contexts, threshold)?;
		tracing::debug!(relevance, support, "Evaluated answer");
		Ok(EvalReport::new(relevance, support))
	}
}
