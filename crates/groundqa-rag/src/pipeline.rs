//! Question in, grounded answer out: retrieve, synthesize, optionally evaluate.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use groundqa_core::config::QuerySettings;
use groundqa_core::error::Error;
use groundqa_core::text::estimate_tokens;
use groundqa_core::traits::{Embedder, VectorIndex};
use groundqa_core::types::RetrievalHit;
use groundqa_vector::Retriever;

use crate::answer::{AnswerSynthesizer, DEFAULT_TOP_SENTENCES};
use crate::eval::{EvalReport, Evaluator, DEFAULT_SUPPORT_THRESHOLD};

pub const EMPTY_INDEX_MESSAGE: &str = "Index is empty or nothing relevant was found. Try adding docs and re-indexing.";

/// Citation for one retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
	pub source: String,
	pub chunk_index: usize,
	pub id: String,
	pub distance: f32,
	pub tokens_est: usize,
}

impl From<&RetrievalHit> for SourceRef {
	fn from(hit: &RetrievalHit) -> Self {
		Self {
			source: hit.metadata.chunk.source.clone(),
			chunk_index: hit.metadata.chunk.chunk_index,
			id: hit.metadata.id.clone(),
			distance: hit.metadata.distance,
			tokens_est: hit.metadata.chunk.tokens_est,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
	pub answer: String,
	pub sources: Vec<SourceRef>,
	pub retrieved: usize,
	pub context_chars: usize,
	pub answer_tokens_est: usize,
	pub question_tokens_est: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub eval: Option<EvalReport>,
}

pub struct RagPipeline {
	retriever: Retriever,
	synthesizer: AnswerSynthesizer,
	evaluator: Evaluator,
	top_sentences: usize,
	support_threshold: f32,
}

impl RagPipeline {
	pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
		Self {
			retriever: Retriever::new(Arc::clone(&embedder), index),
			synthesizer: AnswerSynthesizer::new(Arc::clone(&embedder)),
			evaluator: Evaluator::new(embedder),
			top_sentences: DEFAULT_TOP_SENTENCES,
			support_threshold: DEFAULT_SUPPORT_THRESHOLD,
		}
	}

	pub fn with_query_settings(mut self, settings: &QuerySettings) -> Self {
		self.top_sentences = settings.top_sentences;
		self.support_threshold = settings.support_threshold;
		self
	}

	/// Answer `question` from the `k` nearest chunks. With nothing retrieved the
	/// answer is `EMPTY_INDEX_MESSAGE` and, if requested, the scores are zero.
	pub fn ask(&self, question: &str, k: usize, with_eval: bool) -> Result<AskResponse> {
		if question.trim().is_empty() {
			return Err(Error::InvalidArgument("question must not be empty".into()).into());
		}
		let question_tokens_est = estimate_tokens(question);
		let hits = self.retriever.retrieve(question, k)?;
		if hits.is_empty() {
			return Ok(AskResponse {
				answer: EMPTY_INDEX_MESSAGE.to_string(),
				sources: Vec::new(),
				retrieved: 0,
				context_chars: 0,
				answer_tokens_est: 0,
				question_tokens_est,
				eval: with_eval.then(|| EvalReport::new(0.0, 0.0)),
			});
		}

		let contexts: Vec<String> = hits.iter().map(|h| h.text.clone()).collect();
		let answer = self.synthesizer.synthesize(question, &contexts, self.top_sentences)?;
		let eval = if with_eval { Some(self.evaluator.evaluate(question, &answer, &contexts, self.support_threshold)?) } else { None };

		tracing::info!(retrieved = hits.len(), answer_chars = answer.chars().count(), "Answered question");
		Ok(AskResponse {
			answer_tokens_est: estimate_tokens(&answer),
			sources: hits.iter().map(SourceRef::from).collect(),
			retrieved: hits.len(),
			context_chars: contexts.iter().map(|c| c.chars().count()).sum(),
			question_tokens_est,
			answer,
			eval,
		})
	}
}
