//! Batch evaluation over a YAML question list, with a timestamped JSON report.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pipeline::RagPipeline;

pub const DEFAULT_QUESTION: &str = "What do these docs say about vector stores?";

/// Questions from `path`: a YAML list of strings or `{q: ...}` maps; other items
/// are ignored. A missing file yields the single `DEFAULT_QUESTION`.
pub fn load_questions(path: &Path) -> Result<Vec<String>> {
	if !path.exists() {
		tracing::warn!(path = %path.display(), "Question file not found, using default question");
		return Ok(vec![DEFAULT_QUESTION.to_string()]);
	}
	let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	let data: serde_yaml::Value = serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
	let Some(items) = data.as_sequence() else { return Ok(Vec::new()) };
	Ok(items
		.iter()
		.filter_map(|item| match item {
			serde_yaml::Value::String(s) => Some(s.clone()),
			serde_yaml::Value::Mapping(m) => m.get("q").map(yaml_to_string),
			_ => None,
		})
		.collect())
}

fn yaml_to_string(v: &serde_yaml::Value) -> String {
	match v {
		serde_yaml::Value::String(s) => s.clone(),
		serde_yaml::Value::Number(n) => n.to_string(),
		serde_yaml::Value::Bool(b) => b.to_string(),
		other => serde_yaml::to_string(other).map(|s| s.trim_end().to_string()).unwrap_or_default(),
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRow {
	pub question: String,
	pub answer: String,
	pub retrieved: usize,
	pub context_chars: usize,
	pub support_rate: f32,
	pub relevance: f32,
}

/// Ask every question with evaluation on.
pub fn evaluate_questions(pipeline: &RagPipeline, questions: &[String], k: usize) -> Result<Vec<EvalRow>> {
	questions
		.iter()
		.map(|q| {
			let res = pipeline.ask(q, k, true)?;
			let (support_rate, relevance) = res.eval.map(|e| (e.support_rate, e.relevance)).unwrap_or((0.0, 0.0));
			Ok(EvalRow { question: q.clone(), answer: res.answer, retrieved: res.retrieved, context_chars: res.context_chars, support_rate, relevance })
		})
		.collect()
}

/// Write `value` as pretty JSON to `<dir>/<prefix>_<YYYYmmdd_HHMMSS>.json`.
pub fn write_report<T: Serialize>(dir: &Path, prefix: &str, value: &T) -> Result<PathBuf> {
	std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
	let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
	let path = dir.join(format!("{}_{}.json", prefix, stamp));
	std::fs::write(&path, serde_json::to_string_pretty(value)?).with_context(|| format!("writing {}", path.display()))?;
	tracing::info!(report = %path.display(), "Wrote report");
	Ok(path)
}

/// Evaluate the questions in `questions_file` and write an `eval_*.json` report.
pub fn run_eval(pipeline: &RagPipeline, questions_file: &Path, k: usize, reports_dir: &Path) -> Result<(Vec<EvalRow>, PathBuf)> {
	let questions = load_questions(questions_file)?;
	let rows = evaluate_questions(pipeline, &questions, k)?;
	let path = write_report(reports_dir, "eval", &rows)?;
	Ok((rows, path))
}
