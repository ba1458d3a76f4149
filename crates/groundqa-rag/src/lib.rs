//! groundqa-rag
//!
//! The query side: extractive answer synthesis, answer evaluation, the `ask`
//! pipeline, batch evaluation reports and the parameter sweep.
pub mod answer;
pub mod eval;
pub mod pipeline;
pub mod runner;
pub mod sweep;

pub use answer::{AnswerSynthesizer, FALLBACK_ANSWER};
pub use eval::{EvalReport, Evaluator};
pub use pipeline::{AskResponse, RagPipeline, SourceRef, EMPTY_INDEX_MESSAGE};
pub use runner::{load_questions, run_eval, write_report, EvalRow};
pub use sweep::{composite_score, Sweep, SweepRow, SweepSpace};
