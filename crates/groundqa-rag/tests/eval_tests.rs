use std::sync::Arc;

use groundqa_embed::HashEmbedder;
use groundqa_rag::Evaluator;
use proptest::prelude::*;

fn evaluator() -> Evaluator { Evaluator::new(Arc::new(HashEmbedder::new(128))) }

#[test]
fn support_is_zero_without_answer_or_contexts() {
    let ev = evaluator();
    let ctx = vec!["Vector stores keep embeddings for similarity search.".to_string()];
    assert_eq!(ev.score_support("", &ctx, 0.6).unwrap(), 0.0);
    assert_eq!(ev.score_support("Vector stores keep embeddings for similarity search.", &[], 0.6).unwrap(), 0.0);
    // only fragments under the sentence length floor
    assert_eq!(ev.score_support("Too short.", &ctx, 0.6).unwrap(), 0.0);
}

#[test]
fn one_ungrounded_sentence_halves_support() {
    let ev = evaluator();
    let ctx = vec!["Vector stores keep embeddings for similarity search.".to_string()];
    let answer = "Vector stores keep embeddings for similarity search. Penguins migrate across frozen tundra annually.";
    assert_eq!(ev.score_support(answer, &ctx, 0.6).unwrap(), 0.5);
}

#[test]
fn support_is_rounded_to_three_places() {
    let ev = evaluator();
    let ctx = vec!["Vector stores keep embeddings for similarity search.".to_string()];
    let answer = "Vector stores keep embeddings for similarity search.\nPenguins migrate across frozen tundra annually.\nBread rises when the yeast is still alive.";
    assert_eq!(ev.score_support(answer, &ctx, 0.6).unwrap(), 0.333);
}

#[test]
fn relevance_is_zero_without_contexts_and_high_for_identical_text() {
    let ev = evaluator();
    assert_eq!(ev.score_relevance("anything", &[]).unwrap(), 0.0);
    let r = ev.score_relevance("vector store search", &["vector store search".to_string()]).unwrap();
    assert!((r - 1.0).abs() < 1e-4);
}

#[test]
fn relevance_uses_unnormalized_centroid() {
    let ev = evaluator();
    let contexts = vec!["vector store search".to_string(), "penguins bread tundra".to_string()];
    let r = ev.score_relevance("vector store search", &contexts).unwrap();
    // half of the mass of the centroid is orthogonal-ish noise
    assert!(r < 0.75 && r > 0.25, "relevance {r}");
}

fn sentences() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{3,9}( [a-z]{3,9}){3,8}\\.", 0..5).prop_map(|s| s.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn support_rate_stays_in_unit_interval(answer in sentences(), ctx in prop::collection::vec(sentences(), 0..4), threshold in 0.0f32..1.0) {
        let rate = evaluator().score_support(&answer, &ctx, threshold).unwrap();
        prop_assert!((0.0..=1.0).contains(&rate));
    }

    #[test]
    fn relevance_stays_in_cosine_range(q in sentences(), ctx in prop::collection::vec(sentences(), 0..4)) {
        let r = evaluator().score_relevance(&q, &ctx).unwrap();
        prop_assert!((-1.0..=1.0).contains(&r));
    }
}
