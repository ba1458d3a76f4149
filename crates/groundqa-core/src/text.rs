//! Sentence splitting and vector math shared by the answer and evaluation paths.

/// Fragments shorter than this (after trimming) are headers, bullets or noise.
pub const MIN_SENTENCE_CHARS: usize = 20;

/// Rough ~4 chars per token estimate, never below 1.
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count() as f64;
    ((chars / 4.0).round_ties_even() as usize).max(1)
}

/// Break after `.`, `!` or `?` followed by whitespace, and on newlines.
/// Keeps the terminal punctuation and drops fragments below `MIN_SENTENCE_CHARS`.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let boundary = c == '\n' || (c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')));
        if boundary {
            push_sentence(&mut out, &current);
            current.clear();
            prev = None;
            while chars.peek().is_some_and(|n| if c == '\n' { *n == '\n' } else { n.is_whitespace() }) {
                chars.next();
            }
            continue;
        }
        current.push(c);
        prev = Some(c);
    }
    push_sentence(&mut out, &current);
    out
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let s = raw.trim();
    if s.chars().count() >= MIN_SENTENCE_CHARS {
        out.push(s.to_string());
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let na = dot(a, a).sqrt();
    let nb = dot(b, b).sqrt();
    dot(a, b) / (na * nb + 1e-9)
}

/// Arithmetic mean of equally sized vectors (not re-normalised).
pub fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let mut acc = vec![0f32; first.len()];
    for v in vectors {
        for (a, x) in acc.iter_mut().zip(v) { *a += x; }
    }
    let n = vectors.len() as f32;
    for a in &mut acc { *a /= n; }
    Some(acc)
}
