//! Paragraph-packing segmenter.
//!
//! Text is normalised (CRLF to LF, horizontal whitespace runs to one space,
//! 3+ newlines to a blank line) and split on blank lines. Paragraphs are packed
//! greedily into a buffer of at most `size` characters; when a paragraph does
//! not fit, the buffer is closed and the next one starts with the last
//! `overlap` characters of the closed chunk. Every emitted chunk is cut to
//! `size` characters, so an oversized paragraph is truncated, never re-split.
//! Lengths are counted in `char`s.

const PARAGRAPH_SEP: &str = "\n\n";

pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n");

    let mut spaced = String::with_capacity(text.len());
    let mut in_space_run = false;
    for c in text.chars() {
        if c != '\n' && c.is_whitespace() {
            if !in_space_run { spaced.push(' '); }
            in_space_run = true;
        } else {
            spaced.push(c);
            in_space_run = false;
        }
    }

    let mut out = String::with_capacity(spaced.len());
    let mut newline_run = 0usize;
    for c in spaced.chars() {
        if c == '\n' {
            newline_run += 1;
            continue;
        }
        if newline_run > 0 {
            out.push_str(if newline_run >= 2 { PARAGRAPH_SEP } else { "\n" });
            newline_run = 0;
        }
        out.push(c);
    }
    if newline_run > 0 {
        out.push_str(if newline_run >= 2 { PARAGRAPH_SEP } else { "\n" });
    }
    out
}

/// Split `text` into ordered, size-bounded, overlapping chunks.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let normalized = normalize(text);
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0usize;

    for para in normalized.split(PARAGRAPH_SEP).map(str::trim).filter(|p| !p.is_empty()) {
        let para_len = para.chars().count();
        if buf_len + para_len <= size {
            if !buf.is_empty() {
                buf.push_str(PARAGRAPH_SEP);
                buf_len += PARAGRAPH_SEP.len();
            }
            buf.push_str(para);
            buf_len += para_len;
            continue;
        }

        let mut next = String::new();
        if !buf.is_empty() {
            let closed = truncate_chars(&buf, size);
            if overlap > 0 {
                next.push_str(tail_chars(&closed, overlap));
                next.push_str(PARAGRAPH_SEP);
            }
            chunks.push(closed);
        }
        next.push_str(para);
        buf_len = next.chars().count();
        buf = next;
    }

    if !buf.trim().is_empty() {
        chunks.push(truncate_chars(&buf, size));
    }
    chunks
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

fn tail_chars(s: &str, n: usize) -> &str {
    let total = s.chars().count();
    if n >= total { return s; }
    match s.char_indices().nth(total - n) {
        Some((byte_idx, _)) => &s[byte_idx..],
        None => "",
    }
}
