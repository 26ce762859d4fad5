//! Fuzzy name scoring and ranking
//!
//! Confidence is the maximum of four similarity measures computed over the
//! normalized pair. Each measure tolerates a different distortion
//! (misspelling, partial overlap, token reordering, token insertion), so the
//! union catches more true positives than any single measure.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

use crate::types::{BulkQueryResult, DatasetRow, MatchedRecord, SearchSummary};

/// Normalize free text for comparison: lowercase, strip punctuation,
/// collapse internal whitespace. Idempotent; anything empty normalizes to
/// the empty string.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            // Whitespace and punctuation both act as token boundaries.
            pending_space = true;
        }
    }
    out
}

/// Similarity of two normalized strings, in [0, 100]
fn edit_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Best alignment of the shorter string against any equal-length character
/// window of the longer one
fn best_substring_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };
    if short.len() == long.len() {
        return edit_similarity(a, b);
    }

    let needle: String = short.iter().collect();
    let mut best = 0.0f64;
    for window in long.windows(short.len()) {
        let haystack: String = window.iter().collect();
        best = best.max(edit_similarity(&needle, &haystack));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Similarity after sorting tokens, so word order does not matter
fn token_sort_similarity(a: &str, b: &str) -> f64 {
    let mut a_tokens: Vec<&str> = a.split_whitespace().collect();
    let mut b_tokens: Vec<&str> = b.split_whitespace().collect();
    a_tokens.sort_unstable();
    b_tokens.sort_unstable();
    edit_similarity(&a_tokens.join(" "), &b_tokens.join(" "))
}

/// Set-based token similarity: compare the shared tokens against each
/// side's full token set, so extra tokens on one side cost little
fn token_set_similarity(a: &str, b: &str) -> f64 {
    let a_set: BTreeSet<&str> = a.split_whitespace().collect();
    let b_set: BTreeSet<&str> = b.split_whitespace().collect();

    let common: Vec<&str> = a_set.intersection(&b_set).copied().collect();
    let a_only: Vec<&str> = a_set.difference(&b_set).copied().collect();
    let b_only: Vec<&str> = b_set.difference(&a_set).copied().collect();

    let base = common.join(" ");
    let with_a = join_nonempty(&base, &a_only.join(" "));
    let with_b = join_nonempty(&base, &b_only.join(" "));

    edit_similarity(&base, &with_a)
        .max(edit_similarity(&base, &with_b))
        .max(edit_similarity(&with_a, &with_b))
}

fn join_nonempty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{} {}", left, right),
    }
}

/// Confidence that `query` and `target` name the same entity, in [0, 100].
/// Zero when either side normalizes to nothing.
pub fn score(query: &str, target: &str) -> f64 {
    let q = normalize(query);
    let t = normalize(target);
    if q.is_empty() || t.is_empty() {
        return 0.0;
    }

    edit_similarity(&q, &t)
        .max(best_substring_similarity(&q, &t))
        .max(token_sort_similarity(&q, &t))
        .max(token_set_similarity(&q, &t))
        .clamp(0.0, 100.0)
}

/// Screen one query against every (row, column) pair.
///
/// Matches at or above `threshold` are returned sorted by descending
/// confidence; ties keep original row order (stable sort), never column
/// order or any other key.
pub fn search_single(
    query: &str,
    columns: &[String],
    rows: &[DatasetRow],
    threshold: f64,
) -> Vec<MatchedRecord> {
    let mut matches = Vec::new();
    for row in rows {
        for column in columns {
            let Some(value) = row.value(column) else {
                continue;
            };
            let confidence = score(query, value);
            if confidence >= threshold {
                matches.push(MatchedRecord {
                    query_name: query.to_string(),
                    confidence,
                    matched_column: column.clone(),
                    matched_value: value.to_string(),
                    entity_ref: row.entity_ref,
                    full_record: row.snapshot(),
                });
            }
        }
    }
    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    matches
}

/// Screen many queries independently, keeping the best match per query
pub fn search_bulk(
    queries: &[String],
    columns: &[String],
    rows: &[DatasetRow],
    threshold: f64,
) -> (Vec<BulkQueryResult>, SearchSummary) {
    let mut results = Vec::with_capacity(queries.len());
    let mut total_found = 0;
    let mut total_above_threshold = 0;
    let mut max_confidence = 0.0f64;

    for query in queries {
        let best = search_single(query, columns, rows, threshold)
            .into_iter()
            .next();
        let matched = best.as_ref().map(|m| m.confidence).unwrap_or(0.0);
        let found = best.is_some();
        if found {
            total_found += 1;
        }
        if found && matched >= threshold {
            total_above_threshold += 1;
        }
        max_confidence = max_confidence.max(matched);

        results.push(BulkQueryResult {
            query_name: query.clone(),
            found,
            matched,
            best_match: best,
        });
    }

    let summary = SearchSummary {
        total_searched: queries.len(),
        total_found,
        total_above_threshold,
        max_confidence,
    };
    (results, summary)
}
