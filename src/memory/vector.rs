//! Vector similarity.

use std::cmp::Ordering;

use super::fact::FactRecord;

/// Cosine similarity in [-1, 1]. Returns 0.0 for mismatched lengths, empty
/// vectors or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Top `limit` records by descending similarity to `query`.
///
/// Ties keep insertion order.
pub fn rank<'a>(
    records: impl IntoIterator<Item = &'a FactRecord>,
    query: &[f32],
    limit: usize,
) -> Vec<(f32, &'a FactRecord)> {
    let mut scored: Vec<(f32, &FactRecord)> = records
        .into_iter()
        .map(|record| (cosine_similarity(&record.embedding, query), record))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fact::FactCategory;
    use chrono::Utc;

    fn record(content: &str, embedding: Vec<f32>) -> FactRecord {
        FactRecord {
            id: content.into(),
            content: content.into(),
            category: FactCategory::General,
            subject: None,
            fact_type: None,
            embedding,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn rank_orders_by_similarity_and_truncates() {
        let records = vec![
            record("far", vec![0.0, 1.0]),
            record("near", vec![1.0, 0.1]),
            record("exact", vec![1.0, 0.0]),
        ];
        let ranked = rank(&records, &[1.0, 0.0], 2);
        let names: Vec<_> = ranked.iter().map(|(_, r)| r.content.as_str()).collect();
        assert_eq!(names, vec!["exact", "near"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let records = vec![
            record("first", vec![0.0, 1.0]),
            record("second", vec![0.0, 2.0]),
            record("third", vec![0.0, 3.0]),
        ];
        for _ in 0..3 {
            let ranked = rank(&records, &[1.0, 0.0], 3);
            let names: Vec<_> = ranked.iter().map(|(_, r)| r.content.as_str()).collect();
            assert_eq!(names, vec!["first", "second", "third"]);
        }
    }
}
