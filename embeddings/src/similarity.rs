//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical vectors
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (magnitude_a * magnitude_b))
}

/// Compute the dot product between two embeddings.
///
/// Equals cosine similarity when both vectors are unit-normalized.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Normalize an embedding to unit length.
///
/// A zero vector stays zero; it is never divided into NaN.
pub fn normalize(embedding: &mut Embedding) {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}

/// A row position paired with its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRow {
    /// Position of the matched row in the candidate matrix.
    pub row: usize,

    /// Inner-product similarity score.
    pub score: f32,
}

/// Find the top-k most similar rows by inner product.
///
/// Both the query and the candidate rows are expected to be normalized, so
/// the inner product is the cosine similarity. The sort is stable: ties keep
/// their original row order.
pub fn find_top_k(query: &Embedding, rows: &[Embedding], k: usize) -> Result<Vec<ScoredRow>> {
    let mut scores: Vec<(OrderedFloat<f32>, usize)> = Vec::with_capacity(rows.len());

    for (row, embedding) in rows.iter().enumerate() {
        let score = dot_product(query, embedding)?;
        scores.push((OrderedFloat(score), row));
    }

    // Stable sort, score descending.
    scores.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(scores
        .into_iter()
        .take(k)
        .map(|(score, row)| ScoredRow { row, score: score.0 })
        .collect())
}
