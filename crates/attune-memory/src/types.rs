// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Segment types and vector math for the context index.

use attune_core::types::SegmentMetadata;

/// An embedded segment as held by the in-memory backend.
///
/// Immutable once stored; removal is the only mutation.
#[derive(Debug, Clone)]
pub struct EmbeddedSegment {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: SegmentMetadata,
}

/// Cosine similarity between two vectors.
///
/// Returns `None` for mismatched dimensions and `Some(0.0)` when either
/// vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return Some(0.0);
    }
    Some(dot / (norm_a * norm_b))
}

/// L2-normalize a vector in place. Zero vectors are left unchanged.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}
