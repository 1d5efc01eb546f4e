// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity index backend trait.

use async_trait::async_trait;

use crate::error::AttuneError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SegmentFilter, SegmentMatch, SegmentMetadata};

/// Adapter for a vector store that embeds, stores and searches text segments.
#[async_trait]
pub trait SimilarityBackend: PluginAdapter {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AttuneError>;

    /// Stores a segment and returns its id.
    async fn upsert(
        &self,
        vector: Vec<f32>,
        text: String,
        metadata: SegmentMetadata,
    ) -> Result<String, AttuneError>;

    /// Returns up to `k` segments matching `filter` with similarity of at
    /// least `min_score`, best first.
    async fn search(
        &self,
        vector: &[f32],
        filter: &SegmentFilter,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SegmentMatch>, AttuneError>;

    /// Removes every segment matching `filter` and returns how many were removed.
    async fn delete(&self, filter: &SegmentFilter) -> Result<usize, AttuneError>;
}
