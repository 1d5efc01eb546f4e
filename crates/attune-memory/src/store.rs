// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory similarity backend.
//!
//! Segments live in a `DashMap`; search is a brute-force cosine scan, which
//! is adequate for the per-process session volumes this engine handles.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use attune_core::error::AttuneError;
use attune_core::traits::{EmbeddingAdapter, PluginAdapter, SimilarityBackend};
use attune_core::types::{
    AdapterType, EmbeddingInput, SegmentFilter, SegmentMatch, SegmentMetadata,
};

use crate::types::{cosine_similarity, EmbeddedSegment};

pub struct InMemoryVectorStore {
    embedder: Arc<dyn EmbeddingAdapter>,
    segments: DashMap<String, EmbeddedSegment>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self {
            embedder,
            segments: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for InMemoryVectorStore {
    fn name(&self) -> &str {
        "in-memory-vector-store"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SimilarityIndex
    }
}

#[async_trait]
impl SimilarityBackend for InMemoryVectorStore {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AttuneError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;

        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AttuneError::Internal("embedding returned no results".to_string()))
    }

    async fn upsert(
        &self,
        vector: Vec<f32>,
        text: String,
        metadata: SegmentMetadata,
    ) -> Result<String, AttuneError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.segments.insert(
            id.clone(),
            EmbeddedSegment {
                id: id.clone(),
                text,
                embedding: vector,
                metadata,
            },
        );
        Ok(id)
    }

    async fn search(
        &self,
        vector: &[f32],
        filter: &SegmentFilter,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SegmentMatch>, AttuneError> {
        let mut results: Vec<SegmentMatch> = self
            .segments
            .iter()
            .filter(|entry| filter.matches(&entry.metadata))
            .filter_map(|entry| {
                let score = cosine_similarity(vector, &entry.embedding)?;
                (score >= min_score).then(|| SegmentMatch {
                    id: entry.id.clone(),
                    text: entry.text.clone(),
                    metadata: entry.metadata.clone(),
                    score,
                })
            })
            .collect();

        // Ties broken by id so repeated searches return a stable order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        results.truncate(k);
        Ok(results)
    }

    async fn delete(&self, filter: &SegmentFilter) -> Result<usize, AttuneError> {
        let before = self.segments.len();
        self.segments.retain(|_, segment| !filter.matches(&segment.metadata));
        let removed = before.saturating_sub(self.segments.len());
        debug!(removed, "segments deleted");
        Ok(removed)
    }
}
