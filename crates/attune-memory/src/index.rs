// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context retrieval index.
//!
//! Wraps a [`SimilarityBackend`] with the retrieval policy used by the
//! orchestrator: a relevance threshold below which matches are dropped,
//! historical-context lookups that never return the querying session,
//! per-session deduplication for similar-session lookups, and intervention
//! retrieval keyed by cognitive-distortion label.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use attune_config::RetrievalConfig;
use attune_core::error::AttuneError;
use attune_core::recording;
use attune_core::traits::SimilarityBackend;
use attune_core::types::{
    ContentType, SegmentFilter, SegmentMatch, SegmentMetadata, SessionId, UserId,
};
use tracing::{debug, info};

pub struct ContextIndex {
    backend: Arc<dyn SimilarityBackend>,
    config: RetrievalConfig,
}

impl ContextIndex {
    pub fn new(backend: Arc<dyn SimilarityBackend>, config: RetrievalConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Embeds and stores `content`, returning the segment id.
    pub async fn index(
        &self,
        content: &str,
        metadata: SegmentMetadata,
    ) -> Result<String, AttuneError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AttuneError::Validation(
                "cannot index empty content".to_string(),
            ));
        }

        let content_type = metadata.content_type;
        let vector = self.backend.embed(content).await?;
        let id = self
            .backend
            .upsert(vector, content.to_string(), metadata)
            .await?;

        recording::record_segment_indexed(&content_type.to_string());
        debug!(segment_id = %id, %content_type, "segment indexed");
        Ok(id)
    }

    /// Up to `k` matches for `query` that satisfy `filter` and clear the
    /// relevance threshold, best first.
    pub async fn search(
        &self,
        query: &str,
        filter: &SegmentFilter,
        k: usize,
    ) -> Result<Vec<SegmentMatch>, AttuneError> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.backend.embed(query).await?;
        self.backend
            .search(&vector, filter, k, self.config.similarity_threshold as f32)
            .await
    }

    /// Prior-session content of `user` relevant to `query`.
    ///
    /// Content from `current_session` is never returned. Catalog segments
    /// have no user and are excluded by the user filter.
    pub async fn historical_context(
        &self,
        user_id: &UserId,
        current_session: &SessionId,
        query: &str,
    ) -> Result<Vec<SegmentMatch>, AttuneError> {
        let filter = SegmentFilter::default()
            .user(user_id.clone())
            .excluding_session(current_session.clone());
        self.search(query, &filter, self.config.max_results).await
    }

    /// One match per prior session, keeping that session's longest matching
    /// segment, ordered by score.
    pub async fn similar_sessions(
        &self,
        user_id: &UserId,
        current_session: &SessionId,
        query: &str,
    ) -> Result<Vec<SegmentMatch>, AttuneError> {
        let filter = SegmentFilter::default()
            .user(user_id.clone())
            .excluding_session(current_session.clone());
        // Over-fetch so deduplication still leaves enough distinct sessions.
        let fetch = self.config.max_results.saturating_mul(4);
        let matches = self.search(query, &filter, fetch).await?;

        let mut deduped = dedup_longest_per_session(matches);
        deduped.truncate(self.config.max_results);
        Ok(deduped)
    }

    /// Interventions for each detected distortion label.
    ///
    /// Lookup is keyed by label, so the relevance threshold does not apply;
    /// `query` only ranks the interventions stored under one label.
    pub async fn interventions_for(
        &self,
        labels: &[String],
        query: &str,
    ) -> Result<Vec<SegmentMatch>, AttuneError> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let vector = self.backend.embed(query).await?;
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for label in labels {
            let filter = SegmentFilter::default()
                .content_type(ContentType::Intervention)
                .label(label.to_lowercase());
            let matches = self
                .backend
                .search(
                    &vector,
                    &filter,
                    self.config.interventions_per_label,
                    f32::NEG_INFINITY,
                )
                .await?;
            found.extend(matches.into_iter().filter(|m| seen.insert(m.id.clone())));
        }
        Ok(found)
    }

    /// Removes every segment of one session.
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<usize, AttuneError> {
        self.ensure_deletion_allowed()?;
        let removed = self
            .backend
            .delete(&SegmentFilter::default().session(session_id.clone()))
            .await?;
        info!(session_id = %session_id, removed, "session segments deleted");
        Ok(removed)
    }

    /// Removes every segment of one user across all sessions.
    pub async fn delete_user(&self, user_id: &UserId) -> Result<usize, AttuneError> {
        self.ensure_deletion_allowed()?;
        let removed = self
            .backend
            .delete(&SegmentFilter::default().user(user_id.clone()))
            .await?;
        info!(user_id = %user_id, removed, "user segments deleted");
        Ok(removed)
    }

    fn ensure_deletion_allowed(&self) -> Result<(), AttuneError> {
        if self.config.allow_deletion {
            Ok(())
        } else {
            Err(AttuneError::Validation(
                "index deletion is disabled (retrieval.allow_deletion = false)".to_string(),
            ))
        }
    }
}

/// Keeps the longest segment per originating session, best score first.
///
/// Segments without a session id pass through unchanged.
pub fn dedup_longest_per_session(matches: Vec<SegmentMatch>) -> Vec<SegmentMatch> {
    let mut by_session: HashMap<SessionId, SegmentMatch> = HashMap::new();
    let mut unscoped = Vec::new();

    for m in matches {
        let Some(session_id) = m.metadata.session_id.clone() else {
            unscoped.push(m);
            continue;
        };
        match by_session.get(&session_id) {
            Some(kept) if kept.text.chars().count() >= m.text.chars().count() => {}
            _ => {
                by_session.insert(session_id, m);
            }
        }
    }

    let mut out: Vec<SegmentMatch> = by_session.into_values().chain(unscoped).collect();
    out.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    out
}

/// Renders matches as a context block for a model prompt.
pub fn format_context(heading: &str, matches: &[SegmentMatch]) -> String {
    if matches.is_empty() {
        return String::new();
    }
    let mut block = format!("## {heading}\n");
    for m in matches {
        block.push_str(&format!("- {}\n", m.text));
    }
    block
}
