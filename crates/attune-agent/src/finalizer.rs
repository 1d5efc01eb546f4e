// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use attune_core::error::AttuneError;
use attune_core::traits::LanguageModel;
use attune_core::types::{ContentType, SegmentMetadata};
use attune_memory::ContextIndex;
use attune_session::{Finalizer, ScoreSummary, SessionRecord};

use crate::context::{build_summary_prompt, fallback_summary, SUMMARY_INSTRUCTION};
use crate::scoring::score_record;

/// Scores a burnout assessment and asks the language model for its narrative.
///
/// A model failure falls back to a fixed summary so finalization always
/// completes. Earlier check-ins contribute one segment per prior session.
/// The summary is indexed for later sessions of the same user.
pub struct BurnoutFinalizer {
    model: Arc<dyn LanguageModel>,
    index: Arc<ContextIndex>,
}

impl BurnoutFinalizer {
    pub fn new(model: Arc<dyn LanguageModel>, index: Arc<ContextIndex>) -> Self {
        Self { model, index }
    }
}

#[async_trait]
impl Finalizer for BurnoutFinalizer {
    async fn finalize(&self, record: &SessionRecord) -> Result<ScoreSummary, AttuneError> {
        let score = score_record(record);

        let query: Vec<&str> = record
            .entries
            .values()
            .filter_map(|e| e.user_text())
            .collect();
        let history = match self
            .index
            .similar_sessions(&record.user_id, &record.session_id, &query.join(" "))
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(session_id = %record.session_id, error = %e, "history lookup failed");
                Vec::new()
            }
        };

        let prompt = build_summary_prompt(record, &score, &history);
        let summary = match self.model.complete(SUMMARY_INSTRUCTION, &prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => fallback_summary(&score),
            Err(e) => {
                warn!(session_id = %record.session_id, error = %e, "summary generation failed, using fallback");
                fallback_summary(&score)
            }
        };

        let metadata = SegmentMetadata::for_session(
            record.session_id.clone(),
            record.user_id.clone(),
            ContentType::Summary,
        );
        if let Err(e) = self.index.index(&summary, metadata).await {
            warn!(session_id = %record.session_id, error = %e, "failed to index summary");
        }
        debug!(session_id = %record.session_id, score = score.score, "summary generated");

        Ok(ScoreSummary {
            score: score.score,
            max_score: score.max_score,
            level: score.level.to_string(),
            summary,
            finalized_at: Utc::now(),
        })
    }
}
