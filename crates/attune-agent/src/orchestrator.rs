// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session orchestrator.
//!
//! Accepts user input, dispatches media to the analysis adapters and routes
//! every outcome into the session aggregator. Media submissions return as
//! soon as the job is started; the outcome is posted to the session's
//! mailbox by a background task.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use attune_analysis::{AnalysisDispatcher, AnalysisProviders, AnalysisRequest, PendingAnalysis};
use attune_config::AttuneConfig;
use attune_core::analysis::{AnalysisResult, TextAnalysis};
use attune_core::error::AttuneError;
use attune_core::traits::{LanguageModel, SimilarityBackend};
use attune_core::types::{ContentType, Modality, SegmentMetadata, SessionId, UnitId, UserId};
use attune_jobs::JobPoller;
use attune_memory::ContextIndex;
use attune_session::{
    EntryUpdate, InMemorySessionStore, ScoreSummary, SessionAggregator, SessionProgress,
    SessionRecord, SessionStore, UnitKind, UnitSpec,
};
use tokio::sync::watch;

use crate::context::{
    build_turn_prompt, describe_analysis, latest_media_emotions, TURN_INSTRUCTION,
};
use crate::finalizer::BurnoutFinalizer;
use crate::interventions::seed_interventions;

/// Reply to one conversational turn.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub reply: String,
    pub analysis: TextAnalysis,
    /// Intervention texts retrieved for the detected distortions.
    pub interventions: Vec<String>,
}

pub struct SessionOrchestrator {
    aggregator: SessionAggregator,
    dispatcher: Arc<AnalysisDispatcher>,
    index: Arc<ContextIndex>,
    model: Arc<dyn LanguageModel>,
    poller: JobPoller,
    index_messages: bool,
}

impl SessionOrchestrator {
    /// Wires the engine with an in-memory session store.
    pub fn new(
        config: &AttuneConfig,
        providers: AnalysisProviders,
        similarity: Arc<dyn SimilarityBackend>,
    ) -> Self {
        let store = Arc::new(InMemorySessionStore::new(config.session.max_sessions));
        Self::with_store(config, providers, similarity, store)
    }

    pub fn with_store(
        config: &AttuneConfig,
        providers: AnalysisProviders,
        similarity: Arc<dyn SimilarityBackend>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let poller = JobPoller::new(&config.polling);
        let index = Arc::new(ContextIndex::new(similarity, config.retrieval.clone()));
        let model = providers.model.clone();
        let finalizer = Arc::new(BurnoutFinalizer::new(model.clone(), index.clone()));
        let dispatcher = Arc::new(AnalysisDispatcher::new(
            providers,
            poller.clone(),
            &config.polling,
            &config.analysis,
        ));

        Self {
            aggregator: SessionAggregator::new(store, finalizer),
            dispatcher,
            index,
            model,
            poller,
            index_messages: config.session.index_messages,
        }
    }

    pub fn aggregator(&self) -> &SessionAggregator {
        &self.aggregator
    }

    pub fn index(&self) -> &Arc<ContextIndex> {
        &self.index
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    /// Indexes the built-in intervention catalog.
    pub async fn seed_interventions(&self) -> Result<usize, AttuneError> {
        seed_interventions(&self.index).await
    }

    pub async fn start_session(
        &self,
        user_id: UserId,
        units: Vec<UnitSpec>,
    ) -> Result<SessionId, AttuneError> {
        self.aggregator.open_session(user_id, units).await
    }

    /// Records a direct text answer. Returns whether the session is complete.
    pub async fn submit_text(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        text: &str,
    ) -> Result<bool, AttuneError> {
        let complete = self.aggregator.record_text(session_id, unit_id, text).await?;
        if self.index_messages {
            let record = self.aggregator.session(session_id).await?;
            // Likert answers carry no retrievable meaning on their own.
            if record.unit(unit_id).is_some_and(|u| u.kind != UnitKind::Likert) {
                self.index_quietly(&record, text, ContentType::Message).await;
            }
        }
        Ok(complete)
    }

    /// Starts analysis of a recording for a unit.
    ///
    /// Locator validation and resubmission conflicts fail here. Provider
    /// failures, timeouts and unexpected states are merged into the unit as
    /// error text once the job ends.
    pub async fn submit_media(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        modality: Modality,
        locator: &str,
    ) -> Result<(), AttuneError> {
        let record = self.target(session_id, unit_id).await?;
        let request = AnalysisRequest::media(modality, locator)?;
        let key = logical_key(session_id, unit_id, modality);
        let pending = self.dispatcher.dispatch(request, Some(key)).await?;

        info!(
            session_id = %session_id,
            unit_id = %unit_id,
            %modality,
            "media analysis submitted"
        );
        let delivery = self.delivery();
        let unit_id = unit_id.clone();
        tokio::spawn(async move { delivery.run(record, unit_id, modality, pending).await });
        Ok(())
    }

    /// Transcribes a spoken answer, records the transcript as the unit's text
    /// and merges its text analysis.
    pub async fn submit_spoken_turn(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        locator: &str,
    ) -> Result<(), AttuneError> {
        let record = self.target(session_id, unit_id).await?;
        let key = format!("{session_id}/{unit_id}/transcript");
        let pending = self.dispatcher.transcribe(locator, Some(key)).await?;

        let aggregator = self.aggregator.clone();
        let dispatcher = self.dispatcher.clone();
        let delivery = self.delivery();
        let unit_id = unit_id.clone();
        tokio::spawn(async move {
            let transcript = match pending.await {
                Ok(transcript) if !transcript.is_empty() => transcript,
                Ok(_) => {
                    let failed = EntryUpdate::Failed {
                        modality: Modality::Text,
                        message: "transcript was empty".to_string(),
                    };
                    post_or_log(&aggregator, &record.session_id, &unit_id, failed).await;
                    return;
                }
                Err(e) => {
                    warn!(session_id = %record.session_id, unit_id = %unit_id, error = %e, "transcription failed");
                    let failed = EntryUpdate::Failed {
                        modality: Modality::Text,
                        message: e.to_string(),
                    };
                    post_or_log(&aggregator, &record.session_id, &unit_id, failed).await;
                    return;
                }
            };

            let text = EntryUpdate::Text(transcript.clone());
            if let Err(e) = aggregator.apply(&record.session_id, &unit_id, text).await {
                warn!(session_id = %record.session_id, error = %e, "failed to record transcript");
                return;
            }
            delivery.index(&record, &transcript, ContentType::Message).await;

            match dispatcher
                .dispatch(AnalysisRequest::Text(transcript), None)
                .await
            {
                Ok(pending) => delivery.run(record, unit_id, Modality::Text, pending).await,
                Err(e) => {
                    let failed = EntryUpdate::Failed {
                        modality: Modality::Text,
                        message: e.to_string(),
                    };
                    post_or_log(&aggregator, &record.session_id, &unit_id, failed).await;
                }
            }
        });
        Ok(())
    }

    /// Generates a CBT reply to `message` within a session.
    pub async fn respond(
        &self,
        session_id: &SessionId,
        message: &str,
    ) -> Result<TurnReply, AttuneError> {
        let record = self.aggregator.session(session_id).await?;
        let analysis = self.dispatcher.text().analyze(message).await?;

        if self.index_messages {
            self.index_quietly(&record, message, ContentType::Message).await;
            let described = describe_analysis(&AnalysisResult::Text(analysis.clone()));
            self.index_quietly(&record, &described, ContentType::Analysis)
                .await;
        }

        let history = self
            .index
            .historical_context(&record.user_id, session_id, message)
            .await?;
        let labels: Vec<String> = analysis
            .distortions
            .iter()
            .map(|d| d.label.clone())
            .collect();
        let interventions = self.index.interventions_for(&labels, message).await?;
        let media = latest_media_emotions(&record, 3);

        let prompt = build_turn_prompt(message, &analysis, &media, &history, &interventions);
        let reply = self.model.complete(TURN_INSTRUCTION, &prompt).await?;
        let reply = reply.trim().to_string();

        if self.index_messages {
            self.index_quietly(&record, &reply, ContentType::Response).await;
        }
        debug!(
            session_id = %session_id,
            history = history.len(),
            interventions = interventions.len(),
            "turn generated"
        );

        Ok(TurnReply {
            reply,
            analysis,
            interventions: interventions.into_iter().map(|m| m.text).collect(),
        })
    }

    pub async fn session(&self, session_id: &SessionId) -> Result<SessionRecord, AttuneError> {
        self.aggregator.session(session_id).await
    }

    pub async fn is_complete(&self, session_id: &SessionId) -> Result<bool, AttuneError> {
        self.aggregator.is_complete(session_id).await
    }

    /// Recomputes completion, finalizing the session if every unit is answered.
    pub async fn check_completion(&self, session_id: &SessionId) -> Result<bool, AttuneError> {
        self.aggregator.check_completion(session_id).await
    }

    pub async fn finalize(&self, session_id: &SessionId) -> Result<ScoreSummary, AttuneError> {
        self.aggregator.finalize(session_id).await
    }

    pub async fn wait_for_completion(
        &self,
        session_id: &SessionId,
    ) -> Result<ScoreSummary, AttuneError> {
        self.aggregator.wait_for_completion(session_id).await
    }

    pub fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> Result<watch::Receiver<SessionProgress>, AttuneError> {
        self.aggregator.subscribe(session_id)
    }

    pub async fn close_session(&self, session_id: &SessionId) -> Result<SessionRecord, AttuneError> {
        self.aggregator.close_session(session_id).await
    }

    /// Removes everything indexed for a user.
    pub async fn forget_user(&self, user_id: &UserId) -> Result<usize, AttuneError> {
        self.index.delete_user(user_id).await
    }

    /// Stops polling and every session mailbox.
    pub fn shutdown(&self) {
        self.poller.shutdown();
        self.aggregator.shutdown();
        info!("session orchestrator shut down");
    }

    async fn target(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
    ) -> Result<SessionRecord, AttuneError> {
        let record = self.aggregator.session(session_id).await?;
        if record.unit(unit_id).is_none() {
            return Err(AttuneError::InvalidUnit {
                session_id: session_id.to_string(),
                unit_id: unit_id.to_string(),
            });
        }
        Ok(record)
    }

    fn delivery(&self) -> Delivery {
        Delivery {
            aggregator: self.aggregator.clone(),
            index: self.index.clone(),
            index_messages: self.index_messages,
        }
    }

    async fn index_quietly(&self, record: &SessionRecord, content: &str, content_type: ContentType) {
        self.delivery().index(record, content, content_type).await;
    }
}

/// Carries a finished analysis back into the session.
#[derive(Clone)]
struct Delivery {
    aggregator: SessionAggregator,
    index: Arc<ContextIndex>,
    index_messages: bool,
}

impl Delivery {
    async fn run(
        &self,
        record: SessionRecord,
        unit_id: UnitId,
        modality: Modality,
        pending: PendingAnalysis,
    ) {
        let session_id = &record.session_id;
        let update = match pending.await {
            Ok(result) => match result.to_json() {
                Ok(json) => {
                    self.index(&record, &describe_analysis(&result), ContentType::Analysis)
                        .await;
                    EntryUpdate::Insight {
                        modality,
                        result: json,
                    }
                }
                Err(e) => EntryUpdate::Failed {
                    modality,
                    message: e.to_string(),
                },
            },
            Err(e) => {
                if e.is_absorbable() {
                    warn!(session_id = %session_id, unit_id = %unit_id, %modality, error = %e, "analysis failed");
                } else {
                    error!(session_id = %session_id, unit_id = %unit_id, %modality, error = %e, "analysis aborted");
                }
                EntryUpdate::Failed {
                    modality,
                    message: e.to_string(),
                }
            }
        };
        post_or_log(&self.aggregator, session_id, &unit_id, update).await;
    }

    async fn index(&self, record: &SessionRecord, content: &str, content_type: ContentType) {
        if !self.index_messages || content.trim().is_empty() {
            return;
        }
        let metadata = SegmentMetadata::for_session(
            record.session_id.clone(),
            record.user_id.clone(),
            content_type,
        );
        if let Err(e) = self.index.index(content, metadata).await {
            warn!(session_id = %record.session_id, %content_type, error = %e, "failed to index content");
        }
    }
}

async fn post_or_log(
    aggregator: &SessionAggregator,
    session_id: &SessionId,
    unit_id: &UnitId,
    update: EntryUpdate,
) {
    if let Err(e) = aggregator.post(session_id, unit_id, update).await {
        warn!(session_id = %session_id, unit_id = %unit_id, error = %e, "analysis outcome dropped");
    }
}

/// Resubmission key of one analysis: `session/unit/modality`.
pub fn logical_key(session_id: &SessionId, unit_id: &UnitId, modality: Modality) -> String {
    format!("{session_id}/{unit_id}/{modality}")
}
