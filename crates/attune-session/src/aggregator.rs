// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session aggregator: the single point where responses and asynchronous
//! analysis outcomes are merged into session records.
//!
//! Every session owns a mailbox consumed by one task, so updates for a
//! session are applied one at a time in arrival order. Completion is
//! recomputed after each merge. Finalization runs behind a per-session
//! `OnceCell`: concurrent completion checks share one finalizer call, and
//! later calls return the stored summary unchanged.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, watch, OnceCell};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use attune_core::error::AttuneError;
use attune_core::recording;
use attune_core::types::{SessionId, UnitId, UserId};

use crate::merge::EntryUpdate;
use crate::record::{likert_value, ScoreSummary, SessionRecord, UnitKind, UnitSpec};
use crate::store::SessionStore;

/// Computes the score and narrative summary of a completed session.
#[async_trait]
pub trait Finalizer: Send + Sync {
    async fn finalize(&self, record: &SessionRecord) -> Result<ScoreSummary, AttuneError>;
}

/// Snapshot published to subscribers after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionProgress {
    pub answered: usize,
    pub total: usize,
    pub complete: bool,
    pub summary: Option<ScoreSummary>,
}

struct Envelope {
    unit_id: UnitId,
    update: EntryUpdate,
    reply: Option<oneshot::Sender<Result<bool, AttuneError>>>,
}

struct SessionHandle {
    mailbox: mpsc::UnboundedSender<Envelope>,
    progress: watch::Sender<SessionProgress>,
    finalized: Arc<OnceCell<ScoreSummary>>,
    cancel: CancellationToken,
}

struct Inner {
    store: Arc<dyn SessionStore>,
    finalizer: Arc<dyn Finalizer>,
    sessions: DashMap<SessionId, SessionHandle>,
    cancel: CancellationToken,
}

#[derive(Clone)]
pub struct SessionAggregator {
    inner: Arc<Inner>,
}

impl SessionAggregator {
    pub fn new(store: Arc<dyn SessionStore>, finalizer: Arc<dyn Finalizer>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                finalizer,
                sessions: DashMap::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Creates a session expecting `units` and starts its mailbox.
    pub async fn open_session(
        &self,
        user_id: UserId,
        units: Vec<UnitSpec>,
    ) -> Result<SessionId, AttuneError> {
        if self.inner.cancel.is_cancelled() {
            return Err(AttuneError::Internal("session aggregator is shut down".into()));
        }
        if units.is_empty() {
            return Err(AttuneError::Validation(
                "a session needs at least one unit".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = units.iter().find(|u| !seen.insert(&u.id)) {
            return Err(AttuneError::Validation(format!(
                "duplicate unit id `{}`",
                dup.id
            )));
        }

        let session_id = SessionId::generate();
        let total = units.len();
        self.inner
            .store
            .put(SessionRecord::new(session_id.clone(), user_id.clone(), units))
            .await?;

        let (mailbox, rx) = mpsc::unbounded_channel();
        let (progress, _) = watch::channel(SessionProgress {
            total,
            ..SessionProgress::default()
        });
        let cancel = self.inner.cancel.child_token();
        self.inner.sessions.insert(
            session_id.clone(),
            SessionHandle {
                mailbox,
                progress,
                finalized: Arc::new(OnceCell::new()),
                cancel: cancel.clone(),
            },
        );
        tokio::spawn(self.clone().run_mailbox(session_id.clone(), rx, cancel));

        info!(session_id = %session_id, user_id = %user_id, units = total, "session opened");
        Ok(session_id)
    }

    /// Records the user's direct response to a unit and waits for the merge.
    ///
    /// Likert units only accept `1..=5` or never..always. Returns whether the
    /// session is complete after this response.
    pub async fn record_text(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        text: &str,
    ) -> Result<bool, AttuneError> {
        let record = self.session(session_id).await?;
        let unit = target_unit(&record, unit_id)?;
        let text = text.trim();
        if unit.kind == UnitKind::Likert && likert_value(text).is_none() {
            return Err(AttuneError::Validation(format!(
                "`{text}` is not a Likert answer (1-5 or never..always)"
            )));
        }
        self.apply(session_id, unit_id, EntryUpdate::Text(text.to_string()))
            .await
    }

    /// Merges `update` and waits until it is applied. Returns whether the
    /// session is complete afterwards.
    pub async fn apply(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        update: EntryUpdate,
    ) -> Result<bool, AttuneError> {
        self.validate_target(session_id, unit_id).await?;
        let (reply, rx) = oneshot::channel();
        self.send(
            session_id,
            Envelope {
                unit_id: unit_id.clone(),
                update,
                reply: Some(reply),
            },
        )?;
        rx.await.map_err(|_| {
            AttuneError::Internal(format!("mailbox of session {session_id} closed"))
        })?
    }

    /// Queues `update` without waiting for it to be applied.
    pub async fn post(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        update: EntryUpdate,
    ) -> Result<(), AttuneError> {
        self.validate_target(session_id, unit_id).await?;
        self.send(
            session_id,
            Envelope {
                unit_id: unit_id.clone(),
                update,
                reply: None,
            },
        )
    }

    /// Current snapshot of a session record.
    pub async fn session(&self, session_id: &SessionId) -> Result<SessionRecord, AttuneError> {
        self.inner
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| AttuneError::InvalidSession(session_id.to_string()))
    }

    pub async fn is_complete(&self, session_id: &SessionId) -> Result<bool, AttuneError> {
        Ok(self.session(session_id).await?.is_complete())
    }

    /// Recomputes completion and finalizes when it holds.
    pub async fn check_completion(&self, session_id: &SessionId) -> Result<bool, AttuneError> {
        let record = self.session(session_id).await?;
        if !record.is_complete() {
            return Ok(false);
        }
        self.finalize_record(&record).await?;
        Ok(true)
    }

    /// Score and summary of a completed session, computed on first call.
    pub async fn finalize(&self, session_id: &SessionId) -> Result<ScoreSummary, AttuneError> {
        let record = self.session(session_id).await?;
        if !record.is_complete() {
            return Err(AttuneError::SessionIncomplete(session_id.to_string()));
        }
        self.finalize_record(&record).await
    }

    pub fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> Result<watch::Receiver<SessionProgress>, AttuneError> {
        self.inner
            .sessions
            .get(session_id)
            .map(|h| h.progress.subscribe())
            .ok_or_else(|| AttuneError::InvalidSession(session_id.to_string()))
    }

    /// Waits until the session has been finalized.
    pub async fn wait_for_completion(
        &self,
        session_id: &SessionId,
    ) -> Result<ScoreSummary, AttuneError> {
        let mut rx = self.subscribe(session_id)?;
        let progress = rx.wait_for(|p| p.summary.is_some()).await.map_err(|_| {
            AttuneError::Internal(format!("session {session_id} closed before finalization"))
        })?;
        progress
            .summary
            .clone()
            .ok_or_else(|| AttuneError::Internal("finalized session has no summary".into()))
    }

    /// Stops the session's mailbox and evicts its record.
    pub async fn close_session(&self, session_id: &SessionId) -> Result<SessionRecord, AttuneError> {
        if let Some((_, handle)) = self.inner.sessions.remove(session_id) {
            handle.cancel.cancel();
        }
        let record = self
            .inner
            .store
            .remove(session_id)
            .await?
            .ok_or_else(|| AttuneError::InvalidSession(session_id.to_string()))?;
        info!(session_id = %session_id, "session closed");
        Ok(record)
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Stops every mailbox. Queued updates that were not yet applied are dropped.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    async fn validate_target(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
    ) -> Result<(), AttuneError> {
        let record = self.session(session_id).await?;
        target_unit(&record, unit_id).map(|_| ())
    }

    fn send(&self, session_id: &SessionId, envelope: Envelope) -> Result<(), AttuneError> {
        let mailbox = self
            .inner
            .sessions
            .get(session_id)
            .map(|h| h.mailbox.clone())
            .ok_or_else(|| AttuneError::InvalidSession(session_id.to_string()))?;
        mailbox
            .send(envelope)
            .map_err(|_| AttuneError::Internal(format!("mailbox of session {session_id} closed")))
    }

    async fn run_mailbox(
        self,
        session_id: SessionId,
        mut rx: mpsc::UnboundedReceiver<Envelope>,
        cancel: CancellationToken,
    ) {
        loop {
            let envelope = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = rx.recv() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let result = self
                .merge_now(&session_id, &envelope.unit_id, &envelope.update)
                .await;
            match envelope.reply {
                Some(reply) => {
                    let _ = reply.send(result);
                }
                None => {
                    if let Err(e) = result {
                        warn!(
                            session_id = %session_id,
                            unit_id = %envelope.unit_id,
                            error = %e,
                            "queued update was not applied"
                        );
                    }
                }
            }
        }
        debug!(session_id = %session_id, "session mailbox stopped");
    }

    async fn merge_now(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        update: &EntryUpdate,
    ) -> Result<bool, AttuneError> {
        let record = self
            .inner
            .store
            .merge_entry(session_id, unit_id, update)
            .await?;
        let answered = record.entry(unit_id).is_some_and(|e| e.answered);
        debug!(
            session_id = %session_id,
            unit_id = %unit_id,
            modality = ?update.modality(),
            answered,
            "entry merged"
        );
        self.publish(&record);

        let complete = record.is_complete();
        if complete && let Err(e) = self.finalize_record(&record).await {
            warn!(session_id = %session_id, error = %e, "finalization failed");
        }
        Ok(complete)
    }

    async fn finalize_record(&self, record: &SessionRecord) -> Result<ScoreSummary, AttuneError> {
        if let Some(summary) = &record.summary {
            return Ok(summary.clone());
        }

        let session_id = &record.session_id;
        let cell = self
            .inner
            .sessions
            .get(session_id)
            .map(|h| h.finalized.clone())
            .ok_or_else(|| AttuneError::InvalidSession(session_id.to_string()))?;

        let summary = cell
            .get_or_try_init(|| async {
                let current = self.session(session_id).await?;
                if let Some(summary) = current.summary {
                    return Ok(summary);
                }
                let computed = self.inner.finalizer.finalize(&current).await?;
                let stored = self
                    .inner
                    .store
                    .set_summary_once(session_id, computed)
                    .await?;
                recording::record_session_finalized();
                info!(
                    session_id = %session_id,
                    score = stored.score,
                    max_score = stored.max_score,
                    level = %stored.level,
                    "session finalized"
                );
                Ok::<_, AttuneError>(stored)
            })
            .await?
            .clone();

        if let Some(handle) = self.inner.sessions.get(session_id) {
            handle.progress.send_modify(|p| {
                p.complete = true;
                p.summary = Some(summary.clone());
            });
        }
        Ok(summary)
    }

    fn publish(&self, record: &SessionRecord) {
        if let Some(handle) = self.inner.sessions.get(&record.session_id) {
            let answered = record.answered_count();
            let complete = record.is_complete();
            handle.progress.send_modify(|p| {
                p.answered = answered;
                p.total = record.units.len();
                p.complete = complete;
                if record.summary.is_some() {
                    p.summary = record.summary.clone();
                }
            });
        }
    }
}

fn target_unit<'a>(record: &'a SessionRecord, unit_id: &UnitId) -> Result<&'a UnitSpec, AttuneError> {
    record.unit(unit_id).ok_or_else(|| AttuneError::InvalidUnit {
        session_id: record.session_id.to_string(),
        unit_id: unit_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use attune_core::types::Modality;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tracing_test::traced_test;

    #[derive(Default)]
    struct CountingFinalizer {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Finalizer for CountingFinalizer {
        async fn finalize(&self, record: &SessionRecord) -> Result<ScoreSummary, AttuneError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ScoreSummary {
                score: n,
                max_score: record.units.len() as u32,
                level: "low".into(),
                summary: format!("call {n}"),
                finalized_at: Utc::now(),
            })
        }
    }

    fn aggregator() -> (SessionAggregator, Arc<CountingFinalizer>) {
        let finalizer = Arc::new(CountingFinalizer::default());
        let aggregator = SessionAggregator::new(
            Arc::new(InMemorySessionStore::new(16)),
            finalizer.clone(),
        );
        (aggregator, finalizer)
    }

    #[tokio::test]
    #[traced_test]
    async fn last_answer_finalizes_once() {
        let (aggregator, finalizer) = aggregator();
        let id = aggregator
            .open_session(UserId::from("u1"), vec![UnitSpec::likert("q1", "Tired?")])
            .await
            .unwrap();

        assert!(aggregator.record_text(&id, &UnitId::from("q1"), "often").await.unwrap());
        let first = aggregator.finalize(&id).await.unwrap();
        let second = aggregator.finalize(&id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(finalizer.calls.load(Ordering::SeqCst), 1);
        assert!(logs_contain("session finalized"));
    }

    #[tokio::test]
    async fn finalize_before_completion_is_rejected() {
        let (aggregator, finalizer) = aggregator();
        let id = aggregator
            .open_session(UserId::from("u1"), vec![UnitSpec::likert("q1", "Tired?")])
            .await
            .unwrap();
        assert!(matches!(
            aggregator.finalize(&id).await,
            Err(AttuneError::SessionIncomplete(_))
        ));
        assert!(!aggregator.check_completion(&id).await.unwrap());
        assert_eq!(finalizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_likert_answer_is_rejected_without_mutation() {
        let (aggregator, _) = aggregator();
        let id = aggregator
            .open_session(UserId::from("u1"), vec![UnitSpec::likert("q1", "Tired?")])
            .await
            .unwrap();
        let err = aggregator
            .record_text(&id, &UnitId::from("q1"), "very")
            .await
            .unwrap_err();
        assert!(matches!(err, AttuneError::Validation(_)));
        assert!(aggregator.session(&id).await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_and_unit_are_rejected() {
        let (aggregator, _) = aggregator();
        let id = aggregator
            .open_session(UserId::from("u1"), vec![UnitSpec::open_text("q1", "Hi")])
            .await
            .unwrap();
        assert!(matches!(
            aggregator
                .record_text(&SessionId::from("missing"), &UnitId::from("q1"), "x")
                .await,
            Err(AttuneError::InvalidSession(_))
        ));
        assert!(matches!(
            aggregator
                .post(
                    &id,
                    &UnitId::from("q7"),
                    EntryUpdate::Failed {
                        modality: Modality::Audio,
                        message: "x".into()
                    }
                )
                .await,
            Err(AttuneError::InvalidUnit { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_unit_ids_are_rejected() {
        let (aggregator, _) = aggregator();
        let result = aggregator
            .open_session(
                UserId::from("u1"),
                vec![UnitSpec::likert("q1", "a"), UnitSpec::likert("q1", "b")],
            )
            .await;
        assert!(matches!(result, Err(AttuneError::Validation(_))));
    }

    #[tokio::test]
    async fn closed_session_is_evicted() {
        let (aggregator, _) = aggregator();
        let id = aggregator
            .open_session(UserId::from("u1"), vec![UnitSpec::open_text("q1", "Hi")])
            .await
            .unwrap();
        aggregator.close_session(&id).await.unwrap();
        assert_eq!(aggregator.active_sessions(), 0);
        assert!(matches!(
            aggregator.session(&id).await,
            Err(AttuneError::InvalidSession(_))
        ));
    }
}
