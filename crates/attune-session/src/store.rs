// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store abstraction and its in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;

use attune_core::error::AttuneError;
use attune_core::types::{SessionId, UnitId};

use crate::merge::{merge, EntryUpdate};
use crate::record::{ScoreSummary, SessionRecord};

/// Storage for session records.
///
/// `merge_entry` must apply one update atomically with respect to other
/// updates of the same session. `set_summary_once` must never replace a
/// summary that is already stored.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new record. Fails when the id exists or the store is full.
    async fn put(&self, record: SessionRecord) -> Result<(), AttuneError>;

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AttuneError>;

    /// Merges `update` into the unit's entry and returns the updated record.
    async fn merge_entry(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        update: &EntryUpdate,
    ) -> Result<SessionRecord, AttuneError>;

    /// Stores `summary` and marks the session completed unless a summary is
    /// already present. Returns whichever summary is stored afterwards.
    async fn set_summary_once(
        &self,
        session_id: &SessionId,
        summary: ScoreSummary,
    ) -> Result<ScoreSummary, AttuneError>;

    async fn remove(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AttuneError>;

    async fn len(&self) -> usize;
}

/// Process-local store backed by a sharded concurrent map.
pub struct InMemorySessionStore {
    records: DashMap<SessionId, SessionRecord>,
    capacity: usize,
}

impl InMemorySessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: DashMap::new(),
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, record: SessionRecord) -> Result<(), AttuneError> {
        if self.records.contains_key(&record.session_id) {
            return Err(AttuneError::Validation(format!(
                "session {} already exists",
                record.session_id
            )));
        }
        if self.records.len() >= self.capacity {
            return Err(AttuneError::Validation(format!(
                "session store is full ({} sessions)",
                self.capacity
            )));
        }
        self.records.insert(record.session_id.clone(), record);
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AttuneError> {
        Ok(self.records.get(session_id).map(|r| r.clone()))
    }

    async fn merge_entry(
        &self,
        session_id: &SessionId,
        unit_id: &UnitId,
        update: &EntryUpdate,
    ) -> Result<SessionRecord, AttuneError> {
        let mut record = self
            .records
            .get_mut(session_id)
            .ok_or_else(|| AttuneError::InvalidSession(session_id.to_string()))?;

        let kind = record
            .unit(unit_id)
            .map(|u| u.kind.clone())
            .ok_or_else(|| AttuneError::InvalidUnit {
                session_id: session_id.to_string(),
                unit_id: unit_id.to_string(),
            })?;

        let old = record.entries.get(unit_id).cloned().unwrap_or_default();
        let merged = merge(&old, update, &kind);
        record.entries.insert(unit_id.clone(), merged);
        Ok(record.clone())
    }

    async fn set_summary_once(
        &self,
        session_id: &SessionId,
        summary: ScoreSummary,
    ) -> Result<ScoreSummary, AttuneError> {
        let mut record = self
            .records
            .get_mut(session_id)
            .ok_or_else(|| AttuneError::InvalidSession(session_id.to_string()))?;
        record.completed = true;
        Ok(record.summary.get_or_insert(summary).clone())
    }

    async fn remove(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AttuneError> {
        Ok(self.records.remove(session_id).map(|(_, r)| r))
    }

    async fn len(&self) -> usize {
        self.records.len()
    }
}
