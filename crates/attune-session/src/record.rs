// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session records, units of work and their response entries.

use std::collections::BTreeMap;

use attune_core::types::{Modality, SessionId, UnitId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a unit of work becomes answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitKind {
    /// Answered by a direct 1-5 (or never..always) response.
    Likert,
    /// Answered by any direct text response.
    OpenText,
    /// Answered once every required modality has a result or an error.
    Multimodal { required: Vec<Modality> },
}

/// One question or turn the session expects a response to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub id: UnitId,
    pub prompt: String,
    pub kind: UnitKind,
}

impl UnitSpec {
    pub fn likert(id: impl Into<UnitId>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind: UnitKind::Likert,
        }
    }

    pub fn open_text(id: impl Into<UnitId>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind: UnitKind::OpenText,
        }
    }

    pub fn multimodal(
        id: impl Into<UnitId>,
        prompt: impl Into<String>,
        required: impl Into<Vec<Modality>>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind: UnitKind::Multimodal {
                required: required.into(),
            },
        }
    }
}

/// Everything received for one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntry {
    /// The user's direct response, or an analysis error standing in for it.
    pub text_response: Option<String>,
    /// True while `text_response` holds an error rather than user input.
    pub text_is_error: bool,
    /// Serialized analysis results keyed by modality.
    pub multimodal_insights: BTreeMap<Modality, String>,
    /// Failure messages of analyses that did not produce a result.
    pub analysis_errors: BTreeMap<Modality, String>,
    pub answered: bool,
}

impl ResponseEntry {
    /// Whether a result or an error has arrived for `modality`.
    pub fn has_outcome(&self, modality: Modality) -> bool {
        self.multimodal_insights.contains_key(&modality)
            || self.analysis_errors.contains_key(&modality)
    }

    /// The user's own response, ignoring substituted error text.
    pub fn user_text(&self) -> Option<&str> {
        if self.text_is_error {
            None
        } else {
            self.text_response.as_deref()
        }
    }
}

/// Aggregate score and narrative produced once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: u32,
    pub max_score: u32,
    pub level: String,
    pub summary: String,
    pub finalized_at: DateTime<Utc>,
}

/// Aggregate root for one session or assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub units: Vec<UnitSpec>,
    pub entries: BTreeMap<UnitId, ResponseEntry>,
    pub completed: bool,
    pub summary: Option<ScoreSummary>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(session_id: SessionId, user_id: UserId, units: Vec<UnitSpec>) -> Self {
        Self {
            session_id,
            user_id,
            units,
            entries: BTreeMap::new(),
            completed: false,
            summary: None,
            created_at: Utc::now(),
        }
    }

    pub fn unit(&self, unit_id: &UnitId) -> Option<&UnitSpec> {
        self.units.iter().find(|u| &u.id == unit_id)
    }

    pub fn entry(&self, unit_id: &UnitId) -> Option<&ResponseEntry> {
        self.entries.get(unit_id)
    }

    pub fn answered_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| self.entries.get(&u.id).is_some_and(|e| e.answered))
            .count()
    }

    /// Every expected unit is answered. Always recomputed from the entries.
    pub fn is_complete(&self) -> bool {
        !self.units.is_empty() && self.answered_count() == self.units.len()
    }
}

/// Numeric value of a Likert answer: `1..=5` or never/rarely/sometimes/often/always.
pub fn likert_value(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return (1..=5).contains(&n).then_some(n);
    }
    match raw.to_ascii_lowercase().as_str() {
        "never" => Some(1),
        "rarely" => Some(2),
        "sometimes" => Some(3),
        "often" => Some(4),
        "always" => Some(5),
        _ => None,
    }
}
