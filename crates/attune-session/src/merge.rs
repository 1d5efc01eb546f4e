// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure merge of one update into a response entry.
//!
//! A direct text response and an asynchronous analysis outcome may arrive in
//! either order; applying them in either order yields the same entry.

use attune_core::types::Modality;
use serde::{Deserialize, Serialize};

use crate::record::{ResponseEntry, UnitKind};

/// One change to a unit's response entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryUpdate {
    /// The user's direct response.
    Text(String),
    /// A completed analysis, serialized.
    Insight { modality: Modality, result: String },
    /// An analysis that failed, timed out or reported an unknown state.
    Failed { modality: Modality, message: String },
}

impl EntryUpdate {
    pub fn modality(&self) -> Option<Modality> {
        match self {
            EntryUpdate::Text(_) => None,
            EntryUpdate::Insight { modality, .. } | EntryUpdate::Failed { modality, .. } => {
                Some(*modality)
            }
        }
    }
}

/// Applies `update` to `old` for a unit of the given kind.
///
/// User text always wins over substituted error text. Insights for the same
/// modality are last-writer-wins. `answered` never goes back to false.
pub fn merge(old: &ResponseEntry, update: &EntryUpdate, kind: &UnitKind) -> ResponseEntry {
    let mut entry = old.clone();
    match update {
        EntryUpdate::Text(text) => {
            entry.text_response = Some(text.clone());
            entry.text_is_error = false;
        }
        EntryUpdate::Insight { modality, result } => {
            entry.multimodal_insights.insert(*modality, result.clone());
        }
        EntryUpdate::Failed { modality, message } => {
            entry.analysis_errors.insert(*modality, message.clone());
            if entry.text_response.is_none() {
                entry.text_response = Some(error_text(*modality, message));
                entry.text_is_error = true;
            }
        }
    }
    entry.answered = old.answered || is_satisfied(&entry, kind);
    entry
}

fn error_text(modality: Modality, message: &str) -> String {
    format!("[{modality} analysis failed: {message}]")
}

/// Error text answers a unit as well as user text does, so a failed
/// analysis never holds a session open.
fn is_satisfied(entry: &ResponseEntry, kind: &UnitKind) -> bool {
    match kind {
        UnitKind::Likert | UnitKind::OpenText => entry.text_response.is_some(),
        UnitKind::Multimodal { required } if required.is_empty() => {
            entry.text_response.is_some()
        }
        UnitKind::Multimodal { required } => required.iter().all(|m| entry.has_outcome(*m)),
    }
}
