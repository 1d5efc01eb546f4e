// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Attune session engine.

use thiserror::Error;

/// The primary error type used across all Attune adapters, the job poller,
/// the session aggregator and the orchestrator.
#[derive(Debug, Error)]
pub enum AttuneError {
    /// Malformed input caught before any external work is started
    /// (resource locator, model response, Likert answer, empty content).
    #[error("validation error: {0}")]
    Validation(String),

    /// An external analysis job reached its FAILED terminal state.
    #[error("{provider} job {job_id} failed: {message}")]
    ProviderFailure {
        provider: String,
        job_id: String,
        message: String,
    },

    /// An external analysis job did not reach a terminal state within its attempt bound.
    #[error("{provider} job {job_id} timed out after {attempts} polls")]
    Timeout {
        provider: String,
        job_id: String,
        attempts: u32,
    },

    /// A provider reported a status string the poller does not recognize.
    #[error("{provider} job {job_id} reported unexpected status `{status}`")]
    UnexpectedState {
        provider: String,
        job_id: String,
        status: String,
    },

    /// The referenced session does not exist.
    #[error("unknown session: {0}")]
    InvalidSession(String),

    /// The referenced unit does not belong to the session.
    #[error("unknown unit `{unit_id}` in session {session_id}")]
    InvalidUnit { session_id: String, unit_id: String },

    /// A job for the same logical key is already outstanding.
    #[error("analysis already in flight for {key}")]
    Conflict { key: String },

    /// Finalization was requested before every unit was answered.
    #[error("session {0} is not complete")]
    SessionIncomplete(String),

    /// Transport-level failure talking to a collaborator (model, embedder, index).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors surfaced at runtime.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AttuneError {
    /// Whether this failure is absorbed into the session as in-band error content
    /// instead of being propagated to the caller.
    pub fn is_absorbable(&self) -> bool {
        matches!(
            self,
            AttuneError::ProviderFailure { .. }
                | AttuneError::Timeout { .. }
                | AttuneError::UnexpectedState { .. }
        )
    }

    /// Shorthand for a [`AttuneError::Provider`] without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        AttuneError::Provider {
            message: message.into(),
            source: None,
        }
    }
}
