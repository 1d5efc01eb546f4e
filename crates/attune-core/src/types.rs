// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Attune engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AttuneError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a therapeutic session or assessment.
    SessionId
);
string_id!(
    /// Identifier of the user owning a session.
    UserId
);
string_id!(
    /// Identifier of one question or turn within a session.
    UnitId
);

impl SessionId {
    /// Generates a fresh random session identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Identifies the kind of external collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    VideoEmotion,
    AudioProsody,
    SpeechToText,
    LanguageModel,
    Embedding,
    SimilarityIndex,
}

/// One channel of input analyzed independently.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Modality {
    Text,
    Audio,
    Video,
}

// --- Resource locators ---

/// An opaque pointer to where a binary or text payload lives.
///
/// Only the scheme prefix is interpreted; everything after it is passed
/// through to the provider untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceLocator(String);

impl ResourceLocator {
    /// Validates `raw` against the list of accepted scheme prefixes
    /// (e.g. `s3://`). Fails with [`AttuneError::Validation`] when the locator
    /// is empty, contains whitespace, uses an unknown scheme, or has nothing
    /// after the scheme.
    pub fn parse(raw: &str, allowed_schemes: &[String]) -> Result<Self, AttuneError> {
        if raw.is_empty() {
            return Err(AttuneError::Validation(
                "resource locator must not be empty".to_string(),
            ));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AttuneError::Validation(format!(
                "resource locator `{raw}` contains whitespace or control characters"
            )));
        }

        let scheme = allowed_schemes
            .iter()
            .find(|scheme| {
                raw.len() >= scheme.len()
                    && raw.is_char_boundary(scheme.len())
                    && raw[..scheme.len()].eq_ignore_ascii_case(scheme)
            })
            .ok_or_else(|| {
                AttuneError::Validation(format!(
                    "resource locator `{raw}` does not use a recognized scheme ({})",
                    allowed_schemes.join(", ")
                ))
            })?;

        let rest = &raw[scheme.len()..];
        if rest.is_empty() || (rest.starts_with('/') && rest.trim_matches('/').is_empty()) {
            return Err(AttuneError::Validation(format!(
                "resource locator `{raw}` has no resource after the scheme"
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scheme portion, without the `://` separator.
    pub fn scheme(&self) -> &str {
        self.0.split_once("://").map(|(s, _)| s).unwrap_or("")
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Job status types ---

/// Lifecycle states an external provider can report for a job.
///
/// Providers use differing vocabularies; parsing is case-insensitive and
/// accepts the common synonyms. Anything else is an unexpected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum RemoteJobState {
    #[strum(serialize = "SUBMITTED", serialize = "QUEUED", serialize = "PENDING")]
    Submitted,
    #[strum(serialize = "IN_PROGRESS", serialize = "RUNNING", serialize = "PROCESSING")]
    InProgress,
    #[strum(serialize = "SUCCEEDED", serialize = "COMPLETED", serialize = "COMPLETE")]
    Succeeded,
    #[strum(serialize = "FAILED", serialize = "FAILURE", serialize = "ERROR")]
    Failed,
}

impl RemoteJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteJobState::Submitted => "SUBMITTED",
            RemoteJobState::InProgress => "IN_PROGRESS",
            RemoteJobState::Succeeded => "SUCCEEDED",
            RemoteJobState::Failed => "FAILED",
        }
    }
}

/// Raw answer to a single status check.
#[derive(Debug, Clone)]
pub struct JobStatusReport<T> {
    /// Provider status string, parsed by the poller.
    pub status: String,
    /// Terminal payload, present once the job succeeded.
    pub result: Option<T>,
    /// Provider-supplied failure reason, if any.
    pub error: Option<String>,
}

impl<T> JobStatusReport<T> {
    pub fn in_progress() -> Self {
        Self {
            status: RemoteJobState::InProgress.as_str().to_string(),
            result: None,
            error: None,
        }
    }

    pub fn succeeded(result: T) -> Self {
        Self {
            status: RemoteJobState::Succeeded.as_str().to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: RemoteJobState::Failed.as_str().to_string(),
            result: None,
            error: Some(message.into()),
        }
    }

    /// A report with an arbitrary status string (used for unrecognized states).
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            result: None,
            error: None,
        }
    }
}

// --- Embedding types ---

/// Input for embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

// --- Similarity index types ---

/// What kind of content an embedded segment holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentType {
    /// A message written or spoken by the user.
    Message,
    /// A serialized analysis of a message or media unit.
    Analysis,
    /// A reply generated for the user.
    Response,
    /// A CBT intervention from the catalog.
    Intervention,
    /// A finalized session summary.
    Summary,
}

/// Metadata stored alongside every embedded segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub session_id: Option<SessionId>,
    pub user_id: Option<UserId>,
    pub content_type: ContentType,
    pub timestamp: DateTime<Utc>,
    /// Free-form key such as a cognitive-distortion label for interventions.
    pub label: Option<String>,
}

impl SegmentMetadata {
    /// Metadata for content produced inside a user's session.
    pub fn for_session(session_id: SessionId, user_id: UserId, content_type: ContentType) -> Self {
        Self {
            session_id: Some(session_id),
            user_id: Some(user_id),
            content_type,
            timestamp: Utc::now(),
            label: None,
        }
    }

    /// Metadata for catalog content that belongs to no session.
    pub fn catalog(content_type: ContentType, label: impl Into<String>) -> Self {
        Self {
            session_id: None,
            user_id: None,
            content_type,
            timestamp: Utc::now(),
            label: Some(label.into()),
        }
    }
}

/// Filters applied to similarity search and deletion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentFilter {
    pub user_id: Option<UserId>,
    pub session_id: Option<SessionId>,
    pub exclude_session_id: Option<SessionId>,
    /// Empty means every content type.
    pub content_types: Vec<ContentType>,
    pub label: Option<String>,
}

impl SegmentFilter {
    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn excluding_session(mut self, session_id: SessionId) -> Self {
        self.exclude_session_id = Some(session_id);
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_types.push(content_type);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns true when `metadata` satisfies every constraint of this filter.
    pub fn matches(&self, metadata: &SegmentMetadata) -> bool {
        if let Some(ref user) = self.user_id {
            if metadata.user_id.as_ref() != Some(user) {
                return false;
            }
        }
        if let Some(ref session) = self.session_id {
            if metadata.session_id.as_ref() != Some(session) {
                return false;
            }
        }
        if let Some(ref excluded) = self.exclude_session_id {
            if metadata.session_id.as_ref() == Some(excluded) {
                return false;
            }
        }
        if !self.content_types.is_empty() && !self.content_types.contains(&metadata.content_type) {
            return false;
        }
        if let Some(ref label) = self.label {
            if metadata.label.as_deref() != Some(label.as_str()) {
                return false;
            }
        }
        true
    }
}

/// A segment returned from similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMatch {
    pub id: String,
    pub text: String,
    pub metadata: SegmentMetadata,
    /// Cosine similarity with the query vector.
    pub score: f32,
}
