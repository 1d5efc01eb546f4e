// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Attune session engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Attune configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttuneConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Job polling settings for the external analysis providers.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Analysis adapter settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Context retrieval index settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Session store settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of this engine instance.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "attune".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// What to do when analysis is requested for a unit and modality that
/// already has a job in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResubmissionPolicy {
    /// Submit anyway; whichever job resolves last wins.
    #[default]
    Allow,
    /// Reject the second submission with a conflict error.
    Reject,
}

/// Poll cadence and attempt bound for one job-based provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobPolicyConfig {
    /// Delay between consecutive status checks, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of status checks before the job times out.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl JobPolicyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for JobPolicyConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    60
}

/// Job polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    /// Maximum number of status checks in flight at once across all jobs.
    #[serde(default = "default_scheduler_workers")]
    pub scheduler_workers: usize,

    /// Handling of a second submission for a unit that is still being analyzed.
    #[serde(default)]
    pub resubmission: ResubmissionPolicy,

    /// Facial expression provider.
    #[serde(default)]
    pub video: JobPolicyConfig,

    /// Voice prosody provider.
    #[serde(default)]
    pub audio: JobPolicyConfig,

    /// Speech-to-text provider. Transcription of long recordings runs slower,
    /// so it gets a larger attempt bound.
    #[serde(default = "default_transcription_policy")]
    pub transcription: JobPolicyConfig,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            scheduler_workers: default_scheduler_workers(),
            resubmission: ResubmissionPolicy::default(),
            video: JobPolicyConfig::default(),
            audio: JobPolicyConfig::default(),
            transcription: default_transcription_policy(),
        }
    }
}

fn default_scheduler_workers() -> usize {
    4
}

fn default_transcription_policy() -> JobPolicyConfig {
    JobPolicyConfig {
        poll_interval_ms: default_poll_interval_ms(),
        max_attempts: 120,
    }
}

/// Analysis adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Number of highest-scoring emotions kept per utterance or face.
    #[serde(default = "default_top_emotions")]
    pub top_emotions: usize,

    /// Resource locator prefixes accepted by the audio, video and
    /// speech-to-text adapters.
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,

    /// Text longer than this is truncated before it is sent to the model.
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_emotions: default_top_emotions(),
            allowed_schemes: default_allowed_schemes(),
            max_text_chars: default_max_text_chars(),
        }
    }
}

fn default_top_emotions() -> usize {
    3
}

fn default_allowed_schemes() -> Vec<String> {
    ["s3://", "gs://", "https://", "file://"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_text_chars() -> usize {
    4_000
}

/// Context retrieval index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a match to be returned (0.0-1.0).
    /// Matches below this threshold are dropped, not down-ranked.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Maximum number of matches returned per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Interventions retrieved per detected distortion label.
    #[serde(default = "default_interventions_per_label")]
    pub interventions_per_label: usize,

    /// Allow removal of a session's or user's segments from the index.
    #[serde(default = "default_allow_deletion")]
    pub allow_deletion: bool,

    /// Vector width produced by the built-in hashing embedder.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_results: default_max_results(),
            interventions_per_label: default_interventions_per_label(),
            allow_deletion: default_allow_deletion(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.35
}

fn default_max_results() -> usize {
    5
}

fn default_interventions_per_label() -> usize {
    2
}

fn default_allow_deletion() -> bool {
    true
}

fn default_embedding_dimensions() -> usize {
    256
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Maximum number of live sessions held in memory.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Embed user messages and analyses into the retrieval index as they arrive.
    #[serde(default = "default_index_messages")]
    pub index_messages: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            index_messages: default_index_messages(),
        }
    }
}

fn default_max_sessions() -> usize {
    1_000
}

fn default_index_messages() -> bool {
    true
}
