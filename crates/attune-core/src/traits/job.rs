// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job-based analysis provider trait.
//!
//! Video emotion, audio prosody and speech-to-text vendors all follow the
//! same submit-then-poll shape and differ only in their terminal payload.

use async_trait::async_trait;

use crate::analysis::{RawFrame, RawUtterance};
use crate::error::AttuneError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{JobStatusReport, ResourceLocator};

/// Adapter for an external provider that analyzes a resource asynchronously.
#[async_trait]
pub trait JobProvider: PluginAdapter {
    /// The provider-specific payload returned once a job succeeds.
    type Payload: Send + 'static;

    /// Starts a job for the resource and returns the provider-assigned job id.
    async fn start_job(&self, locator: &ResourceLocator) -> Result<String, AttuneError>;

    /// Reports the current status of a previously started job.
    async fn job_status(&self, job_id: &str)
        -> Result<JobStatusReport<Self::Payload>, AttuneError>;
}

/// Facial expression provider: per-timestamp faces with emotion vectors.
pub type VideoEmotionProvider = dyn JobProvider<Payload = Vec<RawFrame>>;

/// Voice prosody provider: per-utterance emotion vectors plus utterance text.
pub type AudioProsodyProvider = dyn JobProvider<Payload = Vec<RawUtterance>>;

/// Speech-to-text provider: a plain transcript.
pub type SpeechToTextProvider = dyn JobProvider<Payload = String>;
