// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice prosody analysis through a job-based audio provider.

use std::sync::Arc;

use attune_config::AnalysisConfig;
use attune_core::analysis::{AnalysisResult, AudioAnalysis};
use attune_core::error::AttuneError;
use attune_core::types::ResourceLocator;
use attune_core::AudioProsodyProvider;
use attune_jobs::{JobPoller, JobPolicy};
use futures::FutureExt;
use tracing::debug;

use crate::reduce::{reduce_utterances, transcript_of};
use crate::PendingAnalysis;

pub struct AudioProsodyAdapter {
    provider: Arc<AudioProsodyProvider>,
    poller: JobPoller,
    policy: JobPolicy,
    config: AnalysisConfig,
}

impl AudioProsodyAdapter {
    pub fn new(
        provider: Arc<AudioProsodyProvider>,
        poller: JobPoller,
        policy: JobPolicy,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            provider,
            poller,
            policy,
            config,
        }
    }

    /// Validates `locator`, submits the job and returns its pending result.
    pub async fn analyze(
        &self,
        locator: &str,
        logical_key: Option<String>,
    ) -> Result<PendingAnalysis, AttuneError> {
        let locator = ResourceLocator::parse(locator, &self.config.allowed_schemes)?;
        let handle = self
            .poller
            .submit(self.provider.clone(), &locator, self.policy, logical_key)
            .await?;

        let top = self.config.top_emotions;
        debug!(job_id = %handle.job_id(), "audio analysis pending");
        Ok(async move {
            let utterances = reduce_utterances(handle.await?, top);
            Ok(AnalysisResult::Audio(AudioAnalysis {
                transcript: transcript_of(&utterances),
                utterances,
            }))
        }
        .boxed())
    }
}
