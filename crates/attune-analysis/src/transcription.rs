// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech-to-text through a job-based transcription provider.
//!
//! The transcript feeds the text analyzer; it is not an analysis result itself.

use std::sync::Arc;

use attune_config::AnalysisConfig;
use attune_core::error::AttuneError;
use attune_core::types::ResourceLocator;
use attune_core::SpeechToTextProvider;
use attune_jobs::{JobPoller, JobPolicy};
use futures::future::BoxFuture;
use futures::FutureExt;

pub type PendingTranscript = BoxFuture<'static, Result<String, AttuneError>>;

pub struct SpeechToTextAdapter {
    provider: Arc<SpeechToTextProvider>,
    poller: JobPoller,
    policy: JobPolicy,
    allowed_schemes: Vec<String>,
}

impl SpeechToTextAdapter {
    pub fn new(
        provider: Arc<SpeechToTextProvider>,
        poller: JobPoller,
        policy: JobPolicy,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            provider,
            poller,
            policy,
            allowed_schemes: config.allowed_schemes.clone(),
        }
    }

    pub async fn transcribe(
        &self,
        locator: &str,
        logical_key: Option<String>,
    ) -> Result<PendingTranscript, AttuneError> {
        let locator = ResourceLocator::parse(locator, &self.allowed_schemes)?;
        let handle = self
            .poller
            .submit(self.provider.clone(), &locator, self.policy, logical_key)
            .await?;

        Ok(async move { Ok(handle.await?.trim().to_string()) }.boxed())
    }
}
