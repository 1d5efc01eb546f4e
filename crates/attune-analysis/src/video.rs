// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Facial expression analysis through a job-based video provider.

use std::sync::Arc;

use attune_config::AnalysisConfig;
use attune_core::analysis::{AnalysisResult, VideoAnalysis};
use attune_core::error::AttuneError;
use attune_core::types::ResourceLocator;
use attune_core::VideoEmotionProvider;
use attune_jobs::{JobPoller, JobPolicy};
use futures::FutureExt;
use tracing::debug;

use crate::reduce::reduce_frames;
use crate::PendingAnalysis;

pub struct VideoEmotionAdapter {
    provider: Arc<VideoEmotionProvider>,
    poller: JobPoller,
    policy: JobPolicy,
    config: AnalysisConfig,
}

impl VideoEmotionAdapter {
    pub fn new(
        provider: Arc<VideoEmotionProvider>,
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
    ///
    /// A malformed locator fails here and no job is started.
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
        debug!(job_id = %handle.job_id(), "video analysis pending");
        Ok(async move {
            let frames = handle.await?;
            Ok(AnalysisResult::Video(VideoAnalysis {
                frames: reduce_frames(frames, top),
            }))
        }
        .boxed())
    }
}
