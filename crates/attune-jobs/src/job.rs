// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job bookkeeping: per-provider policy, tracked job state, and the handle
//! a submitter awaits for the terminal outcome.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use attune_config::JobPolicyConfig;
use attune_core::AttuneError;
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

/// Poll cadence and attempt bound applied to one submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl JobPolicy {
    pub fn new(poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            poll_interval,
            // Zero attempts would time out without ever asking the provider.
            max_attempts: max_attempts.max(1),
        }
    }
}

impl From<&JobPolicyConfig> for JobPolicy {
    fn from(config: &JobPolicyConfig) -> Self {
        JobPolicy::new(config.poll_interval(), config.max_attempts)
    }
}

/// Lifecycle of a tracked job as the poller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    InProgress,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobStatus {
    /// Terminal status matching a polling outcome. Unexpected states and
    /// shutdown count as failures.
    pub fn for_outcome<P>(outcome: &Result<P, AttuneError>) -> Self {
        match outcome {
            Ok(_) => JobStatus::Succeeded,
            Err(AttuneError::Timeout { .. }) => JobStatus::TimedOut,
            Err(_) => JobStatus::Failed,
        }
    }
}

/// Snapshot of an outstanding job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    pub provider: String,
    pub job_id: String,
    /// Caller-supplied key (typically session, unit and modality) used by the
    /// resubmission policy.
    pub logical_key: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub status: JobStatus,
}

/// Resolves to the terminal outcome of a submitted job.
///
/// Dropping the handle does not cancel the job; polling continues and the
/// outcome is discarded.
#[derive(Debug)]
pub struct JobHandle<T> {
    job_id: String,
    rx: oneshot::Receiver<Result<T, AttuneError>>,
}

impl<T> JobHandle<T> {
    pub(crate) fn new(job_id: String, rx: oneshot::Receiver<Result<T, AttuneError>>) -> Self {
        Self { job_id, rx }
    }

    /// The provider-assigned job id.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl<T> Future for JobHandle<T> {
    type Output = Result<T, AttuneError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(AttuneError::Internal(format!(
                "polling task for job {} ended without an outcome",
                self.job_id
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}
