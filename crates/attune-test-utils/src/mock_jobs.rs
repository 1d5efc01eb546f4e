// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted job provider for deterministic poller tests.
//!
//! `ScriptedJobProvider` answers status checks from a FIFO script. When the
//! script runs out it keeps reporting `IN_PROGRESS`, which makes timeouts
//! easy to provoke.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use attune_core::error::AttuneError;
use attune_core::traits::{JobProvider, PluginAdapter};
use attune_core::types::{AdapterType, JobStatusReport, ResourceLocator};

type Step<P> = Result<JobStatusReport<P>, AttuneError>;

pub struct ScriptedJobProvider<P> {
    name: String,
    adapter_type: AdapterType,
    script: Mutex<VecDeque<Step<P>>>,
    start_error: Option<String>,
    start_latency: Option<Duration>,
    status_latency: Option<Duration>,
    starts: AtomicU32,
    polls: AtomicU32,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    submitted: Mutex<Vec<String>>,
}

impl<P: Send + 'static> ScriptedJobProvider<P> {
    pub fn new(name: impl Into<String>, adapter_type: AdapterType) -> Self {
        Self {
            name: name.into(),
            adapter_type,
            script: Mutex::new(VecDeque::new()),
            start_error: None,
            start_latency: None,
            status_latency: None,
            starts: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Queue `n` `IN_PROGRESS` reports.
    pub fn then_in_progress(self, n: usize) -> Self {
        self.push_all((0..n).map(|_| Ok(JobStatusReport::in_progress())))
    }

    pub fn then_succeed(self, payload: P) -> Self {
        self.push_all([Ok(JobStatusReport::succeeded(payload))])
    }

    pub fn then_fail(self, message: &str) -> Self {
        self.push_all([Ok(JobStatusReport::failed(message))])
    }

    /// Queue a report carrying an arbitrary status string.
    pub fn then_status(self, status: &str) -> Self {
        self.push_all([Ok(JobStatusReport::with_status(status))])
    }

    /// Queue a transport error for one status check.
    pub fn then_transport_error(self, message: &str) -> Self {
        self.push_all([Err(AttuneError::provider(message))])
    }

    /// Make `start_job` fail with a provider error.
    pub fn failing_start(mut self, message: &str) -> Self {
        self.start_error = Some(message.to_string());
        self
    }

    /// Hold every `start_job` call for `latency` before answering.
    pub fn with_start_latency(mut self, latency: Duration) -> Self {
        self.start_latency = Some(latency);
        self
    }

    /// Hold every status check for `latency` before answering.
    pub fn with_status_latency(mut self, latency: Duration) -> Self {
        self.status_latency = Some(latency);
        self
    }

    fn push_all(mut self, steps: impl IntoIterator<Item = Step<P>>) -> Self {
        self.script.get_mut().extend(steps);
        self
    }

    /// Number of `start_job` calls.
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of `job_status` calls.
    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    /// Highest number of status checks observed running at once.
    pub fn peak_concurrent_polls(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Locators passed to `start_job`, in order.
    pub async fn submitted(&self) -> Vec<String> {
        self.submitted.lock().await.clone()
    }
}

#[async_trait]
impl<P: Send + 'static> PluginAdapter for ScriptedJobProvider<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapter_type(&self) -> AdapterType {
        self.adapter_type
    }
}

#[async_trait]
impl<P: Send + 'static> JobProvider for ScriptedJobProvider<P> {
    type Payload = P;

    async fn start_job(&self, locator: &ResourceLocator) -> Result<String, AttuneError> {
        if let Some(latency) = self.start_latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = &self.start_error {
            return Err(AttuneError::provider(message.clone()));
        }
        let n = self.starts.fetch_add(1, Ordering::SeqCst) + 1;
        self.submitted.lock().await.push(locator.as_str().to_string());
        Ok(format!("{}-job-{n}", self.name))
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatusReport<P>, AttuneError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.status_latency {
            tokio::time::sleep(latency).await;
        }
        let step = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(JobStatusReport::in_progress()));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> ResourceLocator {
        ResourceLocator::parse("s3://bucket/clip.mp4", &["s3://".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn script_plays_in_order_then_stays_in_progress() {
        let provider = ScriptedJobProvider::new("video", AdapterType::VideoEmotion)
            .then_fail("bad")
            .then_succeed(5u8);
        let id = provider.start_job(&locator()).await.unwrap();
        assert_eq!(id, "video-job-1");

        assert_eq!(provider.job_status(&id).await.unwrap().status, "FAILED");
        assert_eq!(provider.job_status(&id).await.unwrap().result, Some(5));
        assert_eq!(provider.job_status(&id).await.unwrap().status, "IN_PROGRESS");
        assert_eq!(provider.polls(), 3);
    }

    #[tokio::test]
    async fn failing_start_rejects_submission() {
        let provider =
            ScriptedJobProvider::<u8>::new("audio", AdapterType::AudioProsody).failing_start("down");
        assert!(provider.start_job(&locator()).await.is_err());
        assert_eq!(provider.starts(), 0);
    }
}
