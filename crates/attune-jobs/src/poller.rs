// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submit-then-poll driver shared by every job-based provider.
//!
//! Each submitted job gets its own lightweight task that sleeps between
//! status checks. The checks themselves run under a shared semaphore, so the
//! number of in-flight provider calls never exceeds the configured worker
//! count no matter how many jobs are outstanding.

use std::sync::Arc;

use attune_config::{PollingConfig, ResubmissionPolicy};
use attune_core::types::{JobStatusReport, RemoteJobState, ResourceLocator};
use attune_core::{recording, AttuneError, JobProvider};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{oneshot, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::job::{AnalysisJob, JobHandle, JobPolicy, JobStatus};

/// Drives outstanding analysis jobs to a terminal outcome.
///
/// Cheap to clone; clones share the worker pool and job table.
#[derive(Clone)]
pub struct JobPoller {
    permits: Arc<Semaphore>,
    /// Outstanding jobs keyed by `provider:job_id`.
    jobs: Arc<DashMap<String, AnalysisJob>>,
    /// Logical key -> job-table key of the most recent submission.
    in_flight: Arc<DashMap<String, String>>,
    resubmission: ResubmissionPolicy,
    cancel: CancellationToken,
}

impl JobPoller {
    pub fn new(config: &PollingConfig) -> Self {
        Self::with_workers(config.scheduler_workers, config.resubmission)
    }

    pub fn with_workers(workers: usize, resubmission: ResubmissionPolicy) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
            jobs: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            resubmission,
            cancel: CancellationToken::new(),
        }
    }

    /// Starts a job for `locator` and returns a handle to its terminal outcome.
    ///
    /// Fails synchronously when the provider rejects the submission, or with
    /// [`AttuneError::Conflict`] when `logical_key` already has a job in flight
    /// and resubmission is rejected. Every other failure arrives through the handle.
    pub async fn submit<P>(
        &self,
        provider: Arc<dyn JobProvider<Payload = P>>,
        locator: &ResourceLocator,
        policy: JobPolicy,
        logical_key: Option<String>,
    ) -> Result<JobHandle<P>, AttuneError>
    where
        P: Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(AttuneError::Internal("job poller is shut down".into()));
        }

        let provider_name = provider.name().to_string();

        let reservation = match &logical_key {
            Some(key) if self.resubmission == ResubmissionPolicy::Reject => {
                Some(self.reserve(key)?)
            }
            _ => None,
        };

        let started = {
            let _permit = self.acquire().await?;
            provider.start_job(locator).await
        };
        // Errors drop the reservation, which frees the key.
        let job_id = started?;

        let table_key = format!("{provider_name}:{job_id}");
        self.jobs.insert(
            table_key.clone(),
            AnalysisJob {
                provider: provider_name.clone(),
                job_id: job_id.clone(),
                logical_key: logical_key.clone(),
                submitted_at: Utc::now(),
                attempts: 0,
                max_attempts: policy.max_attempts,
                status: JobStatus::Submitted,
            },
        );
        if let Some(key) = &logical_key {
            self.in_flight.insert(key.clone(), table_key.clone());
        }
        if let Some(reservation) = reservation {
            reservation.commit();
        }
        recording::set_active_jobs(self.jobs.len());

        info!(
            provider = %provider_name,
            adapter = %provider.adapter_type(),
            job_id = %job_id,
            locator = %locator,
            max_attempts = policy.max_attempts,
            "analysis job submitted"
        );

        let (tx, rx) = oneshot::channel();
        let poller = self.clone();
        let task_job_id = job_id.clone();
        tokio::spawn(async move {
            let outcome = poller
                .poll_until_terminal(
                    provider.as_ref(),
                    &provider_name,
                    &task_job_id,
                    &table_key,
                    policy,
                )
                .await;
            poller.finish(&provider_name, &table_key, logical_key.as_deref(), &outcome);
            // The submitter may have dropped its handle.
            let _ = tx.send(outcome);
        });

        Ok(JobHandle::new(job_id, rx))
    }

    async fn poll_until_terminal<P>(
        &self,
        provider: &dyn JobProvider<Payload = P>,
        provider_name: &str,
        job_id: &str,
        table_key: &str,
        policy: JobPolicy,
    ) -> Result<P, AttuneError>
    where
        P: Send + 'static,
    {
        let mut attempts = 0u32;
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(AttuneError::Internal(format!(
                        "job poller shut down while {provider_name} job {job_id} was outstanding"
                    )));
                }
                _ = tokio::time::sleep(policy.poll_interval) => {}
            }

            let report = {
                let _permit = self.acquire().await?;
                provider.job_status(job_id).await
            };
            attempts += 1;

            match report {
                Ok(report) => {
                    if let Some(outcome) = interpret(provider_name, job_id, report) {
                        return outcome;
                    }
                    self.mark(table_key, attempts, JobStatus::InProgress);
                    debug!(provider = %provider_name, job_id = %job_id, attempts, "job still running");
                }
                // Transport errors are not terminal; the attempt still counts.
                Err(e) => {
                    self.mark(table_key, attempts, JobStatus::InProgress);
                    warn!(
                        provider = %provider_name,
                        job_id = %job_id,
                        attempts,
                        error = %e,
                        "status check failed"
                    );
                }
            }

            if attempts >= policy.max_attempts {
                return Err(AttuneError::Timeout {
                    provider: provider_name.to_string(),
                    job_id: job_id.to_string(),
                    attempts,
                });
            }
        }
    }

    /// Claims `key` until the job id is known.
    fn reserve(&self, key: &str) -> Result<Reservation, AttuneError> {
        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(_) => Err(AttuneError::Conflict {
                key: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(String::new());
                Ok(Reservation {
                    in_flight: Arc::clone(&self.in_flight),
                    key: Some(key.to_string()),
                })
            }
        }
    }

    async fn acquire(&self) -> Result<tokio::sync::SemaphorePermit<'_>, AttuneError> {
        self.permits
            .acquire()
            .await
            .map_err(|_| AttuneError::Internal("job poller worker pool closed".into()))
    }

    fn mark(&self, table_key: &str, attempts: u32, status: JobStatus) {
        if let Some(mut job) = self.jobs.get_mut(table_key) {
            job.attempts = attempts;
            job.status = status;
        }
    }

    /// Stops tracking a job. Runs exactly once per submitted job.
    fn finish<P>(
        &self,
        provider_name: &str,
        table_key: &str,
        logical_key: Option<&str>,
        outcome: &Result<P, AttuneError>,
    ) {
        let label = match outcome {
            Ok(_) => "succeeded",
            Err(AttuneError::ProviderFailure { .. }) => "failed",
            Err(AttuneError::Timeout { .. }) => "timeout",
            Err(AttuneError::UnexpectedState { .. }) => "unexpected",
            Err(_) => "aborted",
        };
        recording::record_job(provider_name, label);

        let finished = self.jobs.remove(table_key).map(|(_, mut job)| {
            job.status = JobStatus::for_outcome(outcome);
            job
        });
        if let Some(key) = logical_key {
            self.in_flight.remove_if(key, |_, v| v == table_key);
        }
        recording::set_active_jobs(self.jobs.len());

        let Some(job) = finished else {
            return;
        };
        match outcome {
            Ok(_) => info!(
                job = %table_key,
                status = ?job.status,
                attempts = job.attempts,
                "analysis job succeeded"
            ),
            Err(e) => warn!(
                job = %table_key,
                status = ?job.status,
                attempts = job.attempts,
                outcome = label,
                error = %e,
                "analysis job did not succeed"
            ),
        }
    }

    /// Snapshot of every job still being polled.
    pub fn active_jobs(&self) -> Vec<AnalysisJob> {
        self.jobs.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn active_count(&self) -> usize {
        self.jobs.len()
    }

    /// Whether a job submitted under `logical_key` is still outstanding.
    pub fn is_in_flight(&self, logical_key: &str) -> bool {
        self.in_flight.contains_key(logical_key)
    }

    /// Stops every polling task; their handles resolve with an internal error.
    pub fn shutdown(&self) {
        info!(outstanding = self.jobs.len(), "job poller shutting down");
        self.cancel.cancel();
    }
}

/// Placeholder entry for a logical key whose job has not started yet.
///
/// Dropped before [`Reservation::commit`], for example when the submitting
/// future is cancelled or the provider rejects the job, it frees the key.
struct Reservation {
    in_flight: Arc<DashMap<String, String>>,
    key: Option<String>,
}

impl Reservation {
    fn commit(mut self) {
        self.key = None;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.in_flight.remove_if(&key, |_, v| v.is_empty());
        }
    }
}

/// Maps a status report to a terminal outcome, or `None` while the job runs.
fn interpret<P>(
    provider: &str,
    job_id: &str,
    report: JobStatusReport<P>,
) -> Option<Result<P, AttuneError>> {
    let Ok(state) = report.status.parse::<RemoteJobState>() else {
        return Some(Err(AttuneError::UnexpectedState {
            provider: provider.to_string(),
            job_id: job_id.to_string(),
            status: report.status,
        }));
    };

    match state {
        RemoteJobState::Submitted | RemoteJobState::InProgress => None,
        RemoteJobState::Succeeded => Some(report.result.ok_or_else(|| {
            AttuneError::ProviderFailure {
                provider: provider.to_string(),
                job_id: job_id.to_string(),
                message: "job completed without a result".to_string(),
            }
        })),
        RemoteJobState::Failed => Some(Err(AttuneError::ProviderFailure {
            provider: provider.to_string(),
            job_id: job_id.to_string(),
            message: report
                .error
                .unwrap_or_else(|| "provider reported failure".to_string()),
        })),
    }
}
