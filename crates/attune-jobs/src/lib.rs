// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job poller for Attune's job-based analysis providers.
//!
//! A submitted job is polled at a fixed interval until the provider reports
//! a terminal state or the attempt bound is exhausted. Status checks share a
//! fixed-size worker pool; the submitter gets a [`JobHandle`] future and never
//! blocks on the polling itself.

pub mod job;
pub mod poller;

pub use job::{AnalysisJob, JobHandle, JobPolicy, JobStatus};
pub use poller::JobPoller;
