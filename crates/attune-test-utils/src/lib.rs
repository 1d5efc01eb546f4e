// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Attune integration tests.
//!
//! Provides mock collaborators and harness infrastructure for fast,
//! deterministic tests without external services.
//!
//! # Components
//!
//! - [`ScriptedJobProvider`] - job provider that answers status checks from a script
//! - [`MockLanguageModel`] - language model with keyword-routed replies
//! - [`TestHarness`] - fully wired orchestrator around the mocks

pub mod harness;
pub mod mock_jobs;
pub mod mock_model;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_jobs::ScriptedJobProvider;
pub use mock_model::MockLanguageModel;
