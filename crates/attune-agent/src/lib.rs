// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session orchestration for the Attune session engine.
//!
//! The [`SessionOrchestrator`] is the central coordinator that:
//! - Opens sessions and records direct answers
//! - Dispatches recordings to the analysis adapters without waiting on them
//! - Routes every analysis outcome into the session aggregator
//! - Generates CBT replies from fused text, voice and facial signals
//! - Finalizes burnout assessments through [`BurnoutFinalizer`]

pub mod context;
pub mod finalizer;
pub mod interventions;
pub mod orchestrator;
pub mod scoring;
pub mod shutdown;

pub use finalizer::BurnoutFinalizer;
pub use orchestrator::{logical_key, SessionOrchestrator, TurnReply};
pub use scoring::{burnout_assessment, score_record, BurnoutLevel, BurnoutScore};
