// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session aggregation for the Attune session engine.
//!
//! ## Architecture
//!
//! - **SessionAggregator**: per-session mailboxes, completion, set-once finalization
//! - **SessionStore**: storage seam; `InMemorySessionStore` is the process-local backend
//! - **merge**: pure `(entry, update) -> entry` function shared by every store

pub mod aggregator;
pub mod merge;
pub mod record;
pub mod store;

pub use aggregator::{Finalizer, SessionAggregator, SessionProgress};
pub use merge::{merge, EntryUpdate};
pub use record::{likert_value, ResponseEntry, ScoreSummary, SessionRecord, UnitKind, UnitSpec};
pub use store::{InMemorySessionStore, SessionStore};
