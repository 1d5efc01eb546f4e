// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context retrieval for the Attune session engine.
//!
//! ## Architecture
//!
//! - **ContextIndex**: retrieval policy (threshold, session exclusion, dedup, deletion)
//! - **InMemoryVectorStore**: `SimilarityBackend` with brute-force cosine search
//! - **HashingEmbedder**: offline feature-hashing `EmbeddingAdapter`

pub mod embedder;
pub mod index;
pub mod store;
pub mod types;

pub use embedder::HashingEmbedder;
pub use index::{dedup_longest_per_session, format_context, ContextIndex};
pub use store::InMemoryVectorStore;
pub use types::{cosine_similarity, EmbeddedSegment};
