// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for Attune's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod embedding;
pub mod job;
pub mod language_model;
pub mod similarity;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use job::{AudioProsodyProvider, JobProvider, SpeechToTextProvider, VideoEmotionProvider};
pub use language_model::LanguageModel;
pub use similarity::SimilarityBackend;
