// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Attune multimodal session engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Attune workspace. Every external
//! collaborator (analysis vendors, language model, similarity index) is
//! consumed through a trait defined here.

pub mod analysis;
pub mod error;
pub mod recording;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use analysis::AnalysisResult;
pub use error::AttuneError;
pub use types::{AdapterType, Modality, ResourceLocator, SessionId, UnitId, UserId};

// Re-export all adapter traits at crate root.
pub use traits::{
    AudioProsodyProvider, EmbeddingAdapter, JobProvider, LanguageModel, PluginAdapter,
    SimilarityBackend, SpeechToTextProvider, VideoEmotionProvider,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        let variants = [
            AdapterType::VideoEmotion,
            AdapterType::AudioProsody,
            AdapterType::SpeechToText,
            AdapterType::LanguageModel,
            AdapterType::Embedding,
            AdapterType::SimilarityIndex,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compiles only if every adapter trait is reachable from the crate root.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_language_model<T: LanguageModel>() {}
        fn _assert_similarity_backend<T: SimilarityBackend>() {}
        fn _assert_job_provider<T: JobProvider>() {}
    }
}
