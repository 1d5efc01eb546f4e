// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feature-hashing embedding adapter.
//!
//! Maps each lowercased word (and each adjacent word pair) to a bucket of a
//! fixed-width vector and L2-normalizes the counts. Deterministic, offline,
//! and good enough to rank overlapping vocabulary above unrelated text.

use async_trait::async_trait;

use attune_core::error::AttuneError;
use attune_core::traits::{EmbeddingAdapter, PluginAdapter};
use attune_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput};

use crate::types::l2_normalize;

/// Bigram features are down-weighted relative to single words.
const BIGRAM_WEIGHT: f32 = 0.5;

pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed a single text. Text with no word characters yields a zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimensions];
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        for word in &words {
            vec[self.bucket(word)] += 1.0;
        }
        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            vec[self.bucket(&bigram)] += BIGRAM_WEIGHT;
        }

        l2_normalize(&mut vec);
        vec
    }

    fn bucket(&self, feature: &str) -> usize {
        (fnv1a(feature.as_bytes()) % self.dimensions as u64) as usize
    }
}

/// 64-bit FNV-1a; stable across platforms and releases, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

#[async_trait]
impl PluginAdapter for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing-embedder"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }
}

#[async_trait]
impl EmbeddingAdapter for HashingEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, AttuneError> {
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.embed_text(t)).collect(),
            dimensions: self.dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cosine_similarity;

    #[test]
    fn same_text_same_vector() {
        let embedder = HashingEmbedder::new(64);
        assert_eq!(
            embedder.embed_text("I feel tired"),
            embedder.embed_text("i FEEL tired")
        );
    }

    #[test]
    fn overlapping_text_ranks_above_unrelated() {
        let embedder = HashingEmbedder::new(1024);
        let query = embedder.embed_text("exhausted at work every day");
        let related = embedder.embed_text("work leaves me exhausted");
        let unrelated = embedder.embed_text("the garden blooms in spring");
        let a = cosine_similarity(&query, &related).unwrap();
        let b = cosine_similarity(&query, &unrelated).unwrap();
        assert!(a > b, "{a} should exceed {b}");
    }

    #[test]
    fn punctuation_only_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.embed_text("?!").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn batch_embed_reports_dimensions() {
        let embedder = HashingEmbedder::new(32);
        let out = embedder
            .embed(EmbeddingInput {
                texts: vec!["a".into(), "b".into()],
            })
            .await
            .unwrap();
        assert_eq!(out.embeddings.len(), 2);
        assert_eq!(out.dimensions, 32);
        assert_eq!(out.embeddings[0].len(), 32);
    }
}
