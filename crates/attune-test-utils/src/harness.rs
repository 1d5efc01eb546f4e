// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete orchestrator with scripted job
//! providers, a mock language model and the in-memory similarity index.
//! The providers stay reachable through the harness so tests can assert on
//! how often they were started and polled.

use std::sync::Arc;

use attune_agent::SessionOrchestrator;
use attune_analysis::AnalysisProviders;
use attune_config::AttuneConfig;
use attune_core::analysis::{RawFrame, RawUtterance};
use attune_core::error::AttuneError;
use attune_core::types::AdapterType;
use attune_memory::{HashingEmbedder, InMemoryVectorStore};

use crate::mock_jobs::ScriptedJobProvider;
use crate::mock_model::MockLanguageModel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    video: ScriptedJobProvider<Vec<RawFrame>>,
    audio: ScriptedJobProvider<Vec<RawUtterance>>,
    speech: ScriptedJobProvider<String>,
    model: MockLanguageModel,
    config: AttuneConfig,
    seed_interventions: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            video: ScriptedJobProvider::new("video", AdapterType::VideoEmotion),
            audio: ScriptedJobProvider::new("audio", AdapterType::AudioProsody),
            speech: ScriptedJobProvider::new("speech", AdapterType::SpeechToText),
            model: MockLanguageModel::new(),
            config: AttuneConfig::default(),
            seed_interventions: false,
        }
    }

    pub fn with_video(mut self, provider: ScriptedJobProvider<Vec<RawFrame>>) -> Self {
        self.video = provider;
        self
    }

    pub fn with_audio(mut self, provider: ScriptedJobProvider<Vec<RawUtterance>>) -> Self {
        self.audio = provider;
        self
    }

    pub fn with_speech(mut self, provider: ScriptedJobProvider<String>) -> Self {
        self.speech = provider;
        self
    }

    pub fn with_model(mut self, model: MockLanguageModel) -> Self {
        self.model = model;
        self
    }

    /// Adjust the configuration before the orchestrator is built.
    pub fn with_config(mut self, edit: impl FnOnce(&mut AttuneConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Index the built-in intervention catalog during `build`.
    pub fn with_interventions(mut self) -> Self {
        self.seed_interventions = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, AttuneError> {
        let video = Arc::new(self.video);
        let audio = Arc::new(self.audio);
        let speech = Arc::new(self.speech);
        let model = Arc::new(self.model);

        let providers = AnalysisProviders {
            video: video.clone(),
            audio: audio.clone(),
            speech: speech.clone(),
            model: model.clone(),
        };
        let embedder = Arc::new(HashingEmbedder::new(
            self.config.retrieval.embedding_dimensions,
        ));
        let similarity = Arc::new(InMemoryVectorStore::new(embedder));
        let orchestrator = SessionOrchestrator::new(&self.config, providers, similarity);

        if self.seed_interventions {
            orchestrator.seed_interventions().await?;
        }

        Ok(TestHarness {
            orchestrator,
            video,
            audio,
            speech,
            model,
            config: self.config,
        })
    }
}

/// A complete test environment around one orchestrator.
pub struct TestHarness {
    pub orchestrator: SessionOrchestrator,
    pub video: Arc<ScriptedJobProvider<Vec<RawFrame>>>,
    pub audio: Arc<ScriptedJobProvider<Vec<RawUtterance>>>,
    pub speech: Arc<ScriptedJobProvider<String>>,
    pub model: Arc<MockLanguageModel>,
    pub config: AttuneConfig,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}
