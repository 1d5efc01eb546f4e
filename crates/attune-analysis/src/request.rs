// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed analysis requests and the dispatcher that routes them.

use std::sync::Arc;

use attune_config::{AnalysisConfig, PollingConfig};
use attune_core::analysis::AnalysisResult;
use attune_core::error::AttuneError;
use attune_core::traits::LanguageModel;
use attune_core::types::Modality;
use attune_core::{AudioProsodyProvider, SpeechToTextProvider, VideoEmotionProvider};
use attune_jobs::{JobPolicy, JobPoller};
use futures::FutureExt;

use crate::audio::AudioProsodyAdapter;
use crate::text::TextAnalyzer;
use crate::transcription::{PendingTranscript, SpeechToTextAdapter};
use crate::video::VideoEmotionAdapter;
use crate::PendingAnalysis;

/// One unit of input to analyze, tagged by modality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    /// Raw text, analyzed by the language model.
    Text(String),
    /// Locator of an audio recording.
    Audio(String),
    /// Locator of a video recording.
    Video(String),
}

impl AnalysisRequest {
    pub fn modality(&self) -> Modality {
        match self {
            AnalysisRequest::Text(_) => Modality::Text,
            AnalysisRequest::Audio(_) => Modality::Audio,
            AnalysisRequest::Video(_) => Modality::Video,
        }
    }

    /// Builds a media request for a non-text modality.
    pub fn media(modality: Modality, locator: impl Into<String>) -> Result<Self, AttuneError> {
        match modality {
            Modality::Audio => Ok(AnalysisRequest::Audio(locator.into())),
            Modality::Video => Ok(AnalysisRequest::Video(locator.into())),
            Modality::Text => Err(AttuneError::Validation(
                "text is not a media modality".to_string(),
            )),
        }
    }
}

/// The external collaborators behind the analysis adapters.
#[derive(Clone)]
pub struct AnalysisProviders {
    pub video: Arc<VideoEmotionProvider>,
    pub audio: Arc<AudioProsodyProvider>,
    pub speech: Arc<SpeechToTextProvider>,
    pub model: Arc<dyn LanguageModel>,
}

/// Routes [`AnalysisRequest`]s to the adapter for their modality.
pub struct AnalysisDispatcher {
    text: Arc<TextAnalyzer>,
    audio: AudioProsodyAdapter,
    video: VideoEmotionAdapter,
    speech: SpeechToTextAdapter,
}

impl AnalysisDispatcher {
    pub fn new(
        providers: AnalysisProviders,
        poller: JobPoller,
        polling: &PollingConfig,
        analysis: &AnalysisConfig,
    ) -> Self {
        Self {
            text: Arc::new(TextAnalyzer::new(
                providers.model,
                analysis.max_text_chars,
            )),
            audio: AudioProsodyAdapter::new(
                providers.audio,
                poller.clone(),
                JobPolicy::from(&polling.audio),
                analysis.clone(),
            ),
            video: VideoEmotionAdapter::new(
                providers.video,
                poller.clone(),
                JobPolicy::from(&polling.video),
                analysis.clone(),
            ),
            speech: SpeechToTextAdapter::new(
                providers.speech,
                poller,
                JobPolicy::from(&polling.transcription),
                analysis,
            ),
        }
    }

    pub fn text(&self) -> &TextAnalyzer {
        &self.text
    }

    /// Starts the analysis and returns its pending result.
    ///
    /// Validation failures (bad locator, empty text) and rejected
    /// submissions are returned here; everything later arrives through the
    /// pending future.
    pub async fn dispatch(
        &self,
        request: AnalysisRequest,
        logical_key: Option<String>,
    ) -> Result<PendingAnalysis, AttuneError> {
        match request {
            AnalysisRequest::Text(text) => {
                if text.trim().is_empty() {
                    return Err(AttuneError::Validation(
                        "cannot analyze empty text".to_string(),
                    ));
                }
                let analyzer = self.text.clone();
                Ok(async move { Ok(AnalysisResult::Text(analyzer.analyze(&text).await?)) }.boxed())
            }
            AnalysisRequest::Audio(locator) => self.audio.analyze(&locator, logical_key).await,
            AnalysisRequest::Video(locator) => self.video.analyze(&locator, logical_key).await,
        }
    }

    pub async fn transcribe(
        &self,
        locator: &str,
        logical_key: Option<String>,
    ) -> Result<PendingTranscript, AttuneError> {
        self.speech.transcribe(locator, logical_key).await
    }
}
