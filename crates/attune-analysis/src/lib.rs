// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis adapters for the Attune session engine.
//!
//! Audio, video and speech-to-text providers are job-based and run through
//! the [`attune_jobs::JobPoller`]; text goes straight to the language model.
//! Every adapter validates its input before starting work and hands back a
//! pending future, so callers never block on a provider.

pub mod audio;
pub mod reduce;
pub mod request;
pub mod text;
pub mod transcription;
pub mod video;

use attune_core::analysis::AnalysisResult;
use attune_core::error::AttuneError;
use futures::future::BoxFuture;

/// An analysis that has been started and resolves once its provider finishes.
pub type PendingAnalysis = BoxFuture<'static, Result<AnalysisResult, AttuneError>>;

pub use audio::AudioProsodyAdapter;
pub use reduce::top_emotions;
pub use request::{AnalysisDispatcher, AnalysisProviders, AnalysisRequest};
pub use text::TextAnalyzer;
pub use transcription::{PendingTranscript, SpeechToTextAdapter};
pub use video::VideoEmotionAdapter;
