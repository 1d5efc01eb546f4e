// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider payloads and the provider-agnostic analysis results built from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AttuneError;
use crate::types::Modality;

/// One entry of an emotion or affect vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub name: String,
    pub score: f64,
}

impl EmotionScore {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// A label with the model's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labeled {
    pub label: String,
    pub confidence: f64,
}

// --- Raw provider payloads ---

/// One utterance as reported by the audio prosody provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUtterance {
    pub text: String,
    pub begin_ms: u64,
    pub end_ms: u64,
    pub emotions: Vec<EmotionScore>,
}

/// One detected face within a video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFace {
    /// Detection confidence for the face itself.
    pub confidence: f64,
    pub emotions: Vec<EmotionScore>,
}

/// All faces detected at one timestamp of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub timestamp_ms: u64,
    pub faces: Vec<RawFace>,
}

// --- Parsed analysis results ---

/// Top emotions for a single utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceEmotions {
    pub text: String,
    pub begin_ms: u64,
    pub end_ms: u64,
    pub top_emotions: Vec<EmotionScore>,
}

/// Prosody analysis of an audio recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAnalysis {
    /// Utterance texts joined in order.
    pub transcript: String,
    pub utterances: Vec<UtteranceEmotions>,
}

/// Top emotions for one detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceEmotions {
    pub confidence: f64,
    pub top_emotions: Vec<EmotionScore>,
}

/// Top emotions for every face at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEmotions {
    pub timestamp_ms: u64,
    pub faces: Vec<FaceEmotions>,
}

/// Facial expression analysis of a video recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub frames: Vec<FrameEmotions>,
}

/// Language-model analysis of a single piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub primary_emotion: Labeled,
    /// Cognitive-distortion labels; empty when none were detected.
    pub distortions: Vec<Labeled>,
    pub themes: Vec<Labeled>,
}

/// Provider-agnostic output of one completed analysis.
///
/// Immutable once built; the aggregator stores it serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "lowercase")]
pub enum AnalysisResult {
    Text(TextAnalysis),
    Audio(AudioAnalysis),
    Video(VideoAnalysis),
}

impl AnalysisResult {
    pub fn modality(&self) -> Modality {
        match self {
            AnalysisResult::Text(_) => Modality::Text,
            AnalysisResult::Audio(_) => Modality::Audio,
            AnalysisResult::Video(_) => Modality::Video,
        }
    }

    /// Serializes the result for storage in a response entry.
    pub fn to_json(&self) -> Result<String, AttuneError> {
        serde_json::to_string(self)
            .map_err(|e| AttuneError::Internal(format!("failed to serialize analysis: {e}")))
    }

    pub fn from_json(raw: &str) -> Result<Self, AttuneError> {
        serde_json::from_str(raw)
            .map_err(|e| AttuneError::Validation(format!("malformed stored analysis: {e}")))
    }

    /// Emotions ranked by their summed score across every utterance or face.
    ///
    /// Text results contribute their primary emotion.
    pub fn dominant_emotions(&self, limit: usize) -> Vec<EmotionScore> {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        match self {
            AnalysisResult::Text(text) => {
                *totals.entry(text.primary_emotion.label.as_str()).or_default() +=
                    text.primary_emotion.confidence;
            }
            AnalysisResult::Audio(audio) => {
                for emotion in audio.utterances.iter().flat_map(|u| &u.top_emotions) {
                    *totals.entry(emotion.name.as_str()).or_default() += emotion.score;
                }
            }
            AnalysisResult::Video(video) => {
                for emotion in video
                    .frames
                    .iter()
                    .flat_map(|f| &f.faces)
                    .flat_map(|face| &face.top_emotions)
                {
                    *totals.entry(emotion.name.as_str()).or_default() += emotion.score;
                }
            }
        }

        let mut ranked: Vec<EmotionScore> = totals
            .into_iter()
            .map(|(name, score)| EmotionScore::new(name, score))
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(limit);
        ranked
    }
}
