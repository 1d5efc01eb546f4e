// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reduction of raw provider emotion vectors to their strongest entries.

use attune_core::analysis::{
    EmotionScore, FaceEmotions, FrameEmotions, RawFrame, RawUtterance, UtteranceEmotions,
};

/// The `n` highest-scoring emotions, best first.
///
/// Non-finite scores are dropped; equal scores are ordered by name so the
/// output is stable.
pub fn top_emotions(scores: &[EmotionScore], n: usize) -> Vec<EmotionScore> {
    let mut ranked: Vec<EmotionScore> = scores
        .iter()
        .filter(|e| e.score.is_finite())
        .cloned()
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(n);
    ranked
}

pub fn reduce_utterances(raw: Vec<RawUtterance>, n: usize) -> Vec<UtteranceEmotions> {
    raw.into_iter()
        .map(|u| UtteranceEmotions {
            top_emotions: top_emotions(&u.emotions, n),
            text: u.text,
            begin_ms: u.begin_ms,
            end_ms: u.end_ms,
        })
        .collect()
}

pub fn reduce_frames(raw: Vec<RawFrame>, n: usize) -> Vec<FrameEmotions> {
    raw.into_iter()
        .map(|frame| FrameEmotions {
            timestamp_ms: frame.timestamp_ms,
            faces: frame
                .faces
                .into_iter()
                .map(|face| FaceEmotions {
                    confidence: face.confidence,
                    top_emotions: top_emotions(&face.emotions, n),
                })
                .collect(),
        })
        .collect()
}

/// Utterance texts joined in order, whitespace-normalized.
pub fn transcript_of(utterances: &[UtteranceEmotions]) -> String {
    utterances
        .iter()
        .map(|u| u.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::analysis::RawFace;

    fn scores(pairs: &[(&str, f64)]) -> Vec<EmotionScore> {
        pairs.iter().map(|(n, s)| EmotionScore::new(*n, *s)).collect()
    }

    #[test]
    fn keeps_top_three_in_descending_order() {
        let input = scores(&[("Joy", 0.5), ("Sadness", 0.9), ("Anger", 0.2), ("Calm", 0.7)]);
        let top = top_emotions(&input, 3);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Sadness", "Calm", "Joy"]);
        assert!(!names.contains(&"Anger"));
    }

    #[test]
    fn fewer_entries_than_limit_are_all_kept() {
        assert_eq!(top_emotions(&scores(&[("Joy", 0.1)]), 3).len(), 1);
    }

    #[test]
    fn nan_scores_are_dropped() {
        let top = top_emotions(&scores(&[("Joy", f64::NAN), ("Calm", 0.2)]), 3);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Calm");
    }

    #[test]
    fn frames_reduce_per_face() {
        let frames = vec![RawFrame {
            timestamp_ms: 40,
            faces: vec![RawFace {
                confidence: 0.98,
                emotions: scores(&[("A", 0.1), ("B", 0.4), ("C", 0.3), ("D", 0.2)]),
            }],
        }];
        let reduced = reduce_frames(frames, 2);
        let names: Vec<&str> = reduced[0].faces[0]
            .top_emotions
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn transcript_skips_blank_utterances() {
        let utterances = reduce_utterances(
            vec![
                RawUtterance {
                    text: " I am tired ".into(),
                    begin_ms: 0,
                    end_ms: 900,
                    emotions: vec![],
                },
                RawUtterance {
                    text: "".into(),
                    begin_ms: 900,
                    end_ms: 1000,
                    emotions: vec![],
                },
                RawUtterance {
                    text: "all the time".into(),
                    begin_ms: 1000,
                    end_ms: 2000,
                    emotions: vec![],
                },
            ],
            3,
        );
        assert_eq!(transcript_of(&utterances), "I am tired all the time");
    }
}
