// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for conversation turns and session summaries.
//!
//! Turns fuse three sources: the text analysis of the current message, the
//! latest audio and video insights recorded in the session, and context
//! retrieved from the index (prior sessions and interventions).

use std::collections::BTreeMap;
use std::fmt::Write;

use attune_core::analysis::{AnalysisResult, EmotionScore, TextAnalysis};
use attune_core::types::{Modality, SegmentMatch};
use attune_memory::format_context;
use attune_session::SessionRecord;
use tracing::warn;

use crate::scoring::BurnoutScore;

pub const TURN_INSTRUCTION: &str = "You are a supportive cognitive behavioural therapy coach. \
Reply to the user in two to four sentences. Acknowledge how they feel, gently name any \
thinking pattern you notice, and suggest one small concrete step.";

pub const SUMMARY_INSTRUCTION: &str = "Write a short, warm summary of this burnout check-in for \
the user. Mention the overall level, the strongest signals in their answers and one \
suggestion. Do not diagnose.";

/// Most recent dominant emotions per media modality recorded in the session.
///
/// Later units win. Stored results that fail to parse are skipped.
pub fn latest_media_emotions(
    record: &SessionRecord,
    limit: usize,
) -> BTreeMap<Modality, Vec<EmotionScore>> {
    let mut latest = BTreeMap::new();
    for unit in &record.units {
        let Some(entry) = record.entry(&unit.id) else {
            continue;
        };
        for (modality, raw) in &entry.multimodal_insights {
            if *modality == Modality::Text {
                continue;
            }
            match AnalysisResult::from_json(raw) {
                Ok(result) => {
                    latest.insert(*modality, result.dominant_emotions(limit));
                }
                Err(e) => {
                    warn!(unit_id = %unit.id, %modality, error = %e, "skipping stored insight");
                }
            }
        }
    }
    latest
}

fn describe_emotions(emotions: &[EmotionScore]) -> String {
    emotions
        .iter()
        .map(|e| format!("{} ({:.2})", e.name, e.score))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-line rendering of an analysis, used when indexing it.
pub fn describe_analysis(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Text(text) => describe_text(text),
        other => format!(
            "{} analysis: dominant emotions {}",
            other.modality(),
            describe_emotions(&other.dominant_emotions(3))
        ),
    }
}

fn describe_text(text: &TextAnalysis) -> String {
    let mut line = format!(
        "text analysis: primary emotion {} ({:.2})",
        text.primary_emotion.label, text.primary_emotion.confidence
    );
    if !text.distortions.is_empty() {
        let labels: Vec<&str> = text.distortions.iter().map(|d| d.label.as_str()).collect();
        let _ = write!(line, "; distortions {}", labels.join(", "));
    }
    if !text.themes.is_empty() {
        let labels: Vec<&str> = text.themes.iter().map(|t| t.label.as_str()).collect();
        let _ = write!(line, "; themes {}", labels.join(", "));
    }
    line
}

pub fn build_turn_prompt(
    message: &str,
    analysis: &TextAnalysis,
    media: &BTreeMap<Modality, Vec<EmotionScore>>,
    history: &[SegmentMatch],
    interventions: &[SegmentMatch],
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "## Message\n{message}\n");
    let _ = writeln!(prompt, "## Analysis\n{}\n", describe_text(analysis));

    if !media.is_empty() {
        prompt.push_str("## Voice and Expression\n");
        for (modality, emotions) in media {
            let _ = writeln!(prompt, "- {modality}: {}", describe_emotions(emotions));
        }
        prompt.push('\n');
    }

    let history = format_context("Relevant History", history);
    if !history.is_empty() {
        let _ = writeln!(prompt, "{history}");
    }
    let interventions = format_context("Suggested Interventions", interventions);
    if !interventions.is_empty() {
        let _ = writeln!(prompt, "{interventions}");
    }
    prompt.trim_end().to_string()
}

pub fn build_summary_prompt(
    record: &SessionRecord,
    score: &BurnoutScore,
    history: &[SegmentMatch],
) -> String {
    let mut prompt = format!(
        "## Score\n{} of {} ({})\n\n## Answers\n",
        score.score, score.max_score, score.level
    );
    for unit in &record.units {
        let answer = record
            .entry(&unit.id)
            .and_then(|e| e.text_response.as_deref())
            .unwrap_or("(no answer)");
        let _ = writeln!(prompt, "- {}: {answer}", unit.prompt);
    }

    let media = latest_media_emotions(record, 3);
    if !media.is_empty() {
        prompt.push_str("\n## Voice and Expression\n");
        for (modality, emotions) in &media {
            let _ = writeln!(prompt, "- {modality}: {}", describe_emotions(emotions));
        }
    }

    let history = format_context("Previous Check-ins", history);
    if !history.is_empty() {
        let _ = write!(prompt, "\n{history}");
    }
    prompt.trim_end().to_string()
}

/// Summary used when the language model is unavailable.
pub fn fallback_summary(score: &BurnoutScore) -> String {
    let advice = match score.level {
        crate::scoring::BurnoutLevel::Low => {
            "Your answers suggest you are coping well; keep protecting the routines that help."
        }
        crate::scoring::BurnoutLevel::Moderate => {
            "Some strain is showing; consider scheduling regular breaks and one restorative activity this week."
        }
        crate::scoring::BurnoutLevel::High => {
            "Your answers point to significant strain; consider talking to someone you trust or a professional."
        }
    };
    format!(
        "Burnout check-in score: {} of {} ({}). {advice}",
        score.score, score.max_score, score.level
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::analysis::{FaceEmotions, FrameEmotions, Labeled, VideoAnalysis};
    use attune_core::types::{SessionId, UnitId, UserId};
    use attune_session::{ResponseEntry, UnitSpec};

    use crate::scoring::BurnoutLevel;

    fn text_analysis() -> TextAnalysis {
        TextAnalysis {
            primary_emotion: Labeled {
                label: "worry".into(),
                confidence: 0.7,
            },
            distortions: vec![Labeled {
                label: "catastrophizing".into(),
                confidence: 0.6,
            }],
            themes: vec![],
        }
    }

    fn video_json() -> String {
        AnalysisResult::Video(VideoAnalysis {
            frames: vec![FrameEmotions {
                timestamp_ms: 0,
                faces: vec![FaceEmotions {
                    confidence: 0.9,
                    top_emotions: vec![EmotionScore::new("Tiredness", 0.8)],
                }],
            }],
        })
        .to_json()
        .unwrap()
    }

    #[test]
    fn latest_media_emotions_reads_stored_insights() {
        let mut record = SessionRecord::new(
            SessionId::from("s"),
            UserId::from("u"),
            vec![UnitSpec::multimodal("v", "vlog", [Modality::Video])],
        );
        let mut entry = ResponseEntry::default();
        entry.multimodal_insights.insert(Modality::Video, video_json());
        entry
            .multimodal_insights
            .insert(Modality::Audio, "not json".into());
        record.entries.insert(UnitId::from("v"), entry);

        let media = latest_media_emotions(&record, 3);
        assert_eq!(media.len(), 1);
        assert_eq!(media[&Modality::Video][0].name, "Tiredness");
    }

    #[test]
    fn turn_prompt_includes_every_section() {
        let mut media = BTreeMap::new();
        media.insert(Modality::Audio, vec![EmotionScore::new("Anxiety", 0.9)]);
        let prompt = build_turn_prompt("I will fail", &text_analysis(), &media, &[], &[]);
        assert!(prompt.starts_with("## Message\nI will fail"));
        assert!(prompt.contains("distortions catastrophizing"));
        assert!(prompt.contains("- audio: Anxiety (0.90)"));
        assert!(!prompt.contains("Relevant History"));
    }

    #[test]
    fn fallback_summary_mentions_score() {
        let summary = fallback_summary(&BurnoutScore {
            score: 7,
            max_score: 15,
            level: BurnoutLevel::Moderate,
        });
        assert!(summary.starts_with("Burnout check-in score: 7 of 15 (moderate)."));
    }
}
