// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model text analysis.
//!
//! Three independent completions run concurrently: primary emotion,
//! cognitive distortions and key themes. Each reply is a `label|confidence`
//! line (or a comma-separated list of them) and is parsed strictly: a reply
//! that does not fit the format fails the whole analysis.

use std::sync::Arc;

use attune_core::analysis::{Labeled, TextAnalysis};
use attune_core::error::AttuneError;
use attune_core::traits::LanguageModel;
use tracing::debug;

const EMOTION_INSTRUCTION: &str = "Identify the primary emotion expressed in the user's text. \
Reply with a single line `label|confidence` where confidence is between 0 and 1.";

const DISTORTION_INSTRUCTION: &str = "List the cognitive distortions present in the user's text \
(for example catastrophizing, all_or_nothing, mind_reading, overgeneralization). Reply with \
comma-separated `label|confidence` pairs on one line, or `none` if there are none.";

const THEME_INSTRUCTION: &str = "Extract the key themes of the user's text. Reply with \
comma-separated `label|confidence` pairs on one line, or `none` if there are none.";

pub struct TextAnalyzer {
    model: Arc<dyn LanguageModel>,
    max_chars: usize,
}

impl TextAnalyzer {
    pub fn new(model: Arc<dyn LanguageModel>, max_chars: usize) -> Self {
        Self {
            model,
            max_chars: max_chars.max(1),
        }
    }

    /// Runs the three analysis calls concurrently and combines their results.
    pub async fn analyze(&self, text: &str) -> Result<TextAnalysis, AttuneError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AttuneError::Validation(
                "cannot analyze empty text".to_string(),
            ));
        }
        let text = truncate_chars(text, self.max_chars);

        let (emotion, distortions, themes) = tokio::try_join!(
            self.model.complete(EMOTION_INSTRUCTION, text),
            self.model.complete(DISTORTION_INSTRUCTION, text),
            self.model.complete(THEME_INSTRUCTION, text),
        )?;

        let analysis = TextAnalysis {
            primary_emotion: parse_labeled(first_line(&emotion))?,
            distortions: parse_labeled_list(&distortions)?
                .into_iter()
                .map(|l| Labeled {
                    label: normalize_distortion(&l.label),
                    confidence: l.confidence,
                })
                .collect(),
            themes: parse_labeled_list(&themes)?,
        };
        debug!(
            emotion = %analysis.primary_emotion.label,
            distortions = analysis.distortions.len(),
            "text analyzed"
        );
        Ok(analysis)
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn first_line(reply: &str) -> &str {
    reply
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

/// Parses one `label|confidence` item.
///
/// The label is everything before the last `|`; the confidence must be a
/// finite number in `[0, 1]`.
pub fn parse_labeled(raw: &str) -> Result<Labeled, AttuneError> {
    let raw = raw.trim();
    let (label, confidence) = raw.rsplit_once('|').ok_or_else(|| {
        AttuneError::Validation(format!("model reply `{raw}` is missing the `|` separator"))
    })?;

    let label = label.trim();
    if label.is_empty() {
        return Err(AttuneError::Validation(format!(
            "model reply `{raw}` has an empty label"
        )));
    }

    let confidence: f64 = confidence.trim().parse().map_err(|_| {
        AttuneError::Validation(format!(
            "model reply `{raw}` has a non-numeric confidence"
        ))
    })?;
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(AttuneError::Validation(format!(
            "model reply `{raw}` has confidence outside [0, 1]"
        )));
    }

    Ok(Labeled {
        label: label.to_string(),
        confidence,
    })
}

/// Parses a comma-separated list of `label|confidence` items; `none` is empty.
pub fn parse_labeled_list(reply: &str) -> Result<Vec<Labeled>, AttuneError> {
    let line = first_line(reply);
    if line.is_empty() || line.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }
    line.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_labeled)
        .collect()
}

/// Canonical form of a distortion label: lowercase, words joined by `_`.
pub fn normalize_distortion(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_and_confidence() {
        let l = parse_labeled("sadness|0.82").unwrap();
        assert_eq!(l.label, "sadness");
        assert!((l.confidence - 0.82).abs() < 1e-9);
    }

    #[test]
    fn label_may_contain_separator() {
        let l = parse_labeled("work | life balance|0.4").unwrap();
        assert_eq!(l.label, "work | life balance");
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(matches!(
            parse_labeled("sadness 0.8"),
            Err(AttuneError::Validation(_))
        ));
    }

    #[test]
    fn non_numeric_confidence_is_rejected() {
        assert!(parse_labeled("sadness|high").is_err());
        assert!(parse_labeled("sadness|NaN").is_err());
        assert!(parse_labeled("sadness|1.5").is_err());
        assert!(parse_labeled("|0.5").is_err());
    }

    #[test]
    fn none_list_is_empty() {
        assert!(parse_labeled_list("None").unwrap().is_empty());
        assert!(parse_labeled_list("   ").unwrap().is_empty());
    }

    #[test]
    fn list_reads_first_line_only() {
        let list = parse_labeled_list("work|0.9, sleep|0.6\nexplanation follows").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].label, "sleep");
    }

    #[test]
    fn one_bad_item_fails_the_list() {
        assert!(parse_labeled_list("work|0.9, sleep").is_err());
    }

    #[test]
    fn distortion_labels_are_normalized() {
        assert_eq!(normalize_distortion("All-or-Nothing"), "all_or_nothing");
        assert_eq!(normalize_distortion(" Mind Reading "), "mind_reading");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
