// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Burnout assessment scoring.

use attune_core::types::Modality;
use attune_session::{likert_value, SessionRecord, UnitKind, UnitSpec};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BurnoutLevel {
    Low,
    Moderate,
    High,
}

impl BurnoutLevel {
    /// Low below 40% of the maximum, moderate below 70%, high otherwise.
    pub fn for_score(score: u32, max_score: u32) -> Self {
        if max_score == 0 {
            return BurnoutLevel::Low;
        }
        let ratio = f64::from(score) / f64::from(max_score);
        if ratio < 0.4 {
            BurnoutLevel::Low
        } else if ratio < 0.7 {
            BurnoutLevel::Moderate
        } else {
            BurnoutLevel::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnoutScore {
    pub score: u32,
    pub max_score: u32,
    pub level: BurnoutLevel,
}

/// Sums the Likert answers of a session. Each Likert unit contributes up to 5.
///
/// Answers that do not parse (for example error text standing in for a
/// response) contribute nothing.
pub fn score_record(record: &SessionRecord) -> BurnoutScore {
    let likert: Vec<&UnitSpec> = record
        .units
        .iter()
        .filter(|u| u.kind == UnitKind::Likert)
        .collect();

    let score: u32 = likert
        .iter()
        .filter_map(|u| record.entry(&u.id))
        .filter_map(|e| e.user_text())
        .filter_map(likert_value)
        .sum();
    let max_score = 5 * likert.len() as u32;

    BurnoutScore {
        score,
        max_score,
        level: BurnoutLevel::for_score(score, max_score),
    }
}

/// The standard burnout check-in: three Likert questions and a video reflection.
pub fn burnout_assessment() -> Vec<UnitSpec> {
    vec![
        UnitSpec::likert("exhaustion", "I feel emotionally drained by my work."),
        UnitSpec::likert("detachment", "I feel detached from the people I work with."),
        UnitSpec::likert("efficacy", "I doubt whether my work makes a difference."),
        UnitSpec::multimodal(
            "reflection",
            "Record a short video describing how your week went.",
            [Modality::Video],
        ),
    ]
}
