// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in CBT intervention catalog keyed by cognitive-distortion label.

use attune_core::error::AttuneError;
use attune_core::types::{ContentType, SegmentMetadata};
use attune_memory::ContextIndex;
use tracing::info;

pub const CATALOG: &[(&str, &str)] = &[
    (
        "catastrophizing",
        "Decatastrophizing: ask what the worst, best and most likely outcomes are, and how you would cope with the worst one.",
    ),
    (
        "catastrophizing",
        "Probability check: estimate how often the feared outcome has actually happened before.",
    ),
    (
        "all_or_nothing",
        "Shades of grey: rate the situation on a 0-100 scale instead of as success or failure.",
    ),
    (
        "all_or_nothing",
        "Find the partial wins: list what went at least partly well.",
    ),
    (
        "overgeneralization",
        "Look for exceptions: recall times when 'always' or 'never' did not hold.",
    ),
    (
        "overgeneralization",
        "Keep the statement specific: describe this one event without extending it to your whole life.",
    ),
    (
        "mind_reading",
        "Evidence check: separate what the other person said or did from what you assume they think.",
    ),
    (
        "mind_reading",
        "Alternative explanations: write down three other reasons for their behaviour.",
    ),
    (
        "should_statements",
        "Replace 'should' with 'I would prefer' and notice how the pressure changes.",
    ),
    (
        "emotional_reasoning",
        "Feelings are not facts: note the feeling, then list the evidence for and against the thought.",
    ),
    (
        "personalization",
        "Responsibility pie: divide the outcome among every factor that contributed, not only yourself.",
    ),
    (
        "labeling",
        "Describe the behaviour, not the person: replace the label with what actually happened.",
    ),
];

/// Indexes every catalog entry as intervention content. Returns the count.
pub async fn seed_interventions(index: &ContextIndex) -> Result<usize, AttuneError> {
    for (label, text) in CATALOG {
        index
            .index(text, SegmentMetadata::catalog(ContentType::Intervention, *label))
            .await?;
    }
    info!(count = CATALOG.len(), "intervention catalog seeded");
    Ok(CATALOG.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_normalized() {
        for (label, _) in CATALOG {
            assert_eq!(*label, label.to_lowercase());
            assert!(!label.contains(' '));
        }
    }
}
