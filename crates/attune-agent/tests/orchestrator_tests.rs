// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end orchestrator tests against scripted providers on a paused clock.

use std::time::Duration;

use attune_agent::{burnout_assessment, shutdown};
use attune_config::ResubmissionPolicy;
use attune_core::analysis::{EmotionScore, RawFace, RawFrame};
use attune_core::types::{AdapterType, Modality, UnitId, UserId};
use attune_core::AttuneError;
use attune_session::UnitSpec;
use attune_test_utils::{MockLanguageModel, ScriptedJobProvider, TestHarness};

fn frames() -> Vec<RawFrame> {
    vec![RawFrame {
        timestamp_ms: 0,
        faces: vec![RawFace {
            confidence: 0.97,
            emotions: vec![
                EmotionScore::new("Tiredness", 0.8),
                EmotionScore::new("Calmness", 0.4),
                EmotionScore::new("Joy", 0.1),
                EmotionScore::new("Anger", 0.05),
            ],
        }],
    }]
}

fn analysis_model() -> MockLanguageModel {
    MockLanguageModel::new()
        .route("primary emotion", "anxiety|0.8")
        .route("cognitive distortions", "catastrophizing|0.75")
        .route("key themes", "work|0.9")
        .route("therapy coach", "That sounds heavy. What evidence do you have for that outcome?")
        .route("burnout check-in", "You are carrying a lot right now.")
}

fn reflection() -> UnitId {
    UnitId::from("reflection")
}

#[tokio::test(start_paused = true)]
async fn assessment_completes_after_video_and_finalizes_once() {
    let harness = TestHarness::builder()
        .with_video(
            ScriptedJobProvider::new("video", AdapterType::VideoEmotion)
                .then_in_progress(2)
                .then_succeed(frames()),
        )
        .with_model(analysis_model())
        .build()
        .await
        .unwrap();
    let orchestrator = &harness.orchestrator;

    let id = orchestrator
        .start_session(UserId::from("u1"), burnout_assessment())
        .await
        .unwrap();
    for (unit, answer) in [("exhaustion", "4"), ("detachment", "often"), ("efficacy", "3")] {
        let complete = orchestrator
            .submit_text(&id, &UnitId::from(unit), answer)
            .await
            .unwrap();
        assert!(!complete);
    }

    assert!(!orchestrator
        .submit_text(&id, &reflection(), "see my video")
        .await
        .unwrap());
    orchestrator
        .submit_media(&id, &reflection(), Modality::Video, "s3://vlogs/u1/week-12.mp4")
        .await
        .unwrap();
    assert!(!orchestrator.check_completion(&id).await.unwrap());
    assert!(!orchestrator.is_complete(&id).await.unwrap());

    let mut progress = orchestrator.subscribe(&id).unwrap();
    progress.wait_for(|p| p.complete).await.unwrap();

    let (a, b) = tokio::join!(
        orchestrator.check_completion(&id),
        orchestrator.check_completion(&id)
    );
    assert!(a.unwrap() && b.unwrap());

    let first = orchestrator.finalize(&id).await.unwrap();
    let second = orchestrator.finalize(&id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.score, 11);
    assert_eq!(first.max_score, 15);
    assert_eq!(first.level, "high");
    assert_eq!(first.summary, "You are carrying a lot right now.");
    assert_eq!(harness.model.calls_matching("burnout check-in").await, 1);
    assert_eq!(harness.video.polls(), 3);

    let record = orchestrator.session(&id).await.unwrap();
    let entry = record.entry(&reflection()).unwrap();
    assert_eq!(entry.user_text(), Some("see my video"));
    assert!(entry.multimodal_insights.contains_key(&Modality::Video));
    assert!(record.completed);
}

#[tokio::test(start_paused = true)]
async fn failed_video_job_still_completes_the_session() {
    let harness = TestHarness::builder()
        .with_video(
            ScriptedJobProvider::new("video", AdapterType::VideoEmotion)
                .then_fail("no face detected"),
        )
        .build()
        .await
        .unwrap();
    let orchestrator = &harness.orchestrator;
    let id = orchestrator
        .start_session(UserId::from("u1"), burnout_assessment())
        .await
        .unwrap();
    for unit in ["exhaustion", "detachment", "efficacy"] {
        orchestrator
            .submit_text(&id, &UnitId::from(unit), "1")
            .await
            .unwrap();
    }
    orchestrator
        .submit_media(&id, &reflection(), Modality::Video, "s3://vlogs/u1/clip.mp4")
        .await
        .unwrap();

    let summary = orchestrator.wait_for_completion(&id).await.unwrap();
    assert_eq!(summary.level, "low");

    let record = orchestrator.session(&id).await.unwrap();
    let entry = record.entry(&reflection()).unwrap();
    assert!(entry.answered);
    assert!(entry.text_is_error);
    assert!(entry.analysis_errors[&Modality::Video].contains("no face detected"));
}

#[tokio::test(start_paused = true)]
async fn video_timeout_is_absorbed() {
    let harness = TestHarness::builder()
        .with_config(|c| c.polling.video.max_attempts = 3)
        .build()
        .await
        .unwrap();
    let orchestrator = &harness.orchestrator;
    let id = orchestrator
        .start_session(
            UserId::from("u1"),
            vec![UnitSpec::multimodal("vlog", "How was today?", [Modality::Video])],
        )
        .await
        .unwrap();
    orchestrator
        .submit_media(&id, &UnitId::from("vlog"), Modality::Video, "s3://v/a.mp4")
        .await
        .unwrap();

    orchestrator.wait_for_completion(&id).await.unwrap();
    assert_eq!(harness.video.polls(), 3);
    let record = orchestrator.session(&id).await.unwrap();
    let error = &record.entry(&UnitId::from("vlog")).unwrap().analysis_errors[&Modality::Video];
    assert!(error.contains("timed out"));
}

#[tokio::test]
async fn malformed_locator_is_rejected_synchronously() {
    let harness = TestHarness::builder().build().await.unwrap();
    let orchestrator = &harness.orchestrator;
    let id = orchestrator
        .start_session(UserId::from("u1"), burnout_assessment())
        .await
        .unwrap();

    let err = orchestrator
        .submit_media(&id, &reflection(), Modality::Video, "not a locator")
        .await
        .unwrap_err();
    assert!(matches!(err, AttuneError::Validation(_)));
    assert_eq!(harness.video.starts(), 0);
    assert!(orchestrator
        .session(&id)
        .await
        .unwrap()
        .entry(&reflection())
        .is_none());
}

#[tokio::test]
async fn unknown_unit_is_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let orchestrator = &harness.orchestrator;
    let id = orchestrator
        .start_session(UserId::from("u1"), burnout_assessment())
        .await
        .unwrap();
    let err = orchestrator
        .submit_media(&id, &UnitId::from("q99"), Modality::Audio, "s3://a/b.wav")
        .await
        .unwrap_err();
    assert!(matches!(err, AttuneError::InvalidUnit { .. }));
}

#[tokio::test(start_paused = true)]
async fn reject_policy_refuses_duplicate_uploads() {
    let harness = TestHarness::builder()
        .with_config(|c| c.polling.resubmission = ResubmissionPolicy::Reject)
        .with_video(
            ScriptedJobProvider::new("video", AdapterType::VideoEmotion)
                .then_in_progress(1)
                .then_succeed(frames()),
        )
        .build()
        .await
        .unwrap();
    let orchestrator = &harness.orchestrator;
    let id = orchestrator
        .start_session(UserId::from("u1"), burnout_assessment())
        .await
        .unwrap();

    orchestrator
        .submit_media(&id, &reflection(), Modality::Video, "s3://v/first.mp4")
        .await
        .unwrap();
    let err = orchestrator
        .submit_media(&id, &reflection(), Modality::Video, "s3://v/second.mp4")
        .await
        .unwrap_err();
    assert!(matches!(err, AttuneError::Conflict { .. }));
    assert_eq!(harness.video.starts(), 1);
}

#[tokio::test]
async fn turn_reply_uses_history_and_interventions() {
    let harness = TestHarness::builder()
        .with_model(analysis_model())
        .with_interventions()
        .build()
        .await
        .unwrap();
    let orchestrator = &harness.orchestrator;
    let user = UserId::from("u1");
    let units = || vec![UnitSpec::open_text("check-in", "How are you?")];

    let earlier = orchestrator.start_session(user.clone(), units()).await.unwrap();
    orchestrator
        .respond(&earlier, "My manager will fire me over one mistake")
        .await
        .unwrap();

    let current = orchestrator.start_session(user.clone(), units()).await.unwrap();
    let turn = orchestrator
        .respond(&current, "I'm worried my manager will fire me")
        .await
        .unwrap();

    assert_eq!(
        turn.reply,
        "That sounds heavy. What evidence do you have for that outcome?"
    );
    assert_eq!(turn.analysis.distortions[0].label, "catastrophizing");
    assert_eq!(turn.interventions.len(), 2);

    let calls = harness.model.calls().await;
    let (_, prompt) = calls
        .iter()
        .rev()
        .find(|(system, _)| system.contains("therapy coach"))
        .unwrap();
    assert!(prompt.contains("## Relevant History"));
    assert!(prompt.contains("My manager will fire me over one mistake"));
    assert!(prompt.contains("## Suggested Interventions"));
    assert!(!prompt.contains("- I'm worried my manager will fire me"));

    assert!(orchestrator.forget_user(&user).await.unwrap() > 0);
}

#[tokio::test(start_paused = true)]
async fn spoken_turn_records_transcript_and_text_analysis() {
    let harness = TestHarness::builder()
        .with_speech(
            ScriptedJobProvider::new("speech", AdapterType::SpeechToText)
                .then_in_progress(1)
                .then_succeed("  I never get anything right  ".to_string()),
        )
        .with_model(analysis_model())
        .build()
        .await
        .unwrap();
    let orchestrator = &harness.orchestrator;
    let id = orchestrator
        .start_session(
            UserId::from("u1"),
            vec![UnitSpec::multimodal("turn", "Tell me about it", [Modality::Text])],
        )
        .await
        .unwrap();

    orchestrator
        .submit_spoken_turn(&id, &UnitId::from("turn"), "s3://audio/turn-1.wav")
        .await
        .unwrap();
    orchestrator.wait_for_completion(&id).await.unwrap();

    let record = orchestrator.session(&id).await.unwrap();
    let entry = record.entry(&UnitId::from("turn")).unwrap();
    assert_eq!(entry.user_text(), Some("I never get anything right"));
    assert!(entry.multimodal_insights.contains_key(&Modality::Text));
}

#[tokio::test(start_paused = true)]
async fn failed_transcription_still_answers_open_text_unit() {
    let harness = TestHarness::builder()
        .with_speech(
            ScriptedJobProvider::new("speech", AdapterType::SpeechToText)
                .then_fail("no speech"),
        )
        .with_model(analysis_model())
        .build()
        .await
        .unwrap();
    let orchestrator = &harness.orchestrator;
    let id = orchestrator
        .start_session(
            UserId::from("u1"),
            vec![UnitSpec::open_text("turn", "Tell me about your week")],
        )
        .await
        .unwrap();

    orchestrator
        .submit_spoken_turn(&id, &UnitId::from("turn"), "s3://audio/turn-1.wav")
        .await
        .unwrap();
    let summary = tokio::time::timeout(
        Duration::from_secs(3600),
        orchestrator.wait_for_completion(&id),
    )
    .await
    .expect("session should complete despite the failed transcript")
    .unwrap();
    assert_eq!(summary.max_score, 0);

    let record = orchestrator.session(&id).await.unwrap();
    let entry = record.entry(&UnitId::from("turn")).unwrap();
    assert!(entry.answered);
    assert!(entry.text_is_error);
    assert!(entry
        .text_response
        .as_deref()
        .unwrap()
        .contains("no speech"));
    assert!(orchestrator.check_completion(&id).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn summary_uses_one_segment_per_prior_check_in() {
    let harness = TestHarness::builder()
        .with_video(
            ScriptedJobProvider::new("video", AdapterType::VideoEmotion).then_succeed(frames()),
        )
        .with_model(analysis_model())
        .build()
        .await
        .unwrap();
    let orchestrator = &harness.orchestrator;
    let user = UserId::from("u1");

    let earlier = orchestrator
        .start_session(
            user.clone(),
            vec![
                UnitSpec::open_text("week", "How was your week?"),
                UnitSpec::open_text("work", "How is work?"),
            ],
        )
        .await
        .unwrap();
    orchestrator
        .submit_text(&earlier, &UnitId::from("week"), "Work leaves me exhausted")
        .await
        .unwrap();
    orchestrator
        .submit_text(
            &earlier,
            &UnitId::from("work"),
            "Work leaves me exhausted and I always fall behind on deadlines",
        )
        .await
        .unwrap();

    let id = orchestrator
        .start_session(user, burnout_assessment())
        .await
        .unwrap();
    for (unit, answer) in [("exhaustion", "4"), ("detachment", "often"), ("efficacy", "3")] {
        orchestrator
            .submit_text(&id, &UnitId::from(unit), answer)
            .await
            .unwrap();
    }
    orchestrator
        .submit_text(&id, &reflection(), "Work leaves me exhausted and I always fall behind")
        .await
        .unwrap();
    orchestrator
        .submit_media(&id, &reflection(), Modality::Video, "s3://vlogs/u1/week-13.mp4")
        .await
        .unwrap();
    orchestrator.wait_for_completion(&id).await.unwrap();

    let calls = harness.model.calls().await;
    let (_, prompt) = calls
        .iter()
        .rev()
        .find(|(system, _)| system.contains("burnout check-in"))
        .unwrap();
    let previous = prompt.split("## Previous Check-ins\n").nth(1).unwrap();
    let lines: Vec<&str> = previous.lines().filter(|l| l.starts_with("- ")).collect();
    assert_eq!(
        lines,
        vec!["- Work leaves me exhausted and I always fall behind on deadlines"]
    );
}

#[tokio::test]
async fn drain_with_no_jobs_returns_immediately() {
    let harness = TestHarness::builder().build().await.unwrap();
    assert_eq!(
        shutdown::drain(&harness.orchestrator, Duration::from_secs(1)).await,
        0
    );
    assert!(harness
        .orchestrator
        .start_session(UserId::from("u1"), burnout_assessment())
        .await
        .is_err());
}
