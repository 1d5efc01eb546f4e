// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the analysis adapters against scripted providers.

use std::sync::Arc;
use std::time::Duration;

use attune_analysis::{
    AnalysisDispatcher, AnalysisProviders, AnalysisRequest, AudioProsodyAdapter, TextAnalyzer,
    VideoEmotionAdapter,
};
use attune_config::{AnalysisConfig, PollingConfig, ResubmissionPolicy};
use attune_core::analysis::{AnalysisResult, EmotionScore, RawFace, RawFrame, RawUtterance};
use attune_core::types::{AdapterType, Modality};
use attune_core::{AttuneError, AudioProsodyProvider, LanguageModel, VideoEmotionProvider};
use attune_jobs::{JobPoller, JobPolicy};
use attune_test_utils::{MockLanguageModel, ScriptedJobProvider};

fn policy() -> JobPolicy {
    JobPolicy::new(Duration::from_secs(5), 10)
}

fn poller() -> JobPoller {
    JobPoller::with_workers(2, ResubmissionPolicy::Allow)
}

fn emotions(pairs: &[(&str, f64)]) -> Vec<EmotionScore> {
    pairs.iter().map(|(n, s)| EmotionScore::new(*n, *s)).collect()
}

#[tokio::test(start_paused = true)]
async fn video_result_is_reduced_to_top_three() {
    let provider = Arc::new(
        ScriptedJobProvider::new("video", AdapterType::VideoEmotion)
            .then_in_progress(1)
            .then_succeed(vec![RawFrame {
                timestamp_ms: 0,
                faces: vec![RawFace {
                    confidence: 0.99,
                    emotions: emotions(&[
                        ("Joy", 0.5),
                        ("Tiredness", 0.9),
                        ("Anger", 0.2),
                        ("Calmness", 0.7),
                    ]),
                }],
            }]),
    );
    let dyn_provider: Arc<VideoEmotionProvider> = provider.clone();
    let adapter =
        VideoEmotionAdapter::new(dyn_provider, poller(), policy(), AnalysisConfig::default());

    let pending = adapter.analyze("s3://vlogs/q4.mp4", None).await.unwrap();
    let AnalysisResult::Video(video) = pending.await.unwrap() else {
        panic!("expected a video result");
    };

    let names: Vec<&str> = video.frames[0].faces[0]
        .top_emotions
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, vec!["Tiredness", "Calmness", "Joy"]);
    assert_eq!(provider.polls(), 2);
}

#[tokio::test]
async fn malformed_locator_fails_before_any_job_starts() {
    let provider = Arc::new(ScriptedJobProvider::<Vec<RawFrame>>::new(
        "video",
        AdapterType::VideoEmotion,
    ));
    let dyn_provider: Arc<VideoEmotionProvider> = provider.clone();
    let adapter =
        VideoEmotionAdapter::new(dyn_provider, poller(), policy(), AnalysisConfig::default());

    for bad in ["", "ftp://host/clip.mp4", "s3://", "s3://bucket/my clip.mp4"] {
        let result = adapter.analyze(bad, None).await;
        assert!(
            matches!(result, Err(AttuneError::Validation(_))),
            "locator {bad:?} should be rejected"
        );
    }
    assert_eq!(provider.starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn audio_result_carries_transcript_and_top_emotions() {
    let provider = Arc::new(
        ScriptedJobProvider::new("audio", AdapterType::AudioProsody).then_succeed(vec![
            RawUtterance {
                text: "I can't switch off".into(),
                begin_ms: 0,
                end_ms: 1200,
                emotions: emotions(&[("Anxiety", 0.8), ("Tiredness", 0.6), ("Calm", 0.1)]),
            },
            RawUtterance {
                text: "even at night".into(),
                begin_ms: 1200,
                end_ms: 2000,
                emotions: emotions(&[("Tiredness", 0.7)]),
            },
        ]),
    );
    let dyn_provider: Arc<AudioProsodyProvider> = provider;
    let config = AnalysisConfig {
        top_emotions: 2,
        ..AnalysisConfig::default()
    };
    let adapter = AudioProsodyAdapter::new(dyn_provider, poller(), policy(), config);

    let pending = adapter.analyze("gs://audio/turn-3.wav", None).await.unwrap();
    let AnalysisResult::Audio(audio) = pending.await.unwrap() else {
        panic!("expected an audio result");
    };
    assert_eq!(audio.transcript, "I can't switch off even at night");
    assert_eq!(audio.utterances[0].top_emotions.len(), 2);
    assert_eq!(audio.utterances[0].top_emotions[0].name, "Anxiety");
}

#[tokio::test(start_paused = true)]
async fn failed_job_surfaces_provider_failure() {
    let provider = Arc::new(
        ScriptedJobProvider::<Vec<RawUtterance>>::new("audio", AdapterType::AudioProsody)
            .then_fail("unsupported codec"),
    );
    let dyn_provider: Arc<AudioProsodyProvider> = provider;
    let adapter =
        AudioProsodyAdapter::new(dyn_provider, poller(), policy(), AnalysisConfig::default());

    let err = adapter
        .analyze("s3://audio/a.wav", None)
        .await
        .unwrap()
        .await
        .unwrap_err();
    assert!(err.is_absorbable());
    assert!(err.to_string().contains("unsupported codec"));
}

fn text_model() -> MockLanguageModel {
    MockLanguageModel::new()
        .route("primary emotion", "frustration|0.85")
        .route("cognitive distortions", "All-or-Nothing|0.7, catastrophizing|0.6")
        .route("key themes", "work|0.9, sleep|0.5")
}

#[tokio::test]
async fn text_analysis_issues_three_calls() {
    let model = Arc::new(text_model());
    let dyn_model: Arc<dyn LanguageModel> = model.clone();
    let analyzer = TextAnalyzer::new(dyn_model, 4000);

    let analysis = analyzer
        .analyze("If I miss one deadline my whole career is over.")
        .await
        .unwrap();

    assert_eq!(analysis.primary_emotion.label, "frustration");
    let labels: Vec<&str> = analysis.distortions.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["all_or_nothing", "catastrophizing"]);
    assert_eq!(analysis.themes.len(), 2);
    assert_eq!(model.calls().await.len(), 3);
}

#[tokio::test]
async fn malformed_model_reply_fails_the_analysis() {
    let model = MockLanguageModel::new()
        .route("primary emotion", "frustration (very confident)")
        .route("cognitive distortions", "none")
        .route("key themes", "none");
    let analyzer = TextAnalyzer::new(Arc::new(model), 4000);

    assert!(matches!(
        analyzer.analyze("hello").await,
        Err(AttuneError::Validation(_))
    ));
}

#[tokio::test]
async fn long_text_is_truncated_before_the_model_sees_it() {
    let model = Arc::new(text_model());
    let dyn_model: Arc<dyn LanguageModel> = model.clone();
    let analyzer = TextAnalyzer::new(dyn_model, 10);

    analyzer.analyze(&"word ".repeat(100)).await.unwrap();
    for (_, user_text) in model.calls().await {
        assert!(user_text.chars().count() <= 10);
    }
}

#[tokio::test(start_paused = true)]
async fn dispatcher_routes_by_modality() {
    let video = Arc::new(
        ScriptedJobProvider::<Vec<RawFrame>>::new("video", AdapterType::VideoEmotion)
            .then_succeed(vec![]),
    );
    let audio = Arc::new(ScriptedJobProvider::<Vec<RawUtterance>>::new(
        "audio",
        AdapterType::AudioProsody,
    ));
    let speech = Arc::new(
        ScriptedJobProvider::new("speech", AdapterType::SpeechToText)
            .then_succeed("  I keep replaying the meeting  ".to_string()),
    );
    let providers = AnalysisProviders {
        video: video.clone(),
        audio: audio.clone(),
        speech,
        model: Arc::new(text_model()),
    };
    let dispatcher = AnalysisDispatcher::new(
        providers,
        poller(),
        &PollingConfig::default(),
        &AnalysisConfig::default(),
    );

    let text = dispatcher
        .dispatch(AnalysisRequest::Text("rough week".into()), None)
        .await
        .unwrap()
        .await
        .unwrap();
    assert_eq!(text.modality(), Modality::Text);

    let request = AnalysisRequest::media(Modality::Video, "s3://vlogs/a.mp4").unwrap();
    let result = dispatcher.dispatch(request, None).await.unwrap().await.unwrap();
    assert_eq!(result.modality(), Modality::Video);
    assert_eq!(video.starts(), 1);
    assert_eq!(audio.starts(), 0);

    let transcript = dispatcher
        .transcribe("s3://audio/turn.wav", None)
        .await
        .unwrap()
        .await
        .unwrap();
    assert_eq!(transcript, "I keep replaying the meeting");
}

#[test]
fn text_is_not_a_media_modality() {
    assert!(AnalysisRequest::media(Modality::Text, "s3://x/y").is_err());
}
