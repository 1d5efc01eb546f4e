// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `attune simulate`: runs a burnout check-in and one conversation turn
//! against in-process providers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Args;
use dashmap::DashMap;
use tracing::info;

use attune_agent::{burnout_assessment, shutdown, SessionOrchestrator};
use attune_analysis::AnalysisProviders;
use attune_config::AttuneConfig;
use attune_core::analysis::{EmotionScore, RawFace, RawFrame, RawUtterance};
use attune_core::error::AttuneError;
use attune_core::traits::{JobProvider, LanguageModel, PluginAdapter};
use attune_core::types::{
    AdapterType, JobStatusReport, Modality, ResourceLocator, UnitId, UserId,
};
use attune_memory::{HashingEmbedder, InMemoryVectorStore};
use attune_session::UnitSpec;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// User the simulated sessions belong to.
    #[arg(long, default_value = "demo-user")]
    pub user: String,

    /// Override every provider's poll interval.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Status checks the video job stays in progress for.
    #[arg(long, default_value_t = 2)]
    pub video_polls: u32,

    /// Make the video job fail instead of succeeding.
    #[arg(long)]
    pub fail_video: bool,
}

/// Job provider that finishes every job after a fixed number of status checks.
struct SimulatedJobs<P> {
    name: &'static str,
    adapter_type: AdapterType,
    pending_polls: u32,
    outcome: Result<P, String>,
    polls: DashMap<String, u32>,
}

impl<P: Clone + Send + Sync + 'static> SimulatedJobs<P> {
    fn new(
        name: &'static str,
        adapter_type: AdapterType,
        pending_polls: u32,
        outcome: Result<P, String>,
    ) -> Self {
        Self {
            name,
            adapter_type,
            pending_polls,
            outcome,
            polls: DashMap::new(),
        }
    }
}

#[async_trait]
impl<P: Clone + Send + Sync + 'static> PluginAdapter for SimulatedJobs<P> {
    fn name(&self) -> &str {
        self.name
    }

    fn adapter_type(&self) -> AdapterType {
        self.adapter_type
    }
}

#[async_trait]
impl<P: Clone + Send + Sync + 'static> JobProvider for SimulatedJobs<P> {
    type Payload = P;

    async fn start_job(&self, locator: &ResourceLocator) -> Result<String, AttuneError> {
        let job_id = format!("{}-{}", self.name, uuid::Uuid::new_v4());
        self.polls.insert(job_id.clone(), 0);
        info!(provider = self.name, %locator, %job_id, "simulated job started");
        Ok(job_id)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusReport<P>, AttuneError> {
        let polls = {
            let mut entry = self
                .polls
                .get_mut(job_id)
                .ok_or_else(|| AttuneError::provider(format!("unknown job {job_id}")))?;
            *entry += 1;
            *entry
        };
        if polls <= self.pending_polls {
            return Ok(JobStatusReport::in_progress());
        }
        self.polls.remove(job_id);
        Ok(match &self.outcome {
            Ok(payload) => JobStatusReport::succeeded(payload.clone()),
            Err(message) => JobStatusReport::failed(message.clone()),
        })
    }
}

/// Language model with fixed replies chosen by instruction keyword.
struct CannedModel;

#[async_trait]
impl PluginAdapter for CannedModel {
    fn name(&self) -> &str {
        "canned-model"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LanguageModel
    }
}

#[async_trait]
impl LanguageModel for CannedModel {
    async fn complete(&self, system: &str, user_text: &str) -> Result<String, AttuneError> {
        let system = system.to_lowercase();
        let reply = if system.contains("primary emotion") {
            "tiredness|0.72".to_string()
        } else if system.contains("cognitive distortions") {
            "overgeneralization|0.64".to_string()
        } else if system.contains("key themes") {
            "workload|0.81, sleep|0.55".to_string()
        } else if system.contains("summary") {
            let score = user_text
                .lines()
                .skip_while(|l| !l.starts_with("## Score"))
                .nth(1)
                .unwrap_or("an unknown score");
            format!(
                "You scored {score} on this check-in. Your reflection suggests tiredness; \
                 try to protect one evening this week for rest."
            )
        } else {
            "It sounds like this week has worn you down. One rough week does not mean \
             every week will feel this way. What is one small thing that helped before?"
                .to_string()
        };
        Ok(reply)
    }
}

fn reflection_frames() -> Vec<RawFrame> {
    let face = |tired: f64, calm: f64| RawFace {
        confidence: 0.97,
        emotions: vec![
            EmotionScore::new("Tiredness", tired),
            EmotionScore::new("Calmness", calm),
            EmotionScore::new("Concentration", 0.3),
            EmotionScore::new("Joy", 0.1),
        ],
    };
    vec![
        RawFrame {
            timestamp_ms: 0,
            faces: vec![face(0.7, 0.4)],
        },
        RawFrame {
            timestamp_ms: 1000,
            faces: vec![face(0.8, 0.2)],
        },
    ]
}

fn providers(args: &SimulateArgs) -> AnalysisProviders {
    let video_outcome = if args.fail_video {
        Err("simulated failure: no face detected".to_string())
    } else {
        Ok(reflection_frames())
    };
    AnalysisProviders {
        video: Arc::new(SimulatedJobs::new(
            "video",
            AdapterType::VideoEmotion,
            args.video_polls,
            video_outcome,
        )),
        audio: Arc::new(SimulatedJobs::<Vec<RawUtterance>>::new(
            "audio",
            AdapterType::AudioProsody,
            1,
            Ok(Vec::new()),
        )),
        speech: Arc::new(SimulatedJobs::new(
            "speech",
            AdapterType::SpeechToText,
            1,
            Ok(String::new()),
        )),
        model: Arc::new(CannedModel),
    }
}

pub async fn run(mut config: AttuneConfig, args: SimulateArgs) -> Result<(), AttuneError> {
    if let Some(ms) = args.poll_interval_ms {
        for policy in [
            &mut config.polling.video,
            &mut config.polling.audio,
            &mut config.polling.transcription,
        ] {
            policy.poll_interval_ms = ms.max(1);
        }
    }

    let embedder = Arc::new(HashingEmbedder::new(
        config.retrieval.embedding_dimensions,
    ));
    let similarity = Arc::new(InMemoryVectorStore::new(embedder));
    let orchestrator = SessionOrchestrator::new(&config, providers(&args), similarity);
    orchestrator.seed_interventions().await?;

    let user = UserId::from(args.user.as_str());
    let session_id = orchestrator
        .start_session(user.clone(), burnout_assessment())
        .await?;
    println!("session {session_id} started");

    for (unit, answer) in [("exhaustion", "4"), ("detachment", "often"), ("efficacy", "3")] {
        orchestrator
            .submit_text(&session_id, &UnitId::from(unit), answer)
            .await?;
        println!("  {unit}: {answer}");
    }
    let reflection = UnitId::from("reflection");
    orchestrator
        .submit_text(&session_id, &reflection, "Recorded a short video about my week.")
        .await?;
    orchestrator
        .submit_media(
            &session_id,
            &reflection,
            Modality::Video,
            "file://simulated/reflection.mp4",
        )
        .await?;
    println!(
        "  reflection: video analysis submitted (complete: {})",
        orchestrator.is_complete(&session_id).await?
    );

    let cancel = shutdown::install_signal_handler();
    let summary = tokio::select! {
        summary = orchestrator.wait_for_completion(&session_id) => summary?,
        _ = cancel.cancelled() => {
            shutdown::drain(&orchestrator, Duration::from_secs(5)).await;
            return Err(AttuneError::Internal("simulation interrupted".into()));
        }
    };
    println!();
    println!("score: {} of {} ({})", summary.score, summary.max_score, summary.level);
    println!("summary: {}", summary.summary);

    let turn_session = orchestrator
        .start_session(user, vec![UnitSpec::open_text("check-in", "How are you today?")])
        .await?;
    let message = "Work was exhausting again and I always end up behind.";
    let turn = orchestrator.respond(&turn_session, message).await?;
    println!();
    println!("you: {message}");
    println!("coach: {}", turn.reply);
    for intervention in &turn.interventions {
        println!("  suggestion: {intervention}");
    }

    cancel.cancel();
    shutdown::drain(&orchestrator, Duration::from_secs(5)).await;
    Ok(())
}
