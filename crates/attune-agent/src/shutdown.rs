// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`]. Outstanding analysis jobs are given a grace period
//! to finish before polling stops.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::orchestrator::SessionOrchestrator;

const DRAIN_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                        _ = token_clone.cancelled() => return,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
                    tokio::select! {
                        _ = ctrl_c => info!("received Ctrl+C, initiating shutdown"),
                        _ = token_clone.cancelled() => return,
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => info!("received Ctrl+C, initiating shutdown"),
                _ = token_clone.cancelled() => return,
            }
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Waits up to `timeout` for outstanding analysis jobs, then shuts the
/// orchestrator down. Returns the number of jobs that were still running.
pub async fn drain(orchestrator: &SessionOrchestrator, timeout: Duration) -> usize {
    let active = orchestrator.poller().active_count();
    if active > 0 {
        info!(count = active, "waiting for analysis jobs to finish");
        let deadline = tokio::time::Instant::now() + timeout;
        while orchestrator.poller().active_count() > 0 && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(DRAIN_CHECK_INTERVAL).await;
        }
    }

    let remaining = orchestrator.poller().active_count();
    if remaining == 0 {
        info!("all analysis jobs drained");
    } else {
        warn!(remaining, "drain timeout reached, abandoning analysis jobs");
    }
    orchestrator.shutdown();
    remaining
}
