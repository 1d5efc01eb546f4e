// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./attune.toml` > `~/.config/attune/attune.toml` > `/etc/attune/attune.toml`
//! with environment variable overrides via `ATTUNE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AttuneConfig;

const SYSTEM_CONFIG_PATH: &str = "/etc/attune/attune.toml";
const LOCAL_CONFIG_PATH: &str = "attune.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/attune/attune.toml` (system-wide)
/// 3. `~/.config/attune/attune.toml` (user XDG config)
/// 4. `./attune.toml` (local directory)
/// 5. `ATTUNE_*` environment variables
pub fn load_config() -> Result<AttuneConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an in-memory TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<AttuneConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AttuneConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AttuneConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AttuneConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AttuneConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("attune/attune.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `ATTUNE_POLLING_VIDEO_MAX_ATTEMPTS` must map to
/// `polling.video.max_attempts`, not `polling.video.max.attempts`.
fn env_provider() -> Env {
    Env::prefixed("ATTUNE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env var name onto its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for nested in ["polling_video_", "polling_audio_", "polling_transcription_"] {
        if let Some(field) = key.strip_prefix(nested) {
            let table = nested.trim_end_matches('_').replacen('_', ".", 1);
            return format!("{table}.{field}");
        }
    }

    key.replacen("agent_", "agent.", 1)
        .replacen("polling_", "polling.", 1)
        .replacen("analysis_", "analysis.", 1)
        .replacen("retrieval_", "retrieval.", 1)
        .replacen("session_", "session.", 1)
}
