// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the ranges and formats serde cannot express. All failures are
//! collected rather than stopping at the first one.

use crate::diagnostic::ConfigError;
use crate::model::{AttuneConfig, JobPolicyConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &AttuneConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.name.trim().is_empty() {
        errors.push(ConfigError::validation("agent.name", "must not be empty"));
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(
            "agent.log_level",
            format!(
                "`{}` is not one of {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.polling.scheduler_workers < 1 {
        errors.push(ConfigError::validation(
            "polling.scheduler_workers",
            "must be at least 1",
        ));
    }

    for (name, policy) in [
        ("video", &config.polling.video),
        ("audio", &config.polling.audio),
        ("transcription", &config.polling.transcription),
    ] {
        validate_job_policy(name, policy, &mut errors);
    }

    if config.analysis.top_emotions < 1 {
        errors.push(ConfigError::validation(
            "analysis.top_emotions",
            "must be at least 1",
        ));
    }

    if config.analysis.allowed_schemes.is_empty() {
        errors.push(ConfigError::validation(
            "analysis.allowed_schemes",
            "must list at least one scheme",
        ));
    }
    for scheme in &config.analysis.allowed_schemes {
        let name = scheme.strip_suffix("://").unwrap_or_default();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
            errors.push(ConfigError::validation(
                "analysis.allowed_schemes",
                format!("`{scheme}` must look like `name://`"),
            ));
        }
    }

    if config.analysis.max_text_chars < 1 {
        errors.push(ConfigError::validation(
            "analysis.max_text_chars",
            "must be at least 1",
        ));
    }

    let threshold = config.retrieval.similarity_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        errors.push(ConfigError::validation(
            "retrieval.similarity_threshold",
            format!("must be between 0.0 and 1.0, got {threshold}"),
        ));
    }

    if config.retrieval.max_results < 1 {
        errors.push(ConfigError::validation(
            "retrieval.max_results",
            "must be at least 1",
        ));
    }

    if config.retrieval.embedding_dimensions < 8 {
        errors.push(ConfigError::validation(
            "retrieval.embedding_dimensions",
            format!(
                "must be at least 8, got {}",
                config.retrieval.embedding_dimensions
            ),
        ));
    }

    if config.session.max_sessions < 1 {
        errors.push(ConfigError::validation(
            "session.max_sessions",
            "must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_job_policy(name: &str, policy: &JobPolicyConfig, errors: &mut Vec<ConfigError>) {
    if policy.max_attempts < 1 {
        errors.push(ConfigError::validation(
            &format!("polling.{name}.max_attempts"),
            "must be at least 1",
        ));
    }
    if policy.poll_interval_ms < 1 {
        errors.push(ConfigError::validation(
            &format!("polling.{name}.poll_interval_ms"),
            "must be at least 1",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(errors: &[ConfigError]) -> Vec<String> {
        errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::Validation { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&AttuneConfig::default()).is_ok());
    }

    #[test]
    fn threshold_outside_unit_interval_fails() {
        let mut config = AttuneConfig::default();
        config.retrieval.similarity_threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["retrieval.similarity_threshold"]);
    }

    #[test]
    fn zero_attempts_names_the_provider() {
        let mut config = AttuneConfig::default();
        config.polling.audio.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["polling.audio.max_attempts"]);
    }

    #[test]
    fn collects_every_failure() {
        let mut config = AttuneConfig::default();
        config.polling.scheduler_workers = 0;
        config.analysis.top_emotions = 0;
        config.agent.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn malformed_scheme_fails() {
        let mut config = AttuneConfig::default();
        config.analysis.allowed_schemes = vec!["s3".to_string(), "https://".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["analysis.allowed_schemes"]);
    }
}
