// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as value ranges and known backend names.

use crate::diagnostic::ConfigError;
use crate::model::UsherConfig;

/// Backends the binary knows how to construct.
const KNOWN_BACKENDS: &[&str] = &["ollama", "gemini"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &UsherConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !KNOWN_BACKENDS.contains(&config.provider.backend.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "provider.backend `{}` is not recognized (expected one of: {})",
                config.provider.backend,
                KNOWN_BACKENDS.join(", ")
            ),
        });
    }

    if config.server.bind_address.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    }

    if config.server.catalog_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.catalog_path must not be empty".to_string(),
        });
    }

    if config.search.top_k == 0 {
        errors.push(ConfigError::Validation {
            message: "search.top_k must be at least 1".to_string(),
        });
    }

    let threshold = config.search.relevance_threshold;
    if !(0.0..1.0).contains(&threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "search.relevance_threshold must be in [0.0, 1.0), got {threshold}"
            ),
        });
    }

    if config.context.history_turns == 0 {
        errors.push(ConfigError::Validation {
            message: "context.history_turns must be at least 1".to_string(),
        });
    }

    if config.context.mentioned_events == 0 {
        errors.push(ConfigError::Validation {
            message: "context.mentioned_events must be at least 1".to_string(),
        });
    }

    if config.provider.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.provider.backend == "gemini"
        && config
            .gemini
            .api_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
    {
        errors.push(ConfigError::Validation {
            message: "gemini.api_key is set but empty; unset it or provide a key".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = UsherConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_backend_fails_validation() {
        let mut config = UsherConfig::default();
        config.provider.backend = "gpt4all".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("backend"))
        ));
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let mut config = UsherConfig::default();
        config.search.relevance_threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("relevance_threshold"))
        ));
    }

    #[test]
    fn zero_bounds_fail_validation() {
        let mut config = UsherConfig::default();
        config.search.top_k = 0;
        config.context.history_turns = 0;
        config.context.mentioned_events = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn empty_gemini_key_fails_when_selected() {
        let mut config = UsherConfig::default();
        config.provider.backend = "gemini".to_string();
        config.gemini.api_key = Some("".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("api_key"))
        ));
    }

    #[test]
    fn absent_gemini_key_is_allowed() {
        // The backend degrades to a configuration notice at runtime; startup
        // does not hard-fail on a missing key.
        let mut config = UsherConfig::default();
        config.provider.backend = "gemini".to_string();
        config.gemini.api_key = None;
        assert!(validate_config(&config).is_ok());
    }
}
