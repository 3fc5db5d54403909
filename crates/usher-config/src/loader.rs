// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./usher.toml` > `~/.config/usher/usher.toml` >
//! `/etc/usher/usher.toml` with environment variable overrides via the
//! `USHER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::UsherConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/usher/usher.toml` (system-wide)
/// 3. `~/.config/usher/usher.toml` (user XDG config)
/// 4. `./usher.toml` (local directory)
/// 5. `USHER_*` environment variables
pub fn load_config() -> Result<UsherConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UsherConfig::default()))
        .merge(Toml::file("/etc/usher/usher.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("usher/usher.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("usher.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<UsherConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UsherConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<UsherConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UsherConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `USHER_GEMINI_API_KEY` must map to
/// `gemini.api_key`, not `gemini.api.key`.
fn env_provider() -> Env {
    Env::prefixed("USHER_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("server_", "server.", 1)
            .replacen("provider_", "provider.", 1)
            .replacen("ollama_", "ollama.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("search_", "search.", 1)
            .replacen("context_", "context.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("embedding_", "embedding.", 1);
        mapped.into()
    })
}
