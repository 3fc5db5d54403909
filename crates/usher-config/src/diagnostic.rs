// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error diagnostics rendered via miette.

#![allow(clippy::result_large_err)]

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error suitable for terminal rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The TOML/env layer could not be deserialized into the config model.
    #[error("could not load configuration: {message}")]
    #[diagnostic(
        code(usher::config::load),
        help("check usher.toml against the documented sections; unknown keys are rejected")
    )]
    Load {
        /// Figment's description of the failure.
        message: String,
    },

    /// A deserialized value failed a semantic constraint.
    #[error("validation error: {message}")]
    #[diagnostic(code(usher::config::validation))]
    Validation {
        /// What constraint was violated.
        message: String,
    },
}

/// Converts a Figment error (which may aggregate several failures) into
/// one [`ConfigError::Load`] per underlying failure.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Load {
            message: e.to_string(),
        })
        .collect()
}

/// Renders configuration errors to stderr using miette's report formatting.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        let report = miette::Report::msg(format!("{error}"));
        eprintln!("{report:?}");
        if let Some(help) = error.help() {
            eprintln!("  help: {help}");
        }
    }
    eprintln!(
        "usher: {} configuration error{} -- aborting",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
}
