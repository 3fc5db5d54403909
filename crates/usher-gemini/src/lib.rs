// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat completions against the hosted Gemini REST API.
//!
//! System messages are concatenated into a single instruction preamble;
//! user and assistant turns become alternating `user`/`model` contents.
//! Buffered calls degrade to user-presentable strings on any failure;
//! streaming calls surface errors so the orchestrator can apply its
//! fallback without caching a broken reply. A missing API key is a
//! configuration gap the caller hears about in plain words, not a panic.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use usher_core::{ChatMessage, ChatRole, GenerationProvider, TextStream, UsherError};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Shown when no API key is configured.
const UNCONFIGURED_REPLY: &str =
    "Gemini is not configured. Please set the Gemini API key and restart.";
/// Shown when a buffered call fails for any other reason.
const ERROR_REPLY: &str = "I encountered an error with Gemini. Please try again.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Chat backend for the hosted Gemini API.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: Option<String>,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, UsherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UsherError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            api_key,
            model,
            temperature,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn request(&self, messages: &[ChatMessage], max_tokens: u32) -> GenerateRequest {
        let mut preamble = String::new();
        let mut contents = Vec::new();
        for message in messages {
            match message.role {
                ChatRole::System => {
                    if !preamble.is_empty() {
                        preamble.push('\n');
                    }
                    preamble.push_str(&message.content);
                }
                ChatRole::User => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                }),
                ChatRole::Assistant => contents.push(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                }),
            }
        }
        let system_instruction = (!preamble.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part { text: preamble }],
        });
        GenerateRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: max_tokens,
            },
        }
    }

    fn endpoint(&self, verb: &str, key: &str, sse: bool) -> String {
        let alt = if sse { "&alt=sse" } else { "" };
        format!(
            "{}/models/{}:{verb}?key={key}{alt}",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, UsherError> {
        let Some(key) = self.api_key.as_deref() else {
            warn!("gemini called without an API key");
            return Ok(UNCONFIGURED_REPLY.to_string());
        };

        let response = self
            .client
            .post(self.endpoint("generateContent", key, false))
            .json(&self.request(messages, max_tokens))
            .send()
            .await;
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "gemini request failed");
                return Ok(ERROR_REPLY.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "gemini returned an error status");
            return Ok(ERROR_REPLY.to_string());
        }

        match response.json::<GenerateResponse>().await {
            Ok(parsed) => Ok(parsed.text().trim().to_string()),
            Err(e) => {
                warn!(error = %e, "gemini response unparseable");
                Ok(ERROR_REPLY.to_string())
            }
        }
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<TextStream, UsherError> {
        let Some(key) = self.api_key.as_deref() else {
            // One-shot stream so the caller still has something to say.
            let once: TextStream =
                Box::pin(futures::stream::iter(vec![Ok(UNCONFIGURED_REPLY.to_string())]));
            return Ok(once);
        };

        let response = self
            .client
            .post(self.endpoint("streamGenerateContent", key, true))
            .json(&self.request(messages, max_tokens))
            .send()
            .await
            .map_err(|e| UsherError::Provider {
                message: format!("gemini stream request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UsherError::Provider {
                message: format!("gemini returned {status}: {body}"),
                source: None,
            });
        }
        debug!("gemini stream open");

        Ok(parse_sse_stream(response))
    }
}

/// Parses a streamed `:streamGenerateContent?alt=sse` response into text
/// fragments. Events whose data does not parse are skipped.
fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<String, UsherError>> + Send>> {
    let events = response.bytes_stream().eventsource();
    let fragments = events.filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::from_str::<GenerateResponse>(&event.data) {
                Ok(parsed) => {
                    let text = parsed.text();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => {
                    warn!(error = %e, "skipping unparseable gemini stream event");
                    None
                }
            },
            Err(e) => Some(Err(UsherError::Provider {
                message: format!("gemini SSE stream error: {e}"),
                source: None,
            })),
        }
    });
    Box::pin(fragments)
}
