// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat completions against a local Ollama server.
//!
//! Buffered calls never fail outward: timeouts, refused connections, and
//! bad statuses all map to fixed user-presentable apology strings, because
//! a caller mid-conversation is better served by "try again" than by an
//! error code. Streaming calls do return errors; the orchestrator owns the
//! fallback there so a broken stream is never cached as a reply.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use usher_core::{ChatMessage, GenerationProvider, TextStream, UsherError};

/// Shown when the server answers with a non-success status or garbage.
const TROUBLE_REPLY: &str = "I'm having trouble thinking right now. Could you try again?";
/// Shown when the request times out.
const TIMEOUT_REPLY: &str = "Sorry, I'm taking too long to respond. Please try again.";
/// Shown when the server is unreachable.
const CONNECT_REPLY: &str =
    "I can't connect to my brain right now. Please check if Ollama is running.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// One NDJSON line of a streamed response.
#[derive(Deserialize)]
struct StreamLine {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
}

/// Chat backend for a local Ollama server.
pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaProvider {
    /// `url` is the full chat endpoint, e.g. `http://localhost:11434/api/chat`.
    pub fn new(
        url: String,
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
            url,
            model,
            temperature,
        })
    }

    fn request<'a>(&'a self, messages: &'a [ChatMessage], max_tokens: u32, stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            stream,
            options: ChatOptions {
                temperature: self.temperature,
                num_predict: max_tokens,
            },
        }
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, UsherError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.request(messages, max_tokens, false))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!("ollama request timed out");
                return Ok(TIMEOUT_REPLY.to_string());
            }
            Err(e) if e.is_connect() => {
                warn!(error = %e, "cannot connect to ollama");
                return Ok(CONNECT_REPLY.to_string());
            }
            Err(e) => {
                warn!(error = %e, "ollama request failed");
                return Ok(TROUBLE_REPLY.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "ollama returned an error status");
            return Ok(TROUBLE_REPLY.to_string());
        }

        match response.json::<ChatResponse>().await {
            Ok(parsed) => Ok(parsed.message.content.trim().to_string()),
            Err(e) => {
                warn!(error = %e, "ollama response unparseable");
                Ok(TROUBLE_REPLY.to_string())
            }
        }
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<TextStream, UsherError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.request(messages, max_tokens, true))
            .send()
            .await
            .map_err(|e| UsherError::Provider {
                message: format!("ollama stream request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UsherError::Provider {
                message: format!("ollama returned {status}: {body}"),
                source: None,
            });
        }
        debug!("ollama stream open");

        // Reassemble NDJSON lines from arbitrary byte chunk boundaries.
        let lines = response
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|e| UsherError::Provider {
                    message: format!("ollama stream read failed: {e}"),
                    source: Some(Box::new(e)),
                })
            })
            .scan(String::new(), |buffer, chunk| {
                let out: Vec<Result<String, UsherError>> = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        let mut complete = Vec::new();
                        while let Some(pos) = buffer.find('\n') {
                            let line: String = buffer.drain(..=pos).collect();
                            let line = line.trim();
                            if !line.is_empty() {
                                complete.push(Ok(line.to_string()));
                            }
                        }
                        complete
                    }
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(out))
            })
            .flat_map(futures::stream::iter);

        enum Item {
            Text(String),
            Done,
            Skip,
        }

        // Malformed or partial lines are skipped, not surfaced; `done: true`
        // ends the stream regardless of what follows.
        let fragments = lines
            .map(|line| {
                let line = line?;
                Ok(match serde_json::from_str::<StreamLine>(&line) {
                    Ok(parsed) if parsed.done => Item::Done,
                    Ok(parsed) => match parsed.message {
                        Some(message) if !message.content.is_empty() => {
                            Item::Text(message.content)
                        }
                        _ => Item::Skip,
                    },
                    Err(_) => Item::Skip,
                })
            })
            .take_while(|item| futures::future::ready(!matches!(item, Ok(Item::Done))))
            .filter_map(|item| {
                futures::future::ready(match item {
                    Ok(Item::Text(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(Box::pin(fragments))
    }
}
