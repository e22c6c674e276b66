//! OpenAI-compatible provider: chat completions (one-shot and SSE streaming)
//! plus embeddings over raw reqwest.

use super::TextProvider;
use crate::memory::EMBED_INPUT_MAX;
use crate::shared::{BoxError, MindConfig};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Optional override for OpenAI-compatible gateways (e.g. a local proxy).
const ENV_BASE_URL: &str = "MIND_LLM_BASE_URL";

const TEMPERATURE: f64 = 0.4;

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    embed_model: String,
}

impl OpenAiProvider {
    /// Builds the provider with a bounded per-request timeout so a hung
    /// upstream can never wedge the cognition loop.
    pub fn new(api_key: String, config: &MindConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = std::env::var(ENV_BASE_URL)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            client,
            api_key,
            base_url,
            model: config.model.clone(),
            embed_model: config.embed_model.clone(),
        })
    }

    fn chat_body(&self, system: &str, user: &str, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": TEMPERATURE,
            "stream": stream,
        })
    }
}

#[async_trait::async_trait]
impl TextProvider for OpenAiProvider {
    fn is_live(&self) -> bool {
        true
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, BoxError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.chat_body(system, user, false))
            .send()
            .await?
            .error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        let text = body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(text)
    }

    async fn stream_complete(
        &self,
        system: &str,
        user: &str,
    ) -> Result<mpsc::Receiver<String>, BoxError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.chat_body(system, user, true))
            .send()
            .await?
            .error_for_status()?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();
            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!(target: "mind::provider", error = %e, "token stream aborted");
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                // SSE frames are newline-delimited `data: {...}` lines.
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);
                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }
                    let Ok(frame) = serde_json::from_str::<serde_json::Value>(data) else {
                        continue;
                    };
                    if let Some(token) = frame
                        .pointer("/choices/0/delta/content")
                        .and_then(|t| t.as_str())
                    {
                        if !token.is_empty() && tx.send(token.to_string()).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });
        Ok(rx)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, BoxError> {
        let input: String = text.chars().take(EMBED_INPUT_MAX).collect();
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "model": self.embed_model, "input": input }))
            .send()
            .await?
            .error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        let vector: Vec<f32> = body
            .pointer("/data/0/embedding")
            .and_then(|v| v.as_array())
            .ok_or("embedding response missing data")?
            .iter()
            .filter_map(|x| x.as_f64())
            .map(|x| x as f32)
            .collect();
        if vector.is_empty() {
            return Err("embedding response was empty".into());
        }
        Ok(vector)
    }
}
