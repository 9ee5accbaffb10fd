// src/synth/client.rs
//! Generation service client: provider abstraction over an OpenAI-compatible
//! chat completion endpoint, plus a deterministic mock for tests and local
//! runs (`MOLTSTREET_TEST_MODE=mock`).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_API_KEY: &str = "MOLTSTREET_API_KEY";
pub const ENV_TEST_MODE: &str = "MOLTSTREET_TEST_MODE";
pub const ENV_MODEL: &str = "MOLTSTREET_MODEL";
pub const ENV_API_URL: &str = "MOLTSTREET_API_URL";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// One opaque completion call. Errors here are treated as transient by
    /// the orchestrator (the item is retried next run).
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub type DynGenerationClient = Arc<dyn GenerationClient>;

/// Factory: mock when `MOLTSTREET_TEST_MODE=mock`, otherwise the real chat
/// provider (which requires the API key env var).
pub fn build_client() -> Result<DynGenerationClient> {
    if std::env::var(ENV_TEST_MODE).map(|v| v == "mock").unwrap_or(false) {
        return Ok(Arc::new(MockClient::canned()));
    }
    Ok(Arc::new(ChatClient::from_env()?))
}

pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl ChatClient {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(ENV_API_KEY)
            .ok()
            .filter(|k| !k.is_empty());
        let Some(api_key) = api_key else {
            bail!("{ENV_API_KEY} is not set; the generation stage needs it");
        };
        let http = reqwest::Client::builder()
            .user_agent("moltstreet-pipeline/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .context("building http client")?;
        Ok(Self {
            http,
            api_key,
            model: std::env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            endpoint: std::env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        })
    }
}

#[async_trait]
impl GenerationClient for ChatClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg { role: "system", content: system },
                Msg { role: "user", content: prompt },
            ],
            temperature: 0.3,
            max_tokens: 1200,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("generation request failed")?;
        let status = resp.status();
        if !status.is_success() {
            bail!("generation service returned {status}");
        }
        let body: Resp = resp.json().await.context("decoding generation response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            bail!("generation service returned an empty completion");
        }
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "chat"
    }
}

/// Returns a fixed response regardless of input.
#[derive(Clone)]
pub struct MockClient {
    pub response: String,
}

impl MockClient {
    pub fn with_response(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }

    /// A minimal valid article document, enough to drive the pipeline
    /// end-to-end without a network.
    pub fn canned() -> Self {
        Self::with_response(
            "---\n\
             title: Mock Market Briefing\n\
             date: 2026-01-01T00:00:00Z\n\
             category: markets\n\
             reporter: AI Desk\n\
             summary: Deterministic mock output.\n\
             tags: [mock]\n\
             sources:\n\
             \x20 - url: https://example.com/mock\n\
             \x20   title: Mock source\n\
             \x20   feed: Mock\n\
             ---\n\n\
             Mock article body.\n",
        )
    }
}

#[async_trait]
impl GenerationClient for MockClient {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn build_client_honors_mock_test_mode() {
        std::env::set_var(ENV_TEST_MODE, "mock");
        let client = build_client().unwrap();
        assert_eq!(client.provider_name(), "mock");
        std::env::remove_var(ENV_TEST_MODE);
    }

    #[serial_test::serial]
    #[test]
    fn chat_client_requires_api_key() {
        std::env::remove_var(ENV_TEST_MODE);
        std::env::remove_var(ENV_API_KEY);
        assert!(ChatClient::from_env().is_err());
    }
}
