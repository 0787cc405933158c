//! Translation of relayed posts through an LLM.
//!
//! Talks to any OpenAI-compatible `/v1/chat/completions` endpoint: a local
//! [Ollama](https://ollama.com/) server by default, or a hosted provider
//! with `TRANSLATE_API_KEY` set.  Any failure surfaces as `Err`; the
//! pipeline then skips the translated delivery only.
//!
//! ```env
//! TRANSLATE_ENABLED=true
//! TRANSLATE_MODEL=qwen2.5:7b                  # default
//! TRANSLATE_ENDPOINT=http://127.0.0.1:11434   # default (Ollama)
//! TRANSLATE_TIMEOUT_MS=15000                  # default
//! TRANSLATE_FROM=Hebrew                       # default
//! TRANSLATE_TO=English                        # default
//! ```

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::pipeline::Translator;

// ─────────────────────────── Data types ──────────────────────────────────

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: String,
}

// ─────────────────────────── LlmTranslator ───────────────────────────────

pub struct LlmTranslator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    from_lang: String,
    to_lang: String,
    timeout: Duration,
}

impl LlmTranslator {
    /// Build from environment variables; `None` when `TRANSLATE_ENABLED`
    /// is not set to a truthy value.
    ///
    /// | Env var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `TRANSLATE_ENABLED`    | `false`                  |
    /// | `TRANSLATE_MODEL`      | `qwen2.5:7b`             |
    /// | `TRANSLATE_ENDPOINT`   | `http://127.0.0.1:11434` |
    /// | `TRANSLATE_API_KEY`    | —                        |
    /// | `TRANSLATE_TIMEOUT_MS` | `15000`                  |
    /// | `TRANSLATE_FROM`       | `Hebrew`                 |
    /// | `TRANSLATE_TO`         | `English`                |
    pub fn from_env() -> Option<Self> {
        let enabled = std::env::var("TRANSLATE_ENABLED")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if !enabled {
            return None;
        }

        let timeout_ms: u64 = std::env::var("TRANSLATE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15_000);

        Some(Self {
            client: Client::new(),
            endpoint: std::env::var("TRANSLATE_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:11434".into()),
            model: std::env::var("TRANSLATE_MODEL").unwrap_or_else(|_| "qwen2.5:7b".into()),
            api_key: std::env::var("TRANSLATE_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            from_lang: std::env::var("TRANSLATE_FROM").unwrap_or_else(|_| "Hebrew".into()),
            to_lang: std::env::var("TRANSLATE_TO").unwrap_or_else(|_| "English".into()),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    fn system_prompt(&self) -> String {
        format!(
            "Translate the following text from {} to {}. \
             Only output the translation, no explanation. \
             Keep emoji, line breaks and markdown markers (**, *, _, [label](url)) exactly where they are.",
            self.from_lang, self.to_lang
        )
    }
}

impl Translator for LlmTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Text: {text}"),
                },
            ],
            temperature: 0.0,
        };

        let url = format!("{}/v1/chat/completions", self.endpoint);
        let mut req = self.client.post(&url).timeout(self.timeout).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.context("translation request failed")?;
        if !response.status().is_success() {
            let status = response.status();
            let raw = response.text().await.unwrap_or_default();
            return Err(anyhow!("translation endpoint returned {status}: {raw}"));
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("translation response parse failed")?;
        debug!("Translation response {:?}", body);

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("translation endpoint returned no choices"))?;

        Ok(content.trim().to_owned())
    }
}

impl std::fmt::Display for LlmTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LlmTranslator(model={}, endpoint={}, {}→{}, auth={}, timeout={}ms)",
            self.model,
            self.endpoint,
            self.from_lang,
            self.to_lang,
            self.api_key.is_some(),
            self.timeout.as_millis(),
        )
    }
}
