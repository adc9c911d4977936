//! Online assistant backed by an OpenAI-compatible chat-completions API.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::compress::{reduce_prompt, CompressionProfile};
use crate::config::AssistantConfig;
use crate::ledger::Ledger;

/// Glyph keywords and the context line appended when a prompt mentions them.
/// Checked in order; only the first match is used.
pub const GLYPH_CONTEXT: [(&str, &str); 4] = [
    ("evolve", "Trigger symbolic transformation."),
    ("transform", "Reshape internal symbolic form."),
    ("reveal", "Lift veils, expose hidden truth."),
    ("stabilize", "Anchor structures, harmonize flow."),
];

/// Append `[context: …]` for the first glyph keyword found in `prompt`.
pub fn augment_prompt(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    match GLYPH_CONTEXT.iter().find(|(key, _)| lower.contains(key)) {
        Some((_, context)) => format!("{prompt}\n[context: {context}]"),
        None => prompt.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct LlmClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f64,
    /// Character cap for token-guard compression; `None` sends prompts as-is.
    token_guard: Option<usize>,
}

impl LlmClient {
    /// Build a client from config. `pro` selects the larger model.
    ///
    /// Fails when no API key is configured.
    pub fn new(config: &AssistantConfig, pro: bool, max_prompt_chars: usize) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .context("missing OPENAI_API_KEY (set it in the environment or [assistant] api_key)")?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: if pro { config.pro_model.clone() } else { config.model.clone() },
            temperature: config.temperature,
            token_guard: config.token_guard.then_some(max_prompt_chars),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The prompt actually sent: glyph context added, then compressed when
    /// the token guard is on.
    pub fn prepare_prompt(&self, prompt: &str) -> String {
        let augmented = augment_prompt(prompt);
        match self.token_guard {
            Some(max) => reduce_prompt(&augmented, CompressionProfile::Plain, max).text,
            None => augmented,
        }
    }

    /// Send a single user message and return the assistant's reply.
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.temperature,
        };

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("LLM API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error ({}): {}", status, body_text);
        }

        let response: ChatResponse = resp.json().await.context("Failed to parse LLM API response")?;
        extract_reply(response)
    }

    /// Prepare, send, and record the exchange in the ritual log.
    pub async fn ask(&self, prompt: &str, ledger: &Ledger) -> Result<String> {
        let prepared = self.prepare_prompt(prompt);
        tracing::debug!(model = %self.model, chars = prepared.chars().count(), "sending prompt");
        let reply = self.chat(&prepared).await?;
        ledger
            .log_ritual_event("online", &prepared, &reply)
            .context("failed to record assistant reply")?;
        Ok(reply)
    }
}

fn extract_reply(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .context("LLM API response has no choices")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(key: Option<&str>) -> AssistantConfig {
        AssistantConfig {
            api_key: key.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn augment_uses_first_keyword_only() {
        assert_eq!(
            augment_prompt("Reveal and EVOLVE"),
            "Reveal and EVOLVE\n[context: Trigger symbolic transformation.]"
        );
        assert_eq!(augment_prompt("hello"), "hello");
    }

    #[test]
    fn missing_key_is_an_error() {
        assert!(LlmClient::new(&config(None), false, 1024).is_err());
        assert!(LlmClient::new(&config(Some("")), false, 1024).is_err());
    }

    #[test]
    fn pro_selects_larger_model() {
        let cfg = config(Some("sk-test"));
        assert_eq!(LlmClient::new(&cfg, false, 1024).unwrap().model(), "gpt-3.5-turbo");
        assert_eq!(LlmClient::new(&cfg, true, 1024).unwrap().model(), "gpt-4o");
    }

    #[test]
    fn token_guard_compresses_prepared_prompt() {
        let client = LlmClient::new(&config(Some("sk-test")), false, 1024).unwrap();
        assert_eq!(
            client.prepare_prompt("Could you   stabilize it"),
            "stabilize it [context: Anchor structures, harmonize flow.]"
        );

        let raw = AssistantConfig {
            token_guard: false,
            ..config(Some("sk-test"))
        };
        let client = LlmClient::new(&raw, false, 1024).unwrap();
        assert!(client.prepare_prompt("Could you help").starts_with("Could you"));
    }

    #[test]
    fn reply_is_extracted_and_trimmed() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  hi  "}}]
        }))
        .unwrap();
        assert_eq!(extract_reply(response).unwrap(), "hi");

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(extract_reply(empty).is_err());
        assert!(serde_json::from_value::<ChatResponse>(json!({"choices": [{"message": {}}]})).is_err());
    }

    #[test]
    fn request_serializes_openai_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.7,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hello"}],
                "temperature": 0.7,
            })
        );
    }
}
