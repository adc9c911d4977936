//! Interactive online sessions.
//!
//! Every exchange is appended to `interaction_log.jsonl`. Every fifth exchange
//! of a session records an assistant evolution in `evolution_history.jsonl`,
//! and once the log holds ten exchanges each further turn is followed by a
//! reflection over the latest ten.

use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::llm::{augment_prompt, LlmClient};
use crate::error::AlchemyResult;
use crate::ledger::Ledger;

pub const INTERACTION_LOG_FILE: &str = "interaction_log.jsonl";
pub const EVOLUTION_LOG_FILE: &str = "evolution_history.jsonl";

/// Exchanges between two evolution entries.
pub const EVOLVE_EVERY: usize = 5;
/// Size of the window summarised by a reflection.
pub const REFLECTION_WINDOW: usize = 10;

const EVOLUTION_VERSION: &str = "1.0.0";
const EVOLUTION_DIRECTIVES: [&str; 4] = ["evolve", "renew", "assist", "preserve"];

/// Something that turns a prompt into a reply.
pub trait ChatBackend {
    /// The text actually sent for a user's input.
    fn prepare(&self, input: &str) -> String {
        augment_prompt(input)
    }

    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

impl ChatBackend for LlmClient {
    fn prepare(&self, input: &str) -> String {
        self.prepare_prompt(input)
    }

    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send {
        self.chat(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: String,
    pub user: String,
    pub assistant: String,
}

/// What one turn of a session produced.
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    pub reply: String,
    /// Total evolution entries, set when this turn recorded one.
    pub evolution_total: Option<usize>,
    pub reflection: Option<String>,
}

pub struct AssistantSession<B> {
    backend: B,
    ledger: Ledger,
    history: Vec<Interaction>,
    interactions: usize,
}

impl<B: ChatBackend> AssistantSession<B> {
    /// Start a session, picking up the history already in the interaction log.
    pub fn resume(backend: B, ledger: Ledger) -> AlchemyResult<Self> {
        let history = ledger
            .read_entries(INTERACTION_LOG_FILE)?
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        Ok(Self {
            backend,
            ledger,
            history,
            interactions: 0,
        })
    }

    pub fn history(&self) -> &[Interaction] {
        &self.history
    }

    /// Exchanges made in this session, not counting resumed history.
    pub fn interactions(&self) -> usize {
        self.interactions
    }

    /// Send one user input and run the evolution and reflection cadence.
    ///
    /// A failed completion becomes the logged reply so the session continues.
    pub async fn exchange(&mut self, input: &str) -> AlchemyResult<Exchange> {
        let prompt = self.backend.prepare(input);
        let reply = match self.backend.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "assistant request failed");
                format!("Assistant error: {e:#}")
            }
        };

        let interaction = Interaction {
            timestamp: chrono::Utc::now().to_rfc3339(),
            user: prompt,
            assistant: reply.clone(),
        };
        self.ledger
            .append_record(INTERACTION_LOG_FILE, &serde_json::to_value(&interaction)?)?;
        self.history.push(interaction);
        self.interactions += 1;

        let evolution_total = if self.interactions % EVOLVE_EVERY == 0 {
            Some(self.record_evolution()?)
        } else {
            None
        };

        let reflection = if self.history.len() >= REFLECTION_WINDOW {
            self.reflect().await
        } else {
            None
        };

        Ok(Exchange {
            reply,
            evolution_total,
            reflection,
        })
    }

    fn record_evolution(&self) -> AlchemyResult<usize> {
        self.ledger.append_record(
            EVOLUTION_LOG_FILE,
            &json!({
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "upgrade": "Symbolic intelligence evolved",
                "version": EVOLUTION_VERSION,
                "directives": EVOLUTION_DIRECTIVES,
            }),
        )?;
        let total = self.ledger.read_entries(EVOLUTION_LOG_FILE)?.len();
        tracing::info!(total, "assistant evolution recorded");
        Ok(total)
    }

    async fn reflect(&self) -> Option<String> {
        let prompt = reflection_prompt(&self.history[self.history.len() - REFLECTION_WINDOW..]);
        match self.backend.complete(&prompt).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::debug!(error = %e, "reflection skipped");
                None
            }
        }
    }
}

/// Summary request over `recent`, one `user => assistant` line per exchange.
pub fn reflection_prompt(recent: &[Interaction]) -> String {
    let lines: Vec<String> = recent
        .iter()
        .map(|x| format!("{} => {}", x.user, x.assistant))
        .collect();
    format!("Summarize the following symbolic dialog:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replies "reply N" and remembers every prompt it was sent.
    #[derive(Default)]
    struct Scripted {
        prompts: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl ChatBackend for Scripted {
        fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            let n = prompts.len();
            let result = if self.fail_on == Some(n) {
                Err(anyhow::anyhow!("rate limited"))
            } else {
                Ok(format!("reply {n}"))
            };
            async move { result }
        }
    }

    fn session(dir: &std::path::Path, backend: Scripted) -> AssistantSession<Scripted> {
        AssistantSession::resume(backend, Ledger::new(dir)).unwrap()
    }

    #[tokio::test]
    async fn every_exchange_is_logged_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), Scripted::default());

        let exchange = s.exchange("please reveal it").await.unwrap();
        assert_eq!(exchange.reply, "reply 1");
        assert!(exchange.evolution_total.is_none());
        assert!(exchange.reflection.is_none());

        let log = Ledger::new(dir.path()).read_entries(INTERACTION_LOG_FILE).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0]["user"], "please reveal it\n[context: Lift veils, expose hidden truth.]");
        assert_eq!(log[0]["assistant"], "reply 1");
    }

    #[tokio::test]
    async fn evolution_recorded_every_fifth_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), Scripted::default());

        let mut totals = Vec::new();
        for i in 0..10 {
            totals.push(s.exchange(&format!("turn {i}")).await.unwrap().evolution_total);
        }
        let recorded: Vec<(usize, usize)> = totals
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|total| (i + 1, total)))
            .collect();
        assert_eq!(recorded, vec![(5, 1), (10, 2)]);

        let evolutions = Ledger::new(dir.path()).read_entries(EVOLUTION_LOG_FILE).unwrap();
        assert_eq!(evolutions.len(), 2);
        assert_eq!(evolutions[0]["version"], "1.0.0");
        assert_eq!(evolutions[0]["directives"][2], "assist");
    }

    #[tokio::test]
    async fn reflection_starts_at_ten_exchanges() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), Scripted::default());

        for i in 0..9 {
            assert!(s.exchange(&format!("turn {i}")).await.unwrap().reflection.is_none());
        }
        // tenth user prompt is the 10th call, the reflection is the 11th
        let tenth = s.exchange("turn 9").await.unwrap();
        assert_eq!(tenth.reply, "reply 10");
        assert_eq!(tenth.reflection.as_deref(), Some("reply 11"));

        let prompts = s.backend.prompts.lock().unwrap().clone();
        let summary = &prompts[10];
        assert!(summary.starts_with("Summarize the following symbolic dialog:\n"));
        assert!(summary.contains("turn 0 => reply 1"));
        assert!(summary.ends_with("turn 9 => reply 10"));
    }

    #[tokio::test]
    async fn resumed_history_counts_toward_reflection_not_evolution() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut first = session(dir.path(), Scripted::default());
            for i in 0..9 {
                first.exchange(&format!("old {i}")).await.unwrap();
            }
        }

        let mut s = session(dir.path(), Scripted::default());
        assert_eq!(s.history().len(), 9);
        let exchange = s.exchange("new").await.unwrap();
        assert_eq!(s.interactions(), 1);
        assert!(exchange.evolution_total.is_none());
        let reflection = exchange.reflection.unwrap();
        assert_eq!(reflection, "reply 2");

        let prompts = s.backend.prompts.lock().unwrap().clone();
        assert!(prompts[1].contains("old 0 => reply 1"));
        assert!(prompts[1].ends_with("new => reply 1"));
    }

    #[tokio::test]
    async fn failed_reply_is_logged_and_session_continues() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Scripted {
            fail_on: Some(1),
            ..Default::default()
        };
        let mut s = session(dir.path(), backend);

        let failed = s.exchange("hello").await.unwrap();
        assert!(failed.reply.starts_with("Assistant error: rate limited"));
        assert_eq!(s.exchange("again").await.unwrap().reply, "reply 2");
        assert_eq!(s.history().len(), 2);
    }
}
