//! Gene, the built-in assistant.
//!
//! [`GeneAssistant`] answers offline with keyword routing over the known
//! rituals and logs every exchange to `assistant_log.jsonl`. The online
//! variant in [`llm`] forwards prompts to a chat-completions API, and
//! [`session`] runs it as an interactive loop.

pub mod llm;
pub mod session;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::AlchemyResult;
use crate::ledger::Ledger;

pub use llm::LlmClient;
pub use session::{AssistantSession, ChatBackend, Exchange};

pub const ASSISTANT_LOG_FILE: &str = "assistant_log.jsonl";

const DEFAULT_SUGGESTIONS: [&str; 3] = ["dream-loop", "vault diff", "sync"];

/// What the caller knows about where the user is. Unknown keys are kept and
/// logged with the interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_ritual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault: Option<String>,
    /// Glyph count as reported by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyphs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssistantContext {
    fn page(&self) -> &str {
        self.page.as_deref().unwrap_or("unknown")
    }

    fn glyph_count(&self) -> String {
        match &self.glyphs {
            None | Some(Value::Null) => "0".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    fn has_recent_ritual(&self) -> bool {
        match &self.recent_ritual {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Suggestions derived from the current page and recent activity.
    fn suggestions(&self) -> Vec<String> {
        let page = self.page.as_deref().unwrap_or("");
        let mut out: Vec<&str> = if page.contains("rituals") {
            vec!["dream-loop", "vault diff", "sync-status"]
        } else if page.contains("glyphs") {
            vec!["vault list", "vault reflect", "dream-loop"]
        } else if page.contains("a0") {
            vec!["sync", "a0-status", "vault diff"]
        } else {
            Vec::new()
        };
        if self.has_recent_ritual() {
            out.extend(["vault diff", "sync-status", "glyphs"]);
        }
        out.into_iter().map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneResponse {
    pub response: String,
    pub suggestions: Vec<String>,
    pub ritual_hint: Option<String>,
    pub offline: bool,
}

impl GeneResponse {
    /// Canned reply used when the assistant itself fails.
    pub fn offline() -> Self {
        Self {
            response: "I'm experiencing some difficulties right now. Try asking about rituals, vaults, or glyphs."
                .to_string(),
            suggestions: strings(&DEFAULT_SUGGESTIONS),
            ritual_hint: Some("I can still help with basic symbolic operations.".to_string()),
            offline: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneStatus {
    pub status: &'static str,
    pub recent_interactions: usize,
    pub last_interaction: Option<Value>,
    pub ledger_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneInvocation {
    pub from: &'static str,
    pub input: String,
    pub output: String,
}

/// Echo a prompt back as Gene.
pub fn gene_invoke(prompt: &str) -> GeneInvocation {
    GeneInvocation {
        from: "Gene",
        input: prompt.to_string(),
        output: format!("🧠 Gene is reflecting on: '{prompt}'..."),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A ritual Gene knows how to explain.
struct RitualInfo {
    description: &'static str,
    command: &'static str,
    related: [&'static str; 3],
}

const DREAM_LOOP: RitualInfo = RitualInfo {
    description: "Evolves glyphs through symbolic mutation",
    command: "codex dream-loop",
    related: ["vault diff", "sync-status", "evolve"],
};

const VAULT_DIFF: RitualInfo = RitualInfo {
    description: "Compare two sigils in the vault",
    command: "codex vault diff <sigil_a> <sigil_b>",
    related: ["vault list", "vault reflect", "dream-loop"],
};

const VAULT_SYNC: RitualInfo = RitualInfo {
    description: "Synchronize vaults between Codex and A0",
    command: "codex sync",
    related: ["sync-status", "vault diff", "a0-integration"],
};

const GLYPHS: RitualInfo = RitualInfo {
    description: "Symbolic entities stored in vaults",
    command: "codex vault list",
    related: ["vault show", "vault reflect", "dream-loop"],
};

fn mentions(prompt: &str, words: &[&str]) -> bool {
    words.iter().any(|w| prompt.contains(w))
}

/// Offline keyword-routed assistant.
#[derive(Debug, Clone)]
pub struct GeneAssistant {
    ledger: Ledger,
}

impl GeneAssistant {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Build a reply for `prompt` without touching the log.
    pub fn generate_response(&self, prompt: &str, context: &AssistantContext) -> GeneResponse {
        let prompt = prompt.to_lowercase();

        let (response, suggestions, hint) = if mentions(&prompt, &["dream", "loop", "evolve", "mutation"]) {
            (
                format!(
                    "I can help with the dream loop ritual! {}. Try `{}` to evolve your glyphs.",
                    DREAM_LOOP.description, DREAM_LOOP.command
                ),
                strings(&DREAM_LOOP.related),
                "The dream loop creates evolved glyphs with 🧬 mutations from your current sigil.".to_string(),
            )
        } else if mentions(&prompt, &["vault", "diff", "compare", "sigil"]) {
            (
                format!(
                    "Vault comparison is powerful! {}. Use `{}` to see differences.",
                    VAULT_DIFF.description, VAULT_DIFF.command
                ),
                strings(&VAULT_DIFF.related),
                "Vault diff shows exactly what changed between sigils.".to_string(),
            )
        } else if mentions(&prompt, &["sync", "synchronize", "a0"]) {
            (
                format!(
                    "Vault synchronization connects Codex and A0! {}. Run `{}` to sync.",
                    VAULT_SYNC.description, VAULT_SYNC.command
                ),
                strings(&VAULT_SYNC.related),
                "Sync preserves differences while merging common elements.".to_string(),
            )
        } else if mentions(&prompt, &["glyph", "symbol", "entity"]) {
            (
                format!(
                    "Glyphs are symbolic entities in your vault! {}. Use `{}` to explore.",
                    GLYPHS.description, GLYPHS.command
                ),
                strings(&GLYPHS.related),
                format!("Your vault currently contains {} glyphs.", context.glyph_count()),
            )
        } else if mentions(&prompt, &["help", "assist", "guide"]) {
            (
                "I am Gene, your symbolic assistant! I can help with rituals, vaults, glyphs, and the dream loop evolution. What would you like to explore?".to_string(),
                strings(&["dream-loop", "vault diff", "sync", "glyphs"]),
                "Press Ctrl+Shift+G anytime to summon me for assistance.".to_string(),
            )
        } else {
            let mut suggestions = context.suggestions();
            if suggestions.is_empty() {
                suggestions = strings(&DEFAULT_SUGGESTIONS);
            }
            (
                format!(
                    "I sense you're working with {}. How can I assist with your symbolic journey?",
                    context.page()
                ),
                suggestions,
                "I'm aware of your current context and can provide targeted assistance.".to_string(),
            )
        };

        GeneResponse {
            response,
            suggestions,
            ritual_hint: Some(hint),
            offline: false,
        }
    }

    fn log_interaction(&self, prompt: &str, response: &str, context: &AssistantContext) -> AlchemyResult<()> {
        self.ledger.append_record(
            ASSISTANT_LOG_FILE,
            &json!({
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "prompt": prompt,
                "response": response,
                "context": context,
            }),
        )
    }

    /// Answer `prompt` and log the exchange. Logging failures degrade to the
    /// [offline](GeneResponse::offline) reply.
    pub fn respond(&self, prompt: &str, context: &AssistantContext) -> GeneResponse {
        let reply = self.generate_response(prompt, context);
        match self.log_interaction(prompt, &reply.response, context) {
            Ok(()) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "assistant log unavailable, answering offline");
                GeneResponse::offline()
            }
        }
    }

    pub fn status(&self) -> AlchemyResult<GeneStatus> {
        let entries = self.ledger.read_entries(ASSISTANT_LOG_FILE)?;
        Ok(GeneStatus {
            status: "active",
            recent_interactions: entries.len(),
            last_interaction: entries.last().cloned(),
            ledger_path: self.ledger.dir().join(ASSISTANT_LOG_FILE).display().to_string(),
        })
    }
}
