use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use codex_alchemy::assistant::{AssistantContext, AssistantSession, GeneAssistant, LlmClient};
use codex_alchemy::config::AlchemyConfig;

/// Ask Gene offline, or the configured chat model with `--online`.
pub async fn assist(config: &AlchemyConfig, prompt: &str, online: bool, pro: bool) -> Result<()> {
    let ledger = super::ledger(config);

    if online {
        let client = LlmClient::new(&config.assistant, pro, config.compression.max_length)?;
        tracing::info!(model = client.model(), "asking online assistant");
        let reply = client.ask(prompt, &ledger).await?;
        println!("{reply}");
        return Ok(());
    }

    let gene = GeneAssistant::new(ledger);
    let reply = gene.respond(prompt, &AssistantContext::default());
    println!("{}", reply.response);
    if let Some(hint) = &reply.ritual_hint {
        println!();
        println!("Hint: {hint}");
    }
    if !reply.suggestions.is_empty() {
        println!("Try: {}", reply.suggestions.join(", "));
    }
    Ok(())
}

/// Interactive online chat. Ends on "exit" or end of input.
pub async fn session(config: &AlchemyConfig, pro: bool) -> Result<()> {
    let client = LlmClient::new(&config.assistant, pro, config.compression.max_length)?;
    tracing::info!(model = client.model(), "starting assistant session");
    let mut session = AssistantSession::resume(client, super::ledger(config))
        .context("failed to read interaction log")?;

    println!("Codex Assistant online. Type 'exit' to quit.");
    println!();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let exchange = session.exchange(input).await?;
        println!("Codex: {}", exchange.reply);
        if let Some(total) = exchange.evolution_total {
            println!("Evolution event recorded. Total: {total}");
        }
        if let Some(reflection) = &exchange.reflection {
            println!();
            println!("Reflection: {reflection}");
        }
    }

    println!("Session ended after {} exchanges.", session.interactions());
    Ok(())
}

pub fn gene_status(config: &AlchemyConfig) -> Result<()> {
    let status = GeneAssistant::new(super::ledger(config)).status()?;
    println!("Gene status:          {}", status.status);
    println!("Interactions logged:  {}", status.recent_interactions);
    println!("Ledger:               {}", status.ledger_path);
    if let Some(last) = &status.last_interaction {
        println!("Last interaction:     {}", serde_json::to_string(last)?);
    }
    Ok(())
}
