mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::records::{GlyphType, NewRitual};
use codex_alchemy::sync::DEFAULT_LOG_LIMIT;

#[derive(Parser)]
#[command(name = "codex", version, about = "Glyph vault, drift detection, and ritual tooling")]
struct Cli {
    /// Config file (defaults to ~/.codex-alchemy/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server
    Serve,
    /// Inspect and manipulate flat-file sigils
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },
    /// Evolve every glyph of one sigil into another
    Evolve { source: String, target: String },
    /// Evolve `default` into `evolved`, seeding `default` when empty
    DreamLoop,
    /// Flag drifting, stale, and unlinked glyphs in a sigil
    Drift {
        #[arg(long, default_value = "default")]
        sigil: String,
        /// Print the raw JSON report
        #[arg(long)]
        json: bool,
    },
    /// Compress a prompt file
    Compress {
        file: PathBuf,
        #[arg(long)]
        symbolic: bool,
        /// Save a before/after snapshot under the ledger directory
        #[arg(long)]
        snapshot: bool,
        /// Record the result as a training entry with this label
        #[arg(long)]
        teach: Option<String>,
        #[arg(long)]
        max_length: Option<usize>,
    },
    /// Append improvement hints to a script based on feedback
    Refine {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        rating: i64,
        #[arg(long, default_value = "")]
        comments: String,
    },
    /// Rebuild the database from a vault backup
    Migrate { backup: Option<PathBuf> },
    /// Manage rituals stored in the database
    Rituals {
        #[command(subcommand)]
        action: RitualAction,
    },
    /// Show database glyph statistics
    Stats,
    /// Merge the A0 and Codex vault documents
    Sync,
    /// Show vault synchronization status
    SyncStatus,
    /// Show recent synchronization log lines
    SyncLogs {
        #[arg(long, default_value_t = DEFAULT_LOG_LIMIT)]
        limit: usize,
    },
    /// Ask the assistant
    Assist {
        #[arg(num_args = 1.., required_unless_present = "session")]
        prompt: Vec<String>,
        /// Use the configured chat-completions API instead of offline Gene
        #[arg(long)]
        online: bool,
        /// Use the larger model (with --online)
        #[arg(long, requires = "online")]
        pro: bool,
        /// Chat interactively until "exit" (with --online)
        #[arg(long, requires = "online", conflicts_with = "prompt")]
        session: bool,
    },
    /// Show the offline assistant's interaction log summary
    GeneStatus,
    /// Check the vault and database and print a health report
    Doctor,
}

#[derive(Subcommand)]
enum VaultAction {
    /// List sigils and their glyph counts
    List,
    /// Print the glyphs of a sigil
    Show { sigil: String },
    /// Compare two sigils by glyph name
    Diff { a: String, b: String },
    /// Append glyphs from a JSON file to a sigil
    Ingest { sigil: String, file: PathBuf },
    /// Concatenate several sigils into one
    Bundle {
        name: String,
        #[arg(required = true, num_args = 1..)]
        sigils: Vec<String>,
    },
    /// Gather every other sigil into one
    Reflect {
        #[arg(default_value = "reflection")]
        name: String,
    },
    /// Copy a sigil into the database
    Push {
        sigil: String,
        #[arg(long, default_value = "evolved")]
        glyph_type: GlyphType,
    },
    /// Write a database sigil back to the vault
    Pull { sigil: String },
}

#[derive(Subcommand)]
enum RitualAction {
    /// List rituals
    List,
    /// Create a ritual
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        ritual_type: Option<String>,
    },
    /// Delete a ritual by id
    Remove { id: i64 },
    /// Insert the default rituals
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AlchemyConfig::load_from(path)?,
        None => AlchemyConfig::load()?,
    };

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => codex_alchemy::server::serve(config).await?,
        Command::Vault { action } => match action {
            VaultAction::List => cli::vault::list(&config)?,
            VaultAction::Show { sigil } => cli::vault::show(&config, &sigil)?,
            VaultAction::Diff { a, b } => cli::vault::diff(&config, &a, &b)?,
            VaultAction::Ingest { sigil, file } => cli::vault::ingest(&config, &sigil, &file)?,
            VaultAction::Bundle { name, sigils } => cli::vault::bundle(&config, &sigils, &name)?,
            VaultAction::Reflect { name } => cli::vault::reflect(&config, &name)?,
            VaultAction::Push { sigil, glyph_type } => cli::vault::push(&config, &sigil, glyph_type)?,
            VaultAction::Pull { sigil } => cli::vault::pull(&config, &sigil)?,
        },
        Command::Evolve { source, target } => cli::vault::evolve(&config, &source, &target)?,
        Command::DreamLoop => cli::vault::dream_loop(&config)?,
        Command::Drift { sigil, json } => cli::drift::drift(&config, &sigil, json)?,
        Command::Compress {
            file,
            symbolic,
            snapshot,
            teach,
            max_length,
        } => cli::text::compress(
            &config,
            &file,
            cli::text::CompressOptions {
                symbolic,
                snapshot,
                teach: teach.as_deref(),
                max_length,
            },
        )?,
        Command::Refine {
            file,
            rating,
            comments,
        } => cli::text::refine(&file, rating, &comments)?,
        Command::Migrate { backup } => cli::migrate::migrate(&config, backup.as_deref())?,
        Command::Rituals { action } => match action {
            RitualAction::List => cli::rituals::list(&config)?,
            RitualAction::Add {
                name,
                description,
                ritual_type,
            } => cli::rituals::add(
                &config,
                NewRitual {
                    name,
                    description,
                    ritual_type,
                },
            )?,
            RitualAction::Remove { id } => cli::rituals::remove(&config, id)?,
            RitualAction::Seed => cli::rituals::seed(&config)?,
        },
        Command::Stats => cli::stats::stats(&config)?,
        Command::Sync => cli::sync::sync(&config)?,
        Command::SyncStatus => cli::sync::status(&config)?,
        Command::SyncLogs { limit } => cli::sync::logs(&config, limit)?,
        Command::Assist {
            prompt,
            online,
            pro,
            session: true,
        } => cli::assist::session(&config, pro).await?,
        Command::Assist {
            prompt,
            online,
            pro,
            session: false,
        } => cli::assist::assist(&config, &prompt.join(" "), online, pro).await?,
        Command::GeneStatus => cli::assist::gene_status(&config)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
