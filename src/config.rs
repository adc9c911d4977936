use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AlchemyConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub drift: DriftConfig,
    pub compression: CompressionConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one `<sigil>.json` file per sigil.
    pub vault_dir: String,
    pub db_path: String,
    pub ledger_dir: String,
    /// Backup file consumed by `codex migrate`.
    pub backup_path: String,
    pub sync: SyncPaths,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncPaths {
    pub a0_vault: String,
    pub codex_vault: String,
    /// JSONL ritual log used when `codex_vault` does not exist.
    pub codex_vault_alt: String,
    pub log_path: String,
    pub backup_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DriftConfig {
    pub eps: f64,
    pub min_samples: usize,
    pub ewma_alpha: f64,
    pub rapid_threshold: f64,
    pub stale_after_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompressionConfig {
    pub max_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AssistantConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub pro_model: String,
    pub temperature: f64,
    /// Compress prompts before they are sent to the model.
    pub token_guard: bool,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let mut cors_origins = vec!["http://localhost".to_string()];
        cors_origins.extend((3000..=3004).map(|port| format!("http://localhost:{port}")));
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            log_level: "info".into(),
            cors_origins,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = default_alchemy_dir();
        let path = |p: &str| dir.join(p).to_string_lossy().into_owned();
        Self {
            vault_dir: path("vault/sigils"),
            db_path: path("spiral_codex.db"),
            ledger_dir: path("ledger"),
            backup_path: path("codex_vault_backup.json"),
            sync: SyncPaths::default(),
        }
    }
}

impl Default for SyncPaths {
    fn default() -> Self {
        let dir = default_alchemy_dir();
        let path = |p: &str| dir.join(p).to_string_lossy().into_owned();
        Self {
            a0_vault: path("a0/vault/vault.json"),
            codex_vault: path("codex_vault_backup.json"),
            codex_vault_alt: path("vault/ritual_log.jsonl"),
            log_path: path("sync_logs/vault_sync.log"),
            backup_dir: path("sync_logs/backups"),
        }
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            eps: 1.5,
            min_samples: 2,
            ewma_alpha: 0.3,
            rapid_threshold: 0.8,
            stale_after_days: 7,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { max_length: 1024 }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            api_key: None,
            model: "gpt-3.5-turbo".into(),
            pro_model: "gpt-4o".into(),
            temperature: 0.7,
            token_guard: true,
            timeout_secs: 60,
        }
    }
}

/// Returns `~/.codex-alchemy/`, falling back to the working directory when
/// no home directory is available.
pub fn default_alchemy_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codex-alchemy")
}

/// Returns the default config file path: `~/.codex-alchemy/config.toml`
pub fn default_config_path() -> PathBuf {
    default_alchemy_dir().join("config.toml")
}

impl AlchemyConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            AlchemyConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CODEX_VAULT_DIR") {
            self.storage.vault_dir = val;
        }
        if let Ok(val) = std::env::var("CODEX_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CODEX_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("CODEX_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid CODEX_PORT"),
            }
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            if !val.is_empty() {
                self.assistant.api_key = Some(val);
            }
        }
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_vault_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.vault_dir)
    }

    pub fn resolved_ledger_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.ledger_dir)
    }

    pub fn resolved_backup_path(&self) -> PathBuf {
        expand_tilde(&self.storage.backup_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn default_config_is_valid() {
        let config = AlchemyConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.server.cors_origins.len(), 6);
        assert!(config
            .server
            .cors_origins
            .contains(&"http://localhost:3004".to_string()));
        assert_eq!(config.drift.eps, 1.5);
        assert_eq!(config.drift.min_samples, 2);
        assert_eq!(config.compression.max_length, 1024);
        assert!(config.storage.db_path.ends_with("spiral_codex.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
port = 9100

[storage]
vault_dir = "/tmp/sigils"

[drift]
rapid_threshold = 0.5
"#;
        let config: AlchemyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.storage.vault_dir, "/tmp/sigils");
        assert_eq!(config.drift.rapid_threshold, 0.5);
        // defaults still apply for unset fields
        assert_eq!(config.drift.ewma_alpha, 0.3);
        assert_eq!(config.assistant.model, "gpt-3.5-turbo");
    }

    #[test]
    fn env_overrides_apply() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut config = AlchemyConfig::default();
        std::env::set_var("CODEX_DB", "/tmp/override.db");
        std::env::set_var("CODEX_VAULT_DIR", "/tmp/override-vault");
        std::env::set_var("CODEX_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.storage.vault_dir, "/tmp/override-vault");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("CODEX_DB");
        std::env::remove_var("CODEX_VAULT_DIR");
        std::env::remove_var("CODEX_LOG_LEVEL");
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut config = AlchemyConfig::default();
        std::env::set_var("CODEX_PORT", "not-a-port");
        config.apply_env_overrides();
        assert_eq!(config.server.port, 8000);

        std::env::set_var("CODEX_PORT", "9200");
        config.apply_env_overrides();
        assert_eq!(config.server.port, 9200);

        std::env::remove_var("CODEX_PORT");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/db.sqlite"), PathBuf::from("/var/db.sqlite"));
    }
}
