use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "Vasini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub ollama_model: String,
    pub openrouter_model: String,
    /// Base URL for the Ollama API.  Overridden at runtime by the
    /// `OLLAMA_BASE_URL` environment variable when set.
    pub ollama_base_url: String,
    /// Upper bound for one profile synthesis call.  A call that runs longer is
    /// abandoned and treated as a synthesis failure.
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            ollama_model: "llama3.1:8b".to_string(),
            openrouter_model: "openai/gpt-4o-mini".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            timeout_secs: 60,
            temperature: 0.7,
        }
    }
}

// ── Survey config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Optional TOML catalog replacing the built-in question set.
    pub catalog_path: Option<String>,
    /// Number of fixed-choice inventory questions a catalog must carry.
    pub inventory_len: usize,
    /// Profiles shorter than this (in characters) count as "not found".
    pub min_profile_chars: usize,
    /// Platform message-size limit used when splitting long profiles.
    pub message_chunk_chars: usize,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            inventory_len: 34,
            min_profile_chars: 20,
            message_chunk_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    /// How many previously issued advice strings are remembered per user.
    pub history_len: usize,
    /// Extra composition attempts when a fresh advice string collides with
    /// the history.
    pub max_resamples: usize,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            history_len: 20,
            max_resamples: 5,
        }
    }
}

/// Where per-user sessions live.
///
/// | Backend  | Behaviour                                                  |
/// |----------|------------------------------------------------------------|
/// | `memory` | Process-local map; everything is lost on restart.          |
/// | `file`   | One JSON document per user under `sessions_dir`.           |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub sessions_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            sessions_dir: ".vasini/sessions".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub poll_timeout_secs: u64,
    pub idle_delay_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 25,
            idle_delay_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// When set, logs are also written to a daily-rotated file in this
    /// directory.
    pub log_dir: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub llm: LlmConfig,
    pub survey: SurveyConfig,
    pub advice: AdviceConfig,
    pub storage: StorageConfig,
    pub telegram: TelegramConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(value) = env::var("OLLAMA_BASE_URL") {
            if !value.is_empty() {
                config.llm.provider = "ollama".to_string();
                config.llm.ollama_base_url = value;
            }
        }

        if let Ok(level) = env::var("VASINI_LOG_LEVEL") {
            if !level.is_empty() {
                config.telemetry.log_level = level;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn active_model(&self) -> &str {
        if self.llm.provider.eq_ignore_ascii_case("openrouter") {
            &self.llm.openrouter_model
        } else {
            &self.llm.ollama_model
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
