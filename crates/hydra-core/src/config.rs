//! Layered configuration: a TOML file overridden by `HYDRA_*` environment
//! variables, following the `figment` pattern used across the workspace.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{HydraError, Result};

fn default_db_path() -> PathBuf {
    PathBuf::from("hydra.sqlite3")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<String>,
}

/// Knobs named in the spec's ingestion/report pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Sender ids treated as "ours"; the self-loop guard drops anything
    /// they send. Populated once at startup, never discovered at runtime.
    #[serde(default)]
    pub own_identities: Vec<String>,

    /// Transport credential for the chat adapter (e.g. a Telegram bot
    /// token). Not part of the declared configuration surface since the
    /// transport is external; the composition root still
    /// needs it to actually connect one.
    pub bot_token: Option<String>,

    pub target_channel: Option<String>,
    pub vip_target_channel: Option<String>,
    pub report_target_channel: Option<String>,

    #[serde(default)]
    pub blacklist_channels: Vec<String>,
    #[serde(default)]
    pub source_channels: Vec<String>,
    #[serde(default)]
    pub from_users: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Legacy buffered-summarization path; `summarize_enabled` stays
    /// hardcoded false, the daily scheduler is the only report mechanism.
    #[serde(default)]
    pub buffer_size: usize,
    #[serde(default)]
    pub buffer_timeout_secs: u64,

    /// Base directory the scheduler writes `reports/channels/*.md` and
    /// `reports/data/*.json` artifacts under. Defaults to the working directory.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            own_identities: Vec::new(),
            bot_token: None,
            target_channel: None,
            vip_target_channel: None,
            report_target_channel: None,
            blacklist_channels: Vec::new(),
            source_channels: Vec::new(),
            from_users: Vec::new(),
            keywords: Vec::new(),
            allowed_users: Vec::new(),
            buffer_size: 0,
            buffer_timeout_secs: 0,
            reports_dir: default_reports_dir(),
        }
    }
}

fn default_dedup_cache_size() -> usize {
    5000
}

fn default_similarity_threshold() -> f64 {
    0.85
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_dedup_cache_size")]
    pub cache_size: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            cache_size: default_dedup_cache_size(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_min_length() -> usize {
    15
}
fn default_max_messages() -> usize {
    50
}
fn default_score_threshold() -> f64 {
    0.2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorConfig {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_messages: default_max_messages(),
            score_threshold: default_score_threshold(),
        }
    }
}

/// Per-vendor credential block. Most vendors only need an API key and an
/// optional base-url override (self-hosted gateways, regional endpoints).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VendorConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl VendorConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: VendorConfig,
    #[serde(default)]
    pub groq: VendorConfig,
    #[serde(default)]
    pub glm: VendorConfig,
    #[serde(default)]
    pub nvidia: VendorConfig,
    #[serde(default)]
    pub openrouter: VendorConfig,
    #[serde(default)]
    pub claude: VendorConfig,
    #[serde(default)]
    pub gemini: VendorConfig,
    #[serde(default)]
    pub minimax: VendorConfig,
}

fn default_ai_provider() -> String {
    "openai".to_string()
}

fn default_allowed_paths() -> Vec<String> {
    vec!["/tmp".to_string(), "~/.hydra".to_string(), ".".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_provider")]
    pub provider: String,
    #[serde(default = "default_ai_provider")]
    pub advanced_provider: String,
    pub model: Option<String>,
    #[serde(default)]
    pub extended_thinking: bool,
    #[serde(default = "default_allowed_paths")]
    pub allowed_paths: Vec<String>,
    pub skills_path: Option<String>,
    pub workspace_path: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_ai_provider(),
            advanced_provider: default_ai_provider(),
            model: None,
            extended_thinking: false,
            allowed_paths: default_allowed_paths(),
            skills_path: None,
            workspace_path: None,
            providers: ProvidersConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    pub notes_repo: Option<String>,
    pub git_ssh_key_path: Option<String>,
    pub github_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    pub searx_url: Option<String>,
    pub cloudflare_api_token: Option<String>,
    pub cloudflare_account_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HydraConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub compressor: CompressorConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl HydraConfig {
    /// Loads the TOML file at `path` if present, then overlays `HYDRA_*`
    /// environment variables (nested keys use `__`, e.g.
    /// `HYDRA_AI__PROVIDER=claude`).
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(HydraConfig::default()));
        if let Some(path) = path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }
        figment = figment.merge(Env::prefixed("HYDRA_").split("__"));

        figment
            .extract()
            .map_err(|e| HydraError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let cfg = HydraConfig::load(None).expect("default config loads");
        assert_eq!(cfg.dedup.cache_size, 5000);
        assert_eq!(cfg.compressor.max_messages, 50);
        assert_eq!(cfg.ai.provider, "openai");
    }

    #[test]
    fn vendor_config_requires_non_empty_key() {
        let v = VendorConfig {
            api_key: Some(String::new()),
            base_url: None,
            model: None,
        };
        assert!(!v.is_configured());

        let v = VendorConfig {
            api_key: Some("sk-test".to_string()),
            base_url: None,
            model: None,
        };
        assert!(v.is_configured());
    }

    #[test]
    fn env_override_replaces_provider() {
        std::env::set_var("HYDRA_AI__PROVIDER", "claude");
        let cfg = HydraConfig::load(None).expect("config loads");
        std::env::remove_var("HYDRA_AI__PROVIDER");
        assert_eq!(cfg.ai.provider, "claude");
    }
}
