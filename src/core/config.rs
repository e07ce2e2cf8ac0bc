use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::campaign::CampaignSettings;

/// Environment variable holding the gateway API key, matching the variable
/// the gateway vendor documents.
pub const API_KEY_ENV: &str = "BLAND_API_KEY";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "CALLMINDER_CONFIG";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub campaign: CampaignDefaults,

    #[serde(default)]
    pub clinic: ClinicInfo,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Falls back to the `BLAND_API_KEY` environment variable when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Public URL the gateway should push call completions to. When unset
    /// the dispatcher polls for transcripts instead.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Shared secret for webhook signature verification. When set, unsigned
    /// or mis-signed webhook requests are rejected.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignDefaults {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_interval")]
    pub retry_interval_minutes: u64,

    #[serde(default = "default_country_code")]
    pub country_code: String,

    #[serde(default = "default_concurrency")]
    pub concurrency_limit: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_batch_delay")]
    pub batch_delay_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct ClinicInfo {
    #[serde(default = "default_clinic_name")]
    pub name: String,

    #[serde(default = "default_callback_number")]
    pub callback_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_base_url() -> String {
    "https://api.bland.ai".to_string()
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_interval() -> u64 {
    30
}
fn default_country_code() -> String {
    "+1".to_string()
}
fn default_concurrency() -> usize {
    3
}
fn default_batch_size() -> usize {
    5
}
fn default_batch_delay() -> u64 {
    10
}
fn default_clinic_name() -> String {
    "Hillside Medical Group".to_string()
}
fn default_callback_number() -> String {
    "210-742-6555".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8750
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            webhook_url: None,
            webhook_secret: None,
        }
    }
}

impl Default for CampaignDefaults {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_interval_minutes: default_retry_interval(),
            country_code: default_country_code(),
            concurrency_limit: default_concurrency(),
            batch_size: default_batch_size(),
            batch_delay_seconds: default_batch_delay(),
        }
    }
}

impl Default for ClinicInfo {
    fn default() -> Self {
        Self {
            name: default_clinic_name(),
            callback_number: default_callback_number(),
        }
    }
}

impl CampaignDefaults {
    /// Enforce the documented bounds. Out-of-range values are clamped with a
    /// warning rather than rejected; this runs wherever user input enters the
    /// system (config file, CLI flags, API overrides).
    pub fn clamp(&mut self) {
        self.max_attempts = clamp_field(self.max_attempts, 1, 10, "campaign.max_attempts");
        self.retry_interval_minutes = clamp_field(
            self.retry_interval_minutes,
            5,
            1440,
            "campaign.retry_interval_minutes",
        );
        self.concurrency_limit =
            clamp_field(self.concurrency_limit, 1, 10, "campaign.concurrency_limit");
        if self.batch_size == 0 {
            warn!("campaign.batch_size 0 is invalid, using 1");
            self.batch_size = 1;
        }
        let trimmed = self.country_code.trim();
        if trimmed.is_empty() {
            warn!(
                "campaign.country_code is empty, using {}",
                default_country_code()
            );
            self.country_code = default_country_code();
        } else if !trimmed.starts_with('+') {
            self.country_code = format!("+{}", trimmed);
        }
    }

    pub fn settings(&self) -> CampaignSettings {
        CampaignSettings {
            max_attempts: self.max_attempts,
            retry_interval_minutes: self.retry_interval_minutes,
            country_code: self.country_code.clone(),
            concurrency_limit: self.concurrency_limit,
            batch_size: self.batch_size,
            batch_delay_seconds: self.batch_delay_seconds,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn clamp_field<T: PartialOrd + Copy + std::fmt::Display>(value: T, lo: T, hi: T, field: &str) -> T {
    if value < lo {
        warn!("{} {} is below the minimum, clamping to {}", field, value, lo);
        lo
    } else if value > hi {
        warn!("{} {} is above the maximum, clamping to {}", field, value, hi);
        hi
    } else {
        value
    }
}

impl AppConfig {
    /// Load configuration: explicit path, else `$CALLMINDER_CONFIG`, else
    /// the platform config directory. A missing file yields defaults; a
    /// present but malformed file is an error.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(explicit) {
            Some(path) if path.exists() => {
                let content = tokio::fs::read_to_string(&path).await?;
                let parsed: AppConfig = toml::from_str(&content)?;
                info!("Loaded config from {}", path.display());
                parsed
            }
            Some(path) => {
                info!("No config file at {}, using defaults.", path.display());
                Self::default()
            }
            None => {
                info!("No config directory available, using defaults.");
                Self::default()
            }
        };
        config.apply_env(std::env::var(API_KEY_ENV).ok());
        config.clamp_bounds();
        Ok(config)
    }

    /// The environment key fills `gateway.api_key` only when the config file
    /// left it unset.
    pub(crate) fn apply_env(&mut self, env_api_key: Option<String>) {
        if self.gateway.api_key.is_none() {
            self.gateway.api_key = env_api_key.filter(|k| !k.trim().is_empty());
        }
    }

    pub(crate) fn clamp_bounds(&mut self) {
        self.campaign.clamp();
    }

    /// Campaign settings derived from the configured defaults.
    pub fn settings(&self) -> CampaignSettings {
        self.campaign.settings()
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.gateway
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "gateway API key not configured: set {} or gateway.api_key in config.toml",
                    API_KEY_ENV
                )
            })
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("callminder").join("config.toml"))
}
