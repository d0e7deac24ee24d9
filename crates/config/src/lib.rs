//! Configuration loading, validation, and management for riad.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Validates all settings at startup. Every threshold, cap,
//! and margin the orchestration uses lives here and is threaded through
//! construction — nothing reads ambient process state at runtime.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Maximum turns kept per conversation (oldest trimmed)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum listings presented per search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Gateway settings (fragmentation, timeouts)
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Intent router settings
    #[serde(default)]
    pub router: RouterConfig,

    /// Negotiation margin policy
    #[serde(default)]
    pub negotiation: NegotiationConfig,

    /// Legal retrieval settings
    #[serde(default)]
    pub legal: LegalConfig,

    /// Alert settings
    #[serde(default)]
    pub alerts: AlertsConfig,

    /// Conversation store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// WhatsApp transport settings
    #[serde(default)]
    pub whatsapp: WhatsappConfig,
}

fn default_history_limit() -> usize {
    40
}
fn default_max_results() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Transport-imposed maximum characters per outbound fragment
    #[serde(default = "default_fragment_cap")]
    pub fragment_cap: usize,

    /// Seconds before an in-flight turn is abandoned and rolled back
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
}

fn default_fragment_cap() -> usize {
    1500
}
fn default_turn_timeout_secs() -> u64 {
    20
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            fragment_cap: default_fragment_cap(),
            turn_timeout_secs: default_turn_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Confidence floor below which classification yields a clarification
    /// reply instead of dispatching an agent
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

fn default_min_confidence() -> f32 {
    0.35
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// Discount the seller side will concede on a typical listing
    #[serde(default = "default_margin")]
    pub default_margin: f64,

    /// Margin in high-demand cities (tighter market, smaller concession)
    #[serde(default = "default_prime_city_margin")]
    pub prime_city_margin: f64,

    /// Margin on villas (wider spread, more room)
    #[serde(default = "default_villa_margin")]
    pub villa_margin: f64,

    /// Cities the prime margin applies to (matched case-insensitively)
    #[serde(default = "default_prime_cities")]
    pub prime_cities: Vec<String>,
}

fn default_margin() -> f64 {
    0.07
}
fn default_prime_city_margin() -> f64 {
    0.05
}
fn default_villa_margin() -> f64 {
    0.10
}
fn default_prime_cities() -> Vec<String> {
    vec!["casablanca".into(), "marrakech".into()]
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            default_margin: default_margin(),
            prime_city_margin: default_prime_city_margin(),
            villa_margin: default_villa_margin(),
            prime_cities: default_prime_cities(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalConfig {
    /// Passages retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Relevance floor below which the agent answers "no reliable answer"
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_top_k() -> usize {
    4
}
fn default_min_score() -> f32 {
    0.35
}

impl Default for LegalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Notifications sent per alert before the matcher goes quiet
    #[serde(default = "default_max_notifications")]
    pub max_notifications: u32,
}

fn default_max_notifications() -> u32 {
    10
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            max_notifications: default_max_notifications(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "memory" or "sqlite"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (ignored by the memory backend)
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_backend() -> String {
    "memory".into()
}
fn default_store_path() -> String {
    "riad.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WhatsappConfig {
    /// Provider account SID
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Provider auth token
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender number, e.g. "+14155238886"
    #[serde(default)]
    pub from_number: Option<String>,

    /// Allowed recipient numbers. Empty = deny all, ["*"] = allow all.
    #[serde(default)]
    pub allowed_numbers: Vec<String>,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            allowed_numbers: vec![],
        }
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for WhatsappConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsappConfig")
            .field("account_sid", &redact(&self.account_sid))
            .field("auth_token", &redact(&self.auth_token))
            .field("from_number", &self.from_number)
            .field("allowed_numbers", &self.allowed_numbers)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a specific file path.
    ///
    /// A missing file yields defaults; the `RIAD_STORE_BACKEND` and
    /// `RIAD_STORE_PATH` environment variables override the store section.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };

        if let Ok(backend) = std::env::var("RIAD_STORE_BACKEND") {
            config.store.backend = backend;
        }
        if let Ok(path) = std::env::var("RIAD_STORE_PATH") {
            config.store.path = path;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.fragment_cap == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.fragment_cap must be > 0".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "max_results must be > 0".into(),
            ));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "history_limit must be > 0".into(),
            ));
        }
        for (name, margin) in [
            ("default_margin", self.negotiation.default_margin),
            ("prime_city_margin", self.negotiation.prime_city_margin),
            ("villa_margin", self.negotiation.villa_margin),
        ] {
            if !(0.0..1.0).contains(&margin) {
                return Err(ConfigError::ValidationError(format!(
                    "negotiation.{name} must be in [0, 1)"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.router.min_confidence) {
            return Err(ConfigError::ValidationError(
                "router.min_confidence must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.legal.min_score) {
            return Err(ConfigError::ValidationError(
                "legal.min_score must be in [0, 1]".into(),
            ));
        }
        if self.legal.top_k == 0 {
            return Err(ConfigError::ValidationError("legal.top_k must be > 0".into()));
        }
        match self.store.backend.as_str() {
            "memory" | "sqlite" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "store.backend must be 'memory' or 'sqlite', got '{other}'"
                )));
            }
        }
        Ok(())
    }

    /// Generate a default config TOML string (for onboarding docs).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_results: default_max_results(),
            gateway: GatewayConfig::default(),
            router: RouterConfig::default(),
            negotiation: NegotiationConfig::default(),
            legal: LegalConfig::default(),
            alerts: AlertsConfig::default(),
            store: StoreConfig::default(),
            whatsapp: WhatsappConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
