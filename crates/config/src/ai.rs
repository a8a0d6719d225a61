// AI configuration and secrets management
//
// The OpenAI API key is looked up in:
// 1. System keychain (preferred)
// 2. OPENAI_API_KEY, then WOODSHU_OPENAI_KEY (CI/headless)
//
// Keys are NEVER stored in settings.json

use std::env;

use woodshu_engine::completion::ModelParams;
use woodshu_engine::session::SessionParams;
use woodshu_engine::WorkflowError;

use crate::settings::{AISettings, Settings};

/// Service name for keychain storage
#[cfg(feature = "keychain")]
const KEYCHAIN_SERVICE: &str = "woodshu";

/// Keychain account holding the OpenAI key
#[cfg(feature = "keychain")]
const KEYCHAIN_ACCOUNT: &str = "ai/openai";

/// Environment variables checked for the key, in order
pub const KEY_ENV_VARS: [&str; 2] = ["OPENAI_API_KEY", "WOODSHU_OPENAI_KEY"];

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from environment variable
    Environment(&'static str),
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment(var) => var,
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

impl KeyLookup {
    pub fn missing() -> Self {
        Self { key: None, source: KeySource::None }
    }
}

/// Get the OpenAI API key
pub fn get_api_key() -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            if let Ok(key) = entry.get_password() {
                if !key.trim().is_empty() {
                    return KeyLookup { key: Some(key), source: KeySource::Keychain };
                }
            }
        }
    }

    key_from_env(|name| env::var(name).ok())
}

/// First non-empty value among `KEY_ENV_VARS`.
fn key_from_env(get: impl Fn(&str) -> Option<String>) -> KeyLookup {
    KEY_ENV_VARS
        .iter()
        .find_map(|&name| {
            get(name)
                .filter(|key| !key.trim().is_empty())
                .map(|key| KeyLookup { key: Some(key), source: KeySource::Environment(name) })
        })
        .unwrap_or_else(KeyLookup::missing)
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "test").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI Configuration (single source of truth)
// ============================================================================

/// Status of the AI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    /// Key present, requests can be sent
    Ready,
    /// No API key anywhere
    MissingKey,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// The effective AI configuration, fully resolved from settings and
/// credential sources.
#[derive(Debug, Clone)]
pub struct ResolvedAIConfig {
    /// Endpoint requests go to
    pub base_url: String,
    /// Per-page model parameters
    pub params: SessionParams,
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

impl ResolvedAIConfig {
    pub fn from_settings(settings: &AISettings) -> Self {
        Self::resolve(settings, get_api_key())
    }

    /// Resolve against an explicit key lookup.
    pub fn resolve(settings: &AISettings, lookup: KeyLookup) -> Self {
        let (status, blocking_reason) = match lookup.key {
            Some(_) => (AIConfigStatus::Ready, None),
            None => (
                AIConfigStatus::MissingKey,
                Some(format!(
                    "No API key found. Set via keychain or {}",
                    KEY_ENV_VARS.join(" / ")
                )),
            ),
        };

        Self {
            base_url: settings
                .base_url
                .clone()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            params: settings.session_params(),
            api_key: lookup.key,
            key_source: lookup.source,
            status,
            blocking_reason,
        }
    }

    /// Startup check: the error every page shows while the key is missing.
    pub fn config_error(&self) -> Option<WorkflowError> {
        match self.status {
            AIConfigStatus::Ready => None,
            AIConfigStatus::MissingKey => Some(WorkflowError::Configuration(
                self.blocking_reason
                    .clone()
                    .unwrap_or_else(|| "API key missing".to_string()),
            )),
        }
    }
}

// ============================================================================
// Diagnostics (for CLI doctor and debugging)
// ============================================================================

/// Diagnostic information about AI configuration
#[derive(Debug)]
pub struct AIDiagnostics {
    pub status: AIConfigStatus,
    pub blocking_reason: Option<String>,
    pub base_url: String,
    pub params: SessionParams,
    pub key_present: bool,
    pub key_source: KeySource,
    pub keychain_available: bool,
    pub config_path: String,
}

impl AIDiagnostics {
    pub fn from_resolved(config: &ResolvedAIConfig) -> Self {
        Self {
            status: config.status,
            blocking_reason: config.blocking_reason.clone(),
            base_url: config.base_url.clone(),
            params: config.params.clone(),
            key_present: config.api_key.is_some(),
            key_source: config.key_source,
            keychain_available: keychain_available(),
            config_path: Settings::config_path_display(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "schema_version": 1,
            "status": self.status.as_str(),
            "blocking_reason": self.blocking_reason,
            "base_url": self.base_url,
            "models": {
                "critique": self.params.critique,
                "project": self.params.project,
                "material": self.params.material,
            },
            "key": if self.key_present { "present" } else { "missing" },
            "key_source": self.key_source.as_str(),
            "keychain": if self.keychain_available { "ok" } else { "unavailable" },
            "config_path": self.config_path,
        })
    }
}

impl std::fmt::Display for AIDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AI Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Status:            {}", self.status.as_str())?;
        if let Some(reason) = &self.blocking_reason {
            writeln!(f, "Blocking reason:   {}", reason)?;
        }
        writeln!(f, "Endpoint:          {}", self.base_url)?;
        writeln!(f, "Key present:       {}", if self.key_present { "yes" } else { "no" })?;
        writeln!(f, "Key source:        {}", self.key_source.as_str())?;
        writeln!(f, "Keychain available:{}", if self.keychain_available { "yes" } else { "no" })?;
        writeln!(f, "Settings:          {}", self.config_path)?;
        writeln!(f, "Models:")?;
        write_model(f, "critique", &self.params.critique)?;
        write_model(f, "project", &self.params.project)?;
        write_model(f, "wood", &self.params.material)?;

        Ok(())
    }
}

fn write_model(f: &mut std::fmt::Formatter<'_>, page: &str, params: &ModelParams) -> std::fmt::Result {
    let or_default = |v: Option<String>| v.unwrap_or_else(|| "default".to_string());
    writeln!(
        f,
        "  {:<9}{} (temperature {}, max tokens {})",
        page,
        params.model,
        or_default(params.temperature.map(|t| t.to_string())),
        or_default(params.max_tokens.map(|t| t.to_string())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| pairs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string())
    }

    #[test]
    fn openai_key_wins_over_woodshu_key() {
        let lookup = key_from_env(env_of(&[
            ("WOODSHU_OPENAI_KEY", "sk-woodshu"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]));
        assert_eq!(lookup.key.as_deref(), Some("sk-openai"));
        assert_eq!(lookup.source, KeySource::Environment("OPENAI_API_KEY"));
    }

    #[test]
    fn blank_key_is_missing() {
        let lookup = key_from_env(env_of(&[("OPENAI_API_KEY", "  ")]));
        assert_eq!(lookup, KeyLookup::missing());

        let lookup = key_from_env(env_of(&[("OPENAI_API_KEY", ""), ("WOODSHU_OPENAI_KEY", "sk-w")]));
        assert_eq!(lookup.source, KeySource::Environment("WOODSHU_OPENAI_KEY"));
    }

    #[test]
    fn missing_key_blocks_with_configuration_error() {
        let config = ResolvedAIConfig::resolve(&AISettings::default(), KeyLookup::missing());
        assert_eq!(config.status, AIConfigStatus::MissingKey);
        assert!(config.blocking_reason.as_deref().unwrap().contains("OPENAI_API_KEY"));
        assert_eq!(config.config_error().unwrap().kind(), "configuration");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn ready_config_uses_settings_endpoint() {
        let settings = AISettings {
            base_url: Some("http://127.0.0.1:9999/v1".to_string()),
            ..AISettings::default()
        };
        let lookup = KeyLookup {
            key: Some("sk-test".to_string()),
            source: KeySource::Environment("OPENAI_API_KEY"),
        };
        let config = ResolvedAIConfig::resolve(&settings, lookup);
        assert!(config.status.is_ready());
        assert!(config.config_error().is_none());
        assert_eq!(config.base_url, "http://127.0.0.1:9999/v1");
    }

    #[test]
    fn diagnostics_json_reports_key_state() {
        let config = ResolvedAIConfig::resolve(&AISettings::default(), KeyLookup::missing());
        let json = AIDiagnostics::from_resolved(&config).to_json();
        assert_eq!(json["status"], "missing_key");
        assert_eq!(json["key"], "missing");
        assert_eq!(json["models"]["critique"]["max_tokens"], 2000);
    }

    #[test]
    fn diagnostics_json_keeps_configured_temperature_exact() {
        let settings = Settings::parse(r#"{ "ai": { "critique": { "temperature": 0.7 } } }"#).unwrap();
        let config = ResolvedAIConfig::resolve(&settings.ai, KeyLookup::missing());
        let json = AIDiagnostics::from_resolved(&config).to_json();
        assert_eq!(json["models"]["critique"]["temperature"], 0.7);
        assert_eq!(json["models"]["project"]["temperature"], 0.2);
        assert_eq!(json["models"]["material"]["temperature"], 0.15);
    }
}
