// Application settings
// Loaded from ~/.config/woodshu/settings.json (or $WOODSHU_CONFIG)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use woodshu_engine::completion::ModelParams;
use woodshu_engine::session::SessionParams;

/// Environment variable overriding the settings file location
pub const CONFIG_ENV: &str = "WOODSHU_CONFIG";

/// Optional per-page overrides of the model parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(rename = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelOverride {
    fn apply(&self, mut params: ModelParams) -> ModelParams {
        if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            params.model = model.to_string();
        }
        if self.temperature.is_some() {
            params.temperature = self.temperature;
        }
        if self.max_tokens.is_some() {
            params.max_tokens = self.max_tokens;
        }
        params
    }
}

/// AI-specific settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    /// Model for every page (empty = built-in default)
    pub model: String,

    /// OpenAI-compatible endpoint (None = api.openai.com)
    #[serde(rename = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub critique: ModelOverride,
    pub project: ModelOverride,
    pub material: ModelOverride,
}

impl AISettings {
    /// Resolve the model parameters for every page.
    ///
    /// Built-in defaults, then `ai.model`, then the page override.
    /// Temperatures are clamped into `[0, 1]`.
    pub fn session_params(&self) -> SessionParams {
        let base = |params: ModelParams| {
            if self.model.is_empty() {
                params
            } else {
                ModelParams { model: self.model.clone(), ..params }
            }
        };
        SessionParams {
            critique: self.critique.apply(base(ModelParams::critique())).normalized(),
            project: self.project.apply(base(ModelParams::project())).normalized(),
            material: self.material.apply(base(ModelParams::material())).normalized(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Reference dataset
    #[serde(rename = "data.referencePath", skip_serializing_if = "Option::is_none")]
    pub reference_path: Option<PathBuf>,

    // AI
    #[serde(rename = "ai")]
    pub ai: AISettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("woodshu")
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path. A missing file is created with defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(path);
            return settings;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Reference dataset (CSV with Common Name and the five index columns)
    // "data.referencePath": "data/woodHardness.csv",

    // AI
    // API keys are read from the system keychain or OPENAI_API_KEY,
    // never from this file
    "ai": {
        "model": "",
        // "baseUrl": "https://api.openai.com/v1",
        "critique": { "maxTokens": 2000 },
        "project": { "temperature": 0.2 },
        "material": { "temperature": 0.15 }
    }
}
"#;

        match fs::write(path, default_config) {
            Ok(()) => log::info!("wrote default settings to {}", path.display()),
            Err(e) => log::warn!("error writing default settings.json: {}", e),
        }
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
