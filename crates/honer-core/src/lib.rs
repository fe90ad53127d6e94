pub mod export;
pub mod template;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// --- Types ---

/// One optimization request as collected by the UI.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptInput {
    pub original_prompt: String,
    #[serde(default)]
    pub evaluation_criteria: String,
}

impl PromptInput {
    pub fn new(original_prompt: impl Into<String>, evaluation_criteria: impl Into<String>) -> Self {
        Self {
            original_prompt: original_prompt.into(),
            evaluation_criteria: evaluation_criteria.into(),
        }
    }

    /// The UI only submits prompts that are non-empty after trimming.
    pub fn is_submittable(&self) -> bool {
        !self.original_prompt.trim().is_empty()
    }
}

/// The four sections extracted from the model's critique.
///
/// Any field may be empty when the model omitted that section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub scratchpad: String,
    pub analysis: String,
    pub optimized_prompt: String,
    pub key_improvements: String,
}

impl OptimizationResult {
    /// True when the model emitted none of the four sections.
    pub fn is_empty(&self) -> bool {
        self.scratchpad.is_empty()
            && self.analysis.is_empty()
            && self.optimized_prompt.is_empty()
            && self.key_improvements.is_empty()
    }
}

/// Site address and credentials for a single publish attempt. Never persisted.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishConfig {
    /// Site root, partial API root or full post endpoint, e.g. "https://mysite.com"
    pub url: String,
    pub username: String,
    /// CMS application password (not the account login password)
    pub app_password: String,
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

// --- Title derivation ---

pub const FALLBACK_TITLE: &str = "Generated Content";
pub const MAX_TITLE_CHARS: usize = 50;

/// Derive a post/export title from generated text: first line, at most 50
/// characters, with markdown `#` and `*` markers removed.
pub fn derive_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("");
    let title: String = first_line
        .chars()
        .take(MAX_TITLE_CHARS)
        .filter(|c| *c != '#' && *c != '*')
        .collect();
    let title = title.trim();
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title.to_string()
    }
}

// --- Storage ---

pub fn app_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("HONER_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".honer")
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("render {format}: {message}")]
    Render {
        format: &'static str,
        message: String,
    },
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// --- AI Settings ---

pub const DEFAULT_PROVIDER: &str = "google";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variables checked for the API key, in priority order.
pub const API_KEY_VARS: [&str; 3] = ["HONER_API_KEY", "GEMINI_API_KEY", "API_KEY"];

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("AiSettings")
            .field("provider", &self.provider)
            .field("api_key", &key)
            .field("model", &self.model)
            .finish()
    }
}

impl AiSettings {
    /// Overlay process environment on top of these settings.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup` (blank values are ignored).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = non_blank("HONER_PROVIDER") {
            self.provider = provider.trim().to_string();
        }
        if let Some(model) = non_blank("HONER_MODEL") {
            self.model = model.trim().to_string();
        }
        if let Some(key) = API_KEY_VARS.iter().find_map(|name| non_blank(*name)) {
            self.api_key = key.trim().to_string();
        }
        self
    }
}

fn settings_path(dir: &Path) -> PathBuf {
    dir.join("settings.json")
}

pub fn read_settings() -> AiSettings {
    read_settings_from(&app_dir())
}

/// Read `settings.json` from `dir`. Missing or unreadable files yield defaults.
pub fn read_settings_from(dir: &Path) -> AiSettings {
    let path = settings_path(dir);
    if !path.exists() {
        return AiSettings::default();
    }
    match fs::read_to_string(&path).map(|s| serde_json::from_str(&s)) {
        Ok(Ok(settings)) => settings,
        Ok(Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
            AiSettings::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read settings file");
            AiSettings::default()
        }
    }
}

pub fn write_settings(settings: &AiSettings) -> Result<(), StorageError> {
    write_settings_to(&app_dir(), settings)
}

pub fn write_settings_to(dir: &Path, settings: &AiSettings) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
    let json = serde_json::to_string_pretty(settings)?;
    let path = settings_path(dir);
    fs::write(&path, json).map_err(|e| StorageError::io(&path, e))
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}
