use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "settings.json";

const SETTINGS_VERSION: u32 = 1;

// ── Unknown words ───────────────────────────────────────────────

/// What the compiler does with tokens that resolve to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnknownWordPolicy {
    /// Skip silently. Most words in a sentence are filler.
    #[default]
    Ignore,
    /// Skip, and log each one at `warn`.
    Warn,
}

// ── Settings ────────────────────────────────────────────────────

/// Session settings stored as `settings.json` in a config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub version: u32,
    #[serde(default = "default_separator")]
    pub command_separator: String,
    /// Case-fold tokens before resolution. Quoted text keeps its case.
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub unknown_words: UnknownWordPolicy,
    /// Keyword catalog loaded on top of the demo vocabulary.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

fn default_separator() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            command_separator: default_separator(),
            lowercase: true,
            unknown_words: UnknownWordPolicy::Ignore,
            catalog: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported settings version {found}")]
    UnsupportedVersion { found: u32 },
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

/// Load settings from `config_dir`. Returns `None` if no settings file exists.
pub fn load_settings(config_dir: &Path) -> Result<Option<Settings>, SettingsError> {
    let path = settings_path(config_dir);
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&data)?;
    if settings.version != SETTINGS_VERSION {
        return Err(SettingsError::UnsupportedVersion {
            found: settings.version,
        });
    }
    tracing::debug!(path = %path.display(), "loaded settings");
    Ok(Some(settings))
}

/// Save settings to `config_dir`: write a sibling `.tmp`, then rename over.
pub fn save_settings(config_dir: &Path, settings: &Settings) -> Result<(), SettingsError> {
    fs::create_dir_all(config_dir)?;
    let path = settings_path(config_dir);
    let json = serde_json::to_string_pretty(settings)?;

    let mut tmp_name = OsString::from(SETTINGS_FILE);
    tmp_name.push(".tmp");
    let tmp = config_dir.join(tmp_name);
    fs::write(&tmp, json.as_bytes())?;
    fs::rename(&tmp, &path)?;
    Ok(())
}
