use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use client_core::{ApiConfig, ValidationConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "certlookup.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub theme: String,
    /// A check that finishes sooner than this never shows the busy line.
    pub debounce_delay_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: "dark-classic".into(),
            debounce_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub name: String,
    pub name_tamil: String,
    pub version: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Tamil Nadu Birth Certificate Lookup by Registration Number".into(),
            name_tamil: "பதிவு எண் மூலம் தமிழ்நாடு பிறப்புச் சான்றிதழ் தேடல்".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiConfig,
    pub validation: ValidationConfig,
    pub ui: UiSettings,
    pub app: AppInfo,
}

/// Defaults, then the settings file, then `CERTLOOKUP_*` environment overrides.
///
/// A missing default file is fine; an explicit `path` that does not exist is not.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    let mut settings = match fs::read_to_string(&path) {
        Ok(raw) => parse_settings(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound && !required => Settings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
        .api
        .validate()
        .context("invalid [api] settings")?;
    Ok(settings)
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

pub fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CERTLOOKUP_BASE_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = var("CERTLOOKUP_TIMEOUT_MS") {
        override_number(&mut settings.api.timeout_ms, "CERTLOOKUP_TIMEOUT_MS", &v);
    }
    if let Some(v) = var("CERTLOOKUP_RETRY_ATTEMPTS") {
        override_number(&mut settings.api.retry_attempts, "CERTLOOKUP_RETRY_ATTEMPTS", &v);
    }
    if let Some(v) = var("CERTLOOKUP_MIN_YEAR") {
        override_number(&mut settings.validation.min_year, "CERTLOOKUP_MIN_YEAR", &v);
    }
    if let Some(v) = var("CERTLOOKUP_MAX_YEAR") {
        match v.parse() {
            Ok(parsed) => settings.validation.max_year = Some(parsed),
            Err(_) => warn!(key = "CERTLOOKUP_MAX_YEAR", value = %v, "ignoring non-numeric override"),
        }
    }
    if let Some(v) = var("CERTLOOKUP_THEME") {
        settings.ui.theme = v;
    }
}

fn override_number<T: std::str::FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value, "ignoring non-numeric override"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
