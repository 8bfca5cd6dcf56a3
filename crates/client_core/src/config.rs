//! Lookup settings consumed by the core. Every field has a built-in default so
//! the workflow runs with no configuration at all.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::LookupError;

pub const DEFAULT_BASE_URL: &str =
    "https://www.crstn.org/birth_death_tn/CORPBIRTHTAMIL/esign/signed_CORPBIRTHTAMIL_";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_ID_PATTERN: &str = r"^B-\d{4}:\d{2}-\d{4}-\d{6}$";
pub const DEFAULT_MIN_YEAR: i32 = 1950;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), LookupError> {
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            LookupError::InvalidConfig(format!("base_url `{}` is not a url: {e}", self.base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LookupError::InvalidConfig(format!(
                "base_url must use http or https, got `{}`",
                parsed.scheme()
            )));
        }
        if self.timeout_ms == 0 {
            return Err(LookupError::InvalidConfig(
                "timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub id_pattern: String,
    pub min_year: i32,
    /// `None` means "the current calendar year when validating".
    pub max_year: Option<i32>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            id_pattern: DEFAULT_ID_PATTERN.into(),
            min_year: DEFAULT_MIN_YEAR,
            max_year: None,
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
