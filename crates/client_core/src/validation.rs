use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use shared::{
    domain::{extract_year, normalize_input, CertificateId, ValidationReason, ValidationResult},
    messages::BilingualMessage,
};

use crate::{
    config::{ValidationConfig, DEFAULT_ID_PATTERN, DEFAULT_MIN_YEAR},
    error::LookupError,
};

static DEFAULT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_ID_PATTERN).expect("invalid default id pattern"));

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[derive(Debug, Clone)]
pub struct ValidationRules {
    pattern: Regex,
    min_year: i32,
    max_year: Option<i32>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
            min_year: DEFAULT_MIN_YEAR,
            max_year: None,
        }
    }
}

impl ValidationRules {
    pub fn from_config(config: &ValidationConfig) -> Result<Self, LookupError> {
        let pattern =
            Regex::new(&config.id_pattern).map_err(|source| LookupError::InvalidPattern {
                pattern: config.id_pattern.clone(),
                source,
            })?;
        if let Some(max_year) = config.max_year {
            if max_year < config.min_year {
                return Err(LookupError::InvalidConfig(format!(
                    "max_year {max_year} is before min_year {}",
                    config.min_year
                )));
            }
        }
        Ok(Self {
            pattern,
            min_year: config.min_year,
            max_year: config.max_year,
        })
    }

    pub fn max_year(&self, current_year: i32) -> i32 {
        self.max_year.unwrap_or(current_year)
    }

    /// Normalizes `raw_input` and checks it against the grammar, then the year bounds.
    ///
    /// The range check only runs on input that already matched the grammar, so
    /// malformed input always reports a format error.
    pub fn validate(&self, raw_input: &str, current_year: i32) -> ValidationResult {
        let normalized = normalize_input(raw_input);

        let year = if self.pattern.is_match(&normalized) {
            extract_year(&normalized)
        } else {
            None
        };
        let Some(year) = year else {
            return ValidationResult::Invalid {
                reason: ValidationReason::Format,
                message: BilingualMessage::invalid_format(),
            };
        };

        let max_year = self.max_year(current_year);
        if year < self.min_year || year > max_year {
            return ValidationResult::Invalid {
                reason: ValidationReason::YearRange,
                message: BilingualMessage::invalid_year(self.min_year, max_year),
            };
        }

        ValidationResult::Valid {
            cert_id: CertificateId::from_validated(normalized),
        }
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
