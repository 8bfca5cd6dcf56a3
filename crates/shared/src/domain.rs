use std::fmt;

use serde::{Deserialize, Serialize};

use crate::messages::BilingualMessage;

/// Literal prefix every registration number starts with.
pub const CERTIFICATE_ID_PREFIX: &str = "B-";

/// A normalized birth certificate registration number, `B-YYYY:RR-NNNN-NNNNNN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(String);

impl CertificateId {
    /// Wraps an id that has already been normalized and matched against the grammar.
    pub fn from_validated(normalized: impl Into<String>) -> Self {
        Self(normalized.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> Option<i32> {
        extract_year(&self.0)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CertificateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn normalize_input(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Year digits sit between the two-character prefix and the first `:`.
pub fn extract_year(normalized: &str) -> Option<i32> {
    let head = normalized.split(':').next()?;
    let digits = head.get(CERTIFICATE_ID_PREFIX.len()..)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    Format,
    YearRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid {
        cert_id: CertificateId,
    },
    Invalid {
        reason: ValidationReason,
        message: BilingualMessage,
    },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupOutcome {
    Found { pdf_url: String, attempts: u32 },
    /// The server answered, but never with a success status.
    NotFound { attempts: u32 },
    /// The last attempt failed before any response (transport error or timeout).
    NetworkError { attempts: u32 },
}

impl LookupOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            LookupOutcome::Found { attempts, .. }
            | LookupOutcome::NotFound { attempts }
            | LookupOutcome::NetworkError { attempts } => *attempts,
        }
    }

    pub fn pdf_url(&self) -> Option<&str> {
        match self {
            LookupOutcome::Found { pdf_url, .. } => Some(pdf_url),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
