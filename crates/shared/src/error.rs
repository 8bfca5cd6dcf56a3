use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{LookupOutcome, ValidationReason},
    messages::BilingualMessage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidFormat,
    YearOutOfRange,
    NotFound,
    NetworkError,
    DownloadFailed,
}

impl From<ValidationReason> for ErrorCode {
    fn from(value: ValidationReason) -> Self {
        match value {
            ValidationReason::Format => ErrorCode::InvalidFormat,
            ValidationReason::YearRange => ErrorCode::YearOutOfRange,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: BilingualMessage,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: BilingualMessage) -> Self {
        Self { code, message }
    }

    /// Both unsuccessful outcomes share one user-facing message; only the code differs.
    pub fn from_outcome(outcome: &LookupOutcome) -> Option<Self> {
        let code = match outcome {
            LookupOutcome::Found { .. } => return None,
            LookupOutcome::NotFound { .. } => ErrorCode::NotFound,
            LookupOutcome::NetworkError { .. } => ErrorCode::NetworkError,
        };
        Some(Self::new(code, BilingualMessage::certificate_not_found()))
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct LookupFailure {
    pub code: ErrorCode,
    pub message: BilingualMessage,
}

impl LookupFailure {
    pub fn new(code: ErrorCode, message: BilingualMessage) -> Self {
        Self { code, message }
    }
}

impl From<LookupFailure> for ErrorReport {
    fn from(value: LookupFailure) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<ErrorReport> for LookupFailure {
    fn from(value: ErrorReport) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}
