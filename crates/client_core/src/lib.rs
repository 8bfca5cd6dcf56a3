//! Certificate lookup core: validation, url construction, existence probing
//! with retry, and the lookup workflow that drives a presentation layer.

pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod probe;
pub mod validation;

pub use config::{ApiConfig, ValidationConfig};
pub use controller::{LookupController, LookupPhase, LookupView, SubmitDisposition};
pub use document::{build_pdf_url, download_filename, DocumentFetcher};
pub use error::LookupError;
pub use probe::{
    build_http_client, ExistenceChecker, ExistenceProbe, HttpProbe, ProbeAttempt, RetryPolicy,
};
pub use validation::{current_year, ValidationRules};

/// Wires the HTTP-backed controller from configuration.
pub fn http_controller<V: LookupView>(
    api: &ApiConfig,
    validation: &ValidationConfig,
    http: reqwest::Client,
    view: V,
) -> Result<LookupController<HttpProbe, V>, LookupError> {
    api.validate()?;
    let rules = ValidationRules::from_config(validation)?;
    let checker = ExistenceChecker::new(
        HttpProbe::new(http, api.timeout()),
        RetryPolicy::from_config(api),
    );
    Ok(LookupController::new(rules, api.base_url.clone(), checker, view))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
