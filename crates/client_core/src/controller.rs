//! The lookup workflow: validate, probe, then display or report.
//!
//! Presentation is delegated to a [`LookupView`]; the controller only decides
//! which intents to emit and in which order.

use shared::{
    domain::{CertificateId, LookupOutcome, ValidationReason, ValidationResult},
    messages::{BilingualMessage, SubmitLabel},
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    document::{build_pdf_url, download_filename},
    probe::{ExistenceChecker, ExistenceProbe},
    validation::{current_year, ValidationRules},
};

/// Presentation collaborator. Implementations render; they never call back
/// into the controller.
pub trait LookupView: Send + Sync {
    fn show_error(&self, message: &BilingualMessage);
    fn clear_error(&self);
    /// Busy indicator on, submission disabled.
    fn show_busy(&self);
    fn hide_busy(&self);
    /// Opens the viewer on `pdf_url` and reveals the download/new-search actions.
    fn display_document(&self, pdf_url: &str);
    fn close_document(&self);
    fn set_submit_label(&self, label: SubmitLabel);
    fn trigger_download(&self, pdf_url: &str, filename: &str);
    /// Clears the error, closes and blanks the viewer, hides the result
    /// actions and restores the default submit label.
    fn reset_view(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupPhase {
    Idle,
    Validating,
    Checking {
        cert_id: CertificateId,
    },
    Displaying {
        cert_id: CertificateId,
        pdf_url: String,
        viewer_open: bool,
    },
    ErrorShown {
        message: BilingualMessage,
    },
}

impl LookupPhase {
    fn is_busy(&self) -> bool {
        matches!(self, LookupPhase::Validating | LookupPhase::Checking { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDisposition {
    /// Another submission is still validating or checking.
    Ignored,
    Invalid {
        reason: ValidationReason,
        message: BilingualMessage,
    },
    Checked(LookupOutcome),
    /// `reset` ran before this submission finished; its result was dropped.
    Superseded,
}

/// The document last handed to [`LookupView::display_document`]. It stays
/// downloadable until `reset`, even after a later search fails.
struct ShownDocument {
    pdf_url: String,
    viewer_open: bool,
}

struct ControllerState {
    phase: LookupPhase,
    input: String,
    generation: u64,
    shown: Option<ShownDocument>,
}

pub struct LookupController<P, V> {
    rules: ValidationRules,
    base_url: String,
    checker: ExistenceChecker<P>,
    view: V,
    inner: Mutex<ControllerState>,
}

impl<P: ExistenceProbe, V: LookupView> LookupController<P, V> {
    pub fn new(
        rules: ValidationRules,
        base_url: impl Into<String>,
        checker: ExistenceChecker<P>,
        view: V,
    ) -> Self {
        Self {
            rules,
            base_url: base_url.into(),
            checker,
            view,
            inner: Mutex::new(ControllerState {
                phase: LookupPhase::Idle,
                input: String::new(),
                generation: 0,
                shown: None,
            }),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub async fn phase(&self) -> LookupPhase {
        self.inner.lock().await.phase.clone()
    }

    pub async fn input(&self) -> String {
        self.inner.lock().await.input.clone()
    }

    pub async fn submit(&self, raw_input: &str) -> SubmitDisposition {
        let generation = {
            let mut inner = self.inner.lock().await;
            if inner.phase.is_busy() {
                debug!("submission ignored; a lookup is already in progress");
                return SubmitDisposition::Ignored;
            }
            inner.input = raw_input.to_string();
            inner.phase = LookupPhase::Validating;
            inner.generation
        };

        let validation = self.rules.validate(raw_input, current_year());

        let (cert_id, pdf_url) = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                return SubmitDisposition::Superseded;
            }
            let cert_id = match validation {
                ValidationResult::Valid { cert_id } => cert_id,
                ValidationResult::Invalid { reason, message } => {
                    debug!(?reason, "certificate id rejected");
                    self.view.show_error(&message);
                    inner.phase = LookupPhase::ErrorShown {
                        message: message.clone(),
                    };
                    return SubmitDisposition::Invalid { reason, message };
                }
            };
            self.view.clear_error();
            self.view.show_busy();
            inner.phase = LookupPhase::Checking {
                cert_id: cert_id.clone(),
            };
            let pdf_url = build_pdf_url(&self.base_url, &cert_id);
            (cert_id, pdf_url)
        };

        info!(cert_id = %cert_id, url = %pdf_url, "checking certificate availability");
        let outcome = self.checker.check_exists(&pdf_url).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            info!(cert_id = %cert_id, "discarding lookup result after reset");
            return SubmitDisposition::Superseded;
        }

        self.view.hide_busy();
        match &outcome {
            LookupOutcome::Found { pdf_url, attempts } => {
                info!(cert_id = %cert_id, attempts, "certificate found");
                self.view.display_document(pdf_url);
                self.view.set_submit_label(SubmitLabel::SearchAgain);
                inner.shown = Some(ShownDocument {
                    pdf_url: pdf_url.clone(),
                    viewer_open: true,
                });
                inner.phase = LookupPhase::Displaying {
                    cert_id,
                    pdf_url: pdf_url.clone(),
                    viewer_open: true,
                };
            }
            LookupOutcome::NotFound { attempts } | LookupOutcome::NetworkError { attempts } => {
                info!(cert_id = %cert_id, attempts, outcome = ?outcome, "certificate unavailable");
                let message = BilingualMessage::certificate_not_found();
                self.view.show_error(&message);
                inner.phase = LookupPhase::ErrorShown { message };
            }
        }
        SubmitDisposition::Checked(outcome)
    }

    /// Records an edit to the input. An error on display is cleared; nothing is revalidated.
    pub async fn input_changed(&self, text: &str) {
        let mut inner = self.inner.lock().await;
        inner.input = text.to_string();
        if matches!(inner.phase, LookupPhase::ErrorShown { .. }) {
            self.view.clear_error();
            inner.phase = LookupPhase::Idle;
        }
    }

    /// Closes the viewer on the shown document. The download and new-search
    /// actions stay available.
    pub async fn close_viewer(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let state = &mut *inner;
        let Some(shown) = state.shown.as_mut().filter(|shown| shown.viewer_open) else {
            return false;
        };
        shown.viewer_open = false;
        if let LookupPhase::Displaying { viewer_open, .. } = &mut state.phase {
            *viewer_open = false;
        }
        self.view.close_document();
        true
    }

    /// Asks the view to save the shown document. Returns the suggested filename.
    pub async fn download(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        let Some(shown) = &inner.shown else {
            debug!("download requested with no certificate shown");
            return None;
        };
        let filename = download_filename(&shown.pdf_url);
        self.view.trigger_download(&shown.pdf_url, &filename);
        Some(filename)
    }

    /// Returns to `Idle` from any phase. Safe to call repeatedly.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if inner.phase.is_busy() {
            // The in-flight check will see the bumped generation and stay silent.
            self.view.hide_busy();
        }
        inner.generation += 1;
        inner.input.clear();
        inner.shown = None;
        inner.phase = LookupPhase::Idle;
        self.view.reset_view();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
