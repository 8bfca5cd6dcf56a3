use super::*;

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{sync::Notify, time::Instant};

use crate::probe::{ProbeAttempt, RetryPolicy};

const BASE_URL: &str = "https://certs.example.test/esign/signed_CORPBIRTHTAMIL_";
const VALID_INPUT: &str = "b-1990:12-3456-789012";
const PDF_URL: &str =
    "https://certs.example.test/esign/signed_CORPBIRTHTAMIL_B-1990:12-3456-789012.pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewIntent {
    ShowError(BilingualMessage),
    ClearError,
    ShowBusy,
    HideBusy,
    Display(String),
    Close,
    Label(SubmitLabel),
    Download { url: String, filename: String },
    Reset,
}

#[derive(Clone, Default)]
struct RecordingView {
    intents: Arc<StdMutex<Vec<ViewIntent>>>,
}

impl RecordingView {
    fn push(&self, intent: ViewIntent) {
        self.intents.lock().expect("intents lock").push(intent);
    }

    fn take(&self) -> Vec<ViewIntent> {
        std::mem::take(&mut *self.intents.lock().expect("intents lock"))
    }
}

impl LookupView for RecordingView {
    fn show_error(&self, message: &BilingualMessage) {
        self.push(ViewIntent::ShowError(message.clone()));
    }

    fn clear_error(&self) {
        self.push(ViewIntent::ClearError);
    }

    fn show_busy(&self) {
        self.push(ViewIntent::ShowBusy);
    }

    fn hide_busy(&self) {
        self.push(ViewIntent::HideBusy);
    }

    fn display_document(&self, pdf_url: &str) {
        self.push(ViewIntent::Display(pdf_url.to_string()));
    }

    fn close_document(&self) {
        self.push(ViewIntent::Close);
    }

    fn set_submit_label(&self, label: SubmitLabel) {
        self.push(ViewIntent::Label(label));
    }

    fn trigger_download(&self, pdf_url: &str, filename: &str) {
        self.push(ViewIntent::Download {
            url: pdf_url.to_string(),
            filename: filename.to_string(),
        });
    }

    fn reset_view(&self) {
        self.push(ViewIntent::Reset);
    }
}

struct FixedProbe(ProbeAttempt);

#[async_trait]
impl ExistenceProbe for FixedProbe {
    async fn probe(&self, _url: &str) -> ProbeAttempt {
        self.0.clone()
    }
}

/// Holds every attempt until the test releases it.
struct GatedProbe {
    release: Arc<Notify>,
}

#[async_trait]
impl ExistenceProbe for GatedProbe {
    async fn probe(&self, _url: &str) -> ProbeAttempt {
        self.release.notified().await;
        ProbeAttempt::Available { status: 200 }
    }
}

fn controller_with<P: ExistenceProbe>(probe: P) -> (LookupController<P, RecordingView>, RecordingView) {
    let view = RecordingView::default();
    let controller = LookupController::new(
        ValidationRules::default(),
        BASE_URL,
        ExistenceChecker::new(probe, RetryPolicy::default()),
        view.clone(),
    );
    (controller, view)
}

fn found_controller() -> (LookupController<FixedProbe, RecordingView>, RecordingView) {
    controller_with(FixedProbe(ProbeAttempt::Available { status: 200 }))
}

async fn wait_for_checking<P: ExistenceProbe, V: LookupView>(controller: &LookupController<P, V>) {
    while !matches!(controller.phase().await, LookupPhase::Checking { .. }) {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn found_certificate_is_displayed_without_delay() {
    let (controller, view) = found_controller();

    let started = Instant::now();
    let disposition = controller.submit(VALID_INPUT).await;

    assert_eq!(
        disposition,
        SubmitDisposition::Checked(LookupOutcome::Found {
            pdf_url: PDF_URL.to_string(),
            attempts: 1,
        })
    );
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(
        view.take(),
        vec![
            ViewIntent::ClearError,
            ViewIntent::ShowBusy,
            ViewIntent::HideBusy,
            ViewIntent::Display(PDF_URL.to_string()),
            ViewIntent::Label(SubmitLabel::SearchAgain),
        ]
    );
    assert_eq!(
        controller.phase().await,
        LookupPhase::Displaying {
            cert_id: CertificateId::from_validated("B-1990:12-3456-789012"),
            pdf_url: PDF_URL.to_string(),
            viewer_open: true,
        }
    );
}

#[tokio::test]
async fn invalid_input_shows_error_and_keeps_input() {
    let (controller, view) = found_controller();

    let disposition = controller.submit("garbage").await;

    assert_eq!(
        disposition,
        SubmitDisposition::Invalid {
            reason: ValidationReason::Format,
            message: BilingualMessage::invalid_format(),
        }
    );
    assert_eq!(
        view.take(),
        vec![ViewIntent::ShowError(BilingualMessage::invalid_format())]
    );
    assert_eq!(
        controller.phase().await,
        LookupPhase::ErrorShown {
            message: BilingualMessage::invalid_format(),
        }
    );
    assert_eq!(controller.input().await, "garbage");
}

#[tokio::test]
async fn out_of_range_year_never_probes() {
    let (controller, view) = found_controller();

    let disposition = controller.submit("B-1900:12-3456-789012").await;

    assert!(matches!(
        disposition,
        SubmitDisposition::Invalid {
            reason: ValidationReason::YearRange,
            ..
        }
    ));
    let intents = view.take();
    assert_eq!(intents.len(), 1);
    assert!(matches!(&intents[0], ViewIntent::ShowError(message) if message.english.starts_with("Invalid year")));
}

#[tokio::test(start_paused = true)]
async fn exhausted_probe_shows_not_found_and_reenables_submission() {
    let (controller, view) = controller_with(FixedProbe(ProbeAttempt::Transport(
        "dns failure".into(),
    )));

    let started = Instant::now();
    let disposition = controller.submit(VALID_INPUT).await;

    assert_eq!(
        disposition,
        SubmitDisposition::Checked(LookupOutcome::NetworkError { attempts: 4 })
    );
    assert_eq!(started.elapsed(), Duration::from_millis(6000));
    assert_eq!(
        view.take(),
        vec![
            ViewIntent::ClearError,
            ViewIntent::ShowBusy,
            ViewIntent::HideBusy,
            ViewIntent::ShowError(BilingualMessage::certificate_not_found()),
        ]
    );
    assert!(matches!(
        controller.phase().await,
        LookupPhase::ErrorShown { .. }
    ));
    assert_eq!(controller.input().await, VALID_INPUT);

    // Busy is hidden, so a corrected id can be submitted straight away.
    assert!(matches!(
        controller.submit(VALID_INPUT).await,
        SubmitDisposition::Checked(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn http_miss_uses_the_same_message_as_network_failure() {
    let (controller, view) = controller_with(FixedProbe(ProbeAttempt::Unavailable {
        status: 404,
    }));

    let disposition = controller.submit(VALID_INPUT).await;

    assert_eq!(
        disposition,
        SubmitDisposition::Checked(LookupOutcome::NotFound { attempts: 4 })
    );
    assert_eq!(
        view.take().last(),
        Some(&ViewIntent::ShowError(BilingualMessage::certificate_not_found()))
    );
}

#[tokio::test]
async fn editing_input_clears_a_shown_error() {
    let (controller, view) = found_controller();
    controller.submit("garbage").await;
    view.take();

    controller.input_changed("B-1990").await;

    assert_eq!(view.take(), vec![ViewIntent::ClearError]);
    assert_eq!(controller.phase().await, LookupPhase::Idle);
    assert_eq!(controller.input().await, "B-1990");
}

#[tokio::test]
async fn editing_input_without_error_emits_nothing() {
    let (controller, view) = found_controller();

    controller.input_changed("B-19").await;

    assert!(view.take().is_empty());
    assert_eq!(controller.phase().await, LookupPhase::Idle);
}

#[tokio::test]
async fn reset_is_idempotent() {
    let (controller, view) = found_controller();
    controller.submit(VALID_INPUT).await;
    view.take();

    controller.reset().await;
    let after_one = (controller.phase().await, controller.input().await);
    controller.reset().await;
    let after_two = (controller.phase().await, controller.input().await);

    assert_eq!(after_one, (LookupPhase::Idle, String::new()));
    assert_eq!(after_one, after_two);
    assert_eq!(view.take(), vec![ViewIntent::Reset, ViewIntent::Reset]);
}

#[tokio::test]
async fn second_submission_while_checking_is_ignored() {
    let release = Arc::new(Notify::new());
    let (controller, view) = controller_with(GatedProbe {
        release: Arc::clone(&release),
    });
    let controller = Arc::new(controller);

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit(VALID_INPUT).await })
    };
    wait_for_checking(&controller).await;

    assert_eq!(
        controller.submit("B-2000:12-3456-789012").await,
        SubmitDisposition::Ignored
    );

    release.notify_one();
    let disposition = first.await.expect("join");
    assert!(matches!(disposition, SubmitDisposition::Checked(outcome) if outcome.is_found()));
    assert_eq!(
        view.take()
            .iter()
            .filter(|intent| **intent == ViewIntent::ShowBusy)
            .count(),
        1
    );
}

#[tokio::test]
async fn reset_while_checking_discards_the_late_result() {
    let release = Arc::new(Notify::new());
    let (controller, view) = controller_with(GatedProbe {
        release: Arc::clone(&release),
    });
    let controller = Arc::new(controller);

    let pending = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit(VALID_INPUT).await })
    };
    wait_for_checking(&controller).await;

    controller.reset().await;
    release.notify_one();

    assert_eq!(pending.await.expect("join"), SubmitDisposition::Superseded);
    assert_eq!(controller.phase().await, LookupPhase::Idle);
    assert_eq!(
        view.take(),
        vec![
            ViewIntent::ClearError,
            ViewIntent::ShowBusy,
            ViewIntent::HideBusy,
            ViewIntent::Reset,
        ]
    );
}

#[tokio::test]
async fn download_uses_the_displayed_document() {
    let (controller, view) = found_controller();
    assert_eq!(controller.download().await, None);

    controller.submit(VALID_INPUT).await;
    view.take();

    let filename = controller.download().await;

    assert_eq!(
        filename.as_deref(),
        Some("TN_Birth_Certificate_B-1990:12-3456-789012.pdf")
    );
    assert_eq!(
        view.take(),
        vec![ViewIntent::Download {
            url: PDF_URL.to_string(),
            filename: "TN_Birth_Certificate_B-1990:12-3456-789012.pdf".to_string(),
        }]
    );
}

#[tokio::test]
async fn closing_the_viewer_keeps_the_result_actions() {
    let (controller, view) = found_controller();
    assert!(!controller.close_viewer().await);

    controller.submit(VALID_INPUT).await;
    view.take();

    assert!(controller.close_viewer().await);
    assert!(!controller.close_viewer().await);
    assert_eq!(view.take(), vec![ViewIntent::Close]);
    assert!(matches!(
        controller.phase().await,
        LookupPhase::Displaying {
            viewer_open: false,
            ..
        }
    ));
    assert!(controller.download().await.is_some());
}

#[tokio::test]
async fn search_again_is_accepted_while_displaying() {
    let (controller, _view) = found_controller();
    controller.submit(VALID_INPUT).await;

    let disposition = controller.submit("B-2001:05-0001-000042").await;

    assert!(matches!(disposition, SubmitDisposition::Checked(outcome) if outcome.is_found()));
    assert!(matches!(
        controller.phase().await,
        LookupPhase::Displaying { cert_id, .. } if cert_id.as_str() == "B-2001:05-0001-000042"
    ));
}

#[tokio::test]
async fn invalid_search_again_keeps_the_shown_document_actionable() {
    let (controller, view) = found_controller();
    controller.submit(VALID_INPUT).await;
    view.take();

    let disposition = controller.submit("garbage").await;

    assert!(matches!(disposition, SubmitDisposition::Invalid { .. }));
    assert!(matches!(
        controller.phase().await,
        LookupPhase::ErrorShown { .. }
    ));
    assert_eq!(
        controller.download().await.as_deref(),
        Some("TN_Birth_Certificate_B-1990:12-3456-789012.pdf")
    );
    assert!(controller.close_viewer().await);
    assert_eq!(
        view.take(),
        vec![
            ViewIntent::ShowError(BilingualMessage::invalid_format()),
            ViewIntent::Download {
                url: PDF_URL.to_string(),
                filename: "TN_Birth_Certificate_B-1990:12-3456-789012.pdf".to_string(),
            },
            ViewIntent::Close,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_search_again_keeps_the_previous_document() {
    let probe = ScriptedAvailability::new([true, false]);
    let (controller, view) = controller_with(probe);
    controller.submit(VALID_INPUT).await;
    view.take();

    let disposition = controller.submit("B-2001:05-0001-000042").await;

    assert_eq!(
        disposition,
        SubmitDisposition::Checked(LookupOutcome::NotFound { attempts: 4 })
    );
    let filename = controller.download().await;
    assert_eq!(
        filename.as_deref(),
        Some("TN_Birth_Certificate_B-1990:12-3456-789012.pdf")
    );
    assert!(matches!(
        view.take().last(),
        Some(ViewIntent::Download { url, .. }) if url == PDF_URL
    ));
}

#[tokio::test]
async fn reset_forgets_the_shown_document() {
    let (controller, view) = found_controller();
    controller.submit(VALID_INPUT).await;
    controller.reset().await;
    view.take();

    assert_eq!(controller.download().await, None);
    assert!(!controller.close_viewer().await);
    assert!(view.take().is_empty());
}

/// Answers the first lookup with the first flag, every later one with the second.
struct ScriptedAvailability {
    calls: StdMutex<u32>,
    first: bool,
    rest: bool,
}

impl ScriptedAvailability {
    fn new([first, rest]: [bool; 2]) -> Self {
        Self {
            calls: StdMutex::new(0),
            first,
            rest,
        }
    }
}

#[async_trait]
impl ExistenceProbe for ScriptedAvailability {
    async fn probe(&self, _url: &str) -> ProbeAttempt {
        let available = {
            let mut calls = self.calls.lock().expect("calls lock");
            *calls += 1;
            if *calls == 1 {
                self.first
            } else {
                self.rest
            }
        };
        if available {
            ProbeAttempt::Available { status: 200 }
        } else {
            ProbeAttempt::Unavailable { status: 404 }
        }
    }
}
