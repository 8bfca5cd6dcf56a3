//! Terminal rendering for the lookup workflow.
//!
//! [`TerminalView`] turns controller callbacks into [`RenderMessage`]s on a
//! channel; [`Renderer`] owns stdout and performs downloads, so the controller
//! never blocks on either.

use std::{path::PathBuf, time::Duration};

use client_core::{DocumentFetcher, LookupView};
use shared::messages::{BilingualMessage, SubmitLabel};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    DarkClassic,
    Plain,
}

impl Theme {
    pub fn from_token(token: &str) -> Self {
        match token {
            "dark-classic" => Theme::DarkClassic,
            "plain" => Theme::Plain,
            other => {
                warn!(theme = other, "unknown ui theme; using plain output");
                Theme::Plain
            }
        }
    }

    fn paint(self, color: &str, text: &str) -> String {
        match self {
            Theme::DarkClassic => format!("\x1b[{color}m{text}\x1b[0m"),
            Theme::Plain => text.to_string(),
        }
    }

    pub fn error(self, message: &BilingualMessage) -> String {
        format!(
            "{}\n  {}",
            self.paint("1;31", &message.english),
            self.paint("2", &message.tamil)
        )
    }

    fn success(self, text: &str) -> String {
        self.paint("1;32", text)
    }

    fn hint(self, text: &str) -> String {
        self.paint("2", text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewIntent {
    ShowError(BilingualMessage),
    ClearError,
    ShowBusy,
    HideBusy,
    DisplayDocument(String),
    CloseDocument,
    SubmitLabel(SubmitLabel),
    Download { url: String, filename: String },
    Reset,
}

pub enum RenderMessage {
    Intent(ViewIntent),
    /// Acknowledged once every earlier message has been rendered.
    Barrier(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct TerminalView {
    tx: mpsc::UnboundedSender<RenderMessage>,
}

impl TerminalView {
    pub fn new(tx: mpsc::UnboundedSender<RenderMessage>) -> Self {
        Self { tx }
    }

    fn send(&self, intent: ViewIntent) {
        if self.tx.send(RenderMessage::Intent(intent)).is_err() {
            debug!("renderer stopped; dropping view intent");
        }
    }

    /// Waits until the renderer has caught up with everything sent so far.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(RenderMessage::Barrier(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

impl LookupView for TerminalView {
    fn show_error(&self, message: &BilingualMessage) {
        self.send(ViewIntent::ShowError(message.clone()));
    }

    fn clear_error(&self) {
        self.send(ViewIntent::ClearError);
    }

    fn show_busy(&self) {
        self.send(ViewIntent::ShowBusy);
    }

    fn hide_busy(&self) {
        self.send(ViewIntent::HideBusy);
    }

    fn display_document(&self, pdf_url: &str) {
        self.send(ViewIntent::DisplayDocument(pdf_url.to_string()));
    }

    fn close_document(&self) {
        self.send(ViewIntent::CloseDocument);
    }

    fn set_submit_label(&self, label: SubmitLabel) {
        self.send(ViewIntent::SubmitLabel(label));
    }

    fn trigger_download(&self, pdf_url: &str, filename: &str) {
        self.send(ViewIntent::Download {
            url: pdf_url.to_string(),
            filename: filename.to_string(),
        });
    }

    fn reset_view(&self) {
        self.send(ViewIntent::Reset);
    }
}

#[derive(Debug, Default)]
pub struct RenderSummary {
    pub displayed: Option<String>,
    pub saved: Vec<PathBuf>,
    pub failed_downloads: Vec<String>,
    /// Every line written to stdout, in order. Empty in quiet mode.
    pub transcript: Vec<String>,
}

pub struct Renderer {
    theme: Theme,
    /// Machine-readable mode: render nothing, only perform downloads.
    quiet: bool,
    busy_delay: Duration,
    fetcher: DocumentFetcher,
    out_dir: PathBuf,
    transcript: Vec<String>,
}

impl Renderer {
    pub fn new(
        theme: Theme,
        quiet: bool,
        busy_delay: Duration,
        fetcher: DocumentFetcher,
        out_dir: PathBuf,
    ) -> Self {
        Self {
            theme,
            quiet,
            busy_delay,
            fetcher,
            out_dir,
            transcript: Vec::new(),
        }
    }

    fn print(&mut self, text: impl Into<String>) {
        if !self.quiet {
            let line = text.into();
            println!("{line}");
            self.transcript.push(line);
        }
    }

    /// Renders until every [`TerminalView`] sender is dropped.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RenderMessage>) -> RenderSummary {
        let mut summary = RenderSummary::default();
        // When the busy line is due. A delay too large to represent never shows it.
        let mut busy_deadline: Option<tokio::time::Instant> = None;

        loop {
            let message = match busy_deadline {
                Some(deadline) => {
                    tokio::select! {
                        message = rx.recv() => message,
                        _ = tokio::time::sleep_until(deadline) => {
                            self.print(self.theme.hint("Checking certificate… / சான்றிதழ் சரிபார்க்கப்படுகிறது…"));
                            busy_deadline = None;
                            continue;
                        }
                    }
                }
                None => rx.recv().await,
            };
            let Some(message) = message else {
                break;
            };

            let intent = match message {
                RenderMessage::Barrier(ack) => {
                    let _ = ack.send(());
                    continue;
                }
                RenderMessage::Intent(intent) => intent,
            };

            match intent {
                ViewIntent::ShowBusy => {
                    busy_deadline = tokio::time::Instant::now().checked_add(self.busy_delay);
                }
                ViewIntent::HideBusy => busy_deadline = None,
                ViewIntent::ShowError(message) => self.print(self.theme.error(&message)),
                ViewIntent::ClearError => {}
                ViewIntent::DisplayDocument(url) => {
                    self.print(self.theme.success("Certificate found / சான்றிதழ் கிடைத்தது"));
                    self.print(format!("  {url}"));
                    summary.displayed = Some(url);
                }
                ViewIntent::CloseDocument => {
                    self.print(self.theme.hint("Viewer closed; :download is still available."));
                }
                ViewIntent::SubmitLabel(label) => {
                    let text = label.text();
                    self.print(self.theme.hint(&format!(
                        "Enter an id to {} / {}",
                        text.english.to_lowercase(),
                        text.tamil
                    )));
                }
                ViewIntent::Download { url, filename } => {
                    let saved = self.fetcher.download(&url, &self.out_dir).await;
                    match saved {
                        Ok(path) => {
                            self.print(self.theme.success(&format!("Saved {}", path.display())));
                            summary.saved.push(path);
                        }
                        Err(err) => {
                            error!(%url, %filename, error = %err, "certificate download failed");
                            self.print(self.theme.error(&BilingualMessage::server_unreachable()));
                            summary.failed_downloads.push(url);
                        }
                    }
                }
                ViewIntent::Reset => {
                    summary.displayed = None;
                    self.print(self.theme.hint("Ready for a new search / புதிய தேடலுக்கு தயார்"));
                }
            }
        }

        summary.transcript = self.transcript;
        summary
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
