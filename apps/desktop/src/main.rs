use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    build_http_client, build_pdf_url, current_year, http_controller, DocumentFetcher,
    LookupPhase, SubmitDisposition, ValidationRules,
};
use serde::Serialize;
use shared::{
    domain::{CertificateId, LookupOutcome, ValidationResult},
    error::{ErrorCode, ErrorReport, LookupFailure},
    messages::BilingualMessage,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing_subscriber::EnvFilter;

mod config;
mod interactive;
mod terminal;

use config::{load_settings, Settings};
use terminal::{RenderMessage, RenderSummary, Renderer, TerminalView, Theme};

#[derive(Parser, Debug)]
#[command(
    name = "certlookup",
    version,
    about = "Tamil Nadu birth certificate lookup by registration number"
)]
struct Cli {
    #[arg(long, global = true, help = "Settings file (default: ./certlookup.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[arg(short, long, global = true, help = "Log at debug level unless RUST_LOG is set")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a registration number offline.
    Validate { id: String },
    /// Print the certificate url for a registration number.
    Url { id: String },
    /// Check whether a certificate exists on the server.
    Lookup {
        id: String,
        #[arg(long, help = "Save the certificate when found")]
        download: bool,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Look up a certificate and save it.
    Download {
        id: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Run repeated lookups from stdin.
    Interactive {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Print the effective settings.
    Config,
}

#[derive(Debug, Serialize)]
struct LookupReport {
    cert_id: CertificateId,
    #[serde(flatten)]
    outcome: LookupOutcome,
    saved: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;
    let json = cli.json;

    match run(cli, settings).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => match err.downcast::<LookupFailure>() {
            Ok(failure) => {
                let code = exit_status(failure.code);
                if json {
                    println!("{}", serde_json::to_string_pretty(&ErrorReport::from(failure))?);
                }
                Ok(ExitCode::from(code))
            }
            Err(err) => Err(err),
        },
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_status(code: ErrorCode) -> u8 {
    match code {
        ErrorCode::InvalidFormat | ErrorCode::YearOutOfRange => 2,
        ErrorCode::NotFound | ErrorCode::NetworkError => 1,
        ErrorCode::DownloadFailed => 3,
    }
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let theme = Theme::from_token(&settings.ui.theme);
    match cli.command {
        Command::Validate { id } => {
            let cert_id = validate(&settings, &id, cli.json, theme)?;
            if cli.json {
                let result = ValidationResult::Valid { cert_id };
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{cert_id} is well formed");
            }
        }
        Command::Url { id } => {
            let cert_id = validate(&settings, &id, cli.json, theme)?;
            let url = build_pdf_url(&settings.api.base_url, &cert_id);
            if cli.json {
                println!("{}", serde_json::json!({ "cert_id": cert_id, "pdf_url": url }));
            } else {
                println!("{url}");
            }
        }
        Command::Lookup { id, download, out } => {
            lookup(&settings, theme, &id, download, out, cli.json).await?;
        }
        Command::Download { id, out } => {
            lookup(&settings, theme, &id, true, out, cli.json).await?;
        }
        Command::Interactive { out } => {
            let http = build_http_client()?;
            let (tx, renderer) = spawn_renderer(&settings, theme, false, http.clone(), out);
            let controller = http_controller(
                &settings.api,
                &settings.validation,
                http,
                TerminalView::new(tx),
            )?;
            interactive::run_session(&controller, &settings.app).await?;
            drop(controller);
            renderer.await.context("renderer task failed")?;
        }
        Command::Config => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                print!("{}", toml::to_string_pretty(&settings)?);
            }
        }
    }
    Ok(())
}

fn validate(settings: &Settings, id: &str, json: bool, theme: Theme) -> Result<CertificateId> {
    let rules = ValidationRules::from_config(&settings.validation)?;
    match rules.validate(id, current_year()) {
        ValidationResult::Valid { cert_id } => Ok(cert_id),
        ValidationResult::Invalid { reason, message } => {
            if !json {
                println!("{}", theme.error(&message));
            }
            Err(LookupFailure::new(reason.into(), message).into())
        }
    }
}

fn spawn_renderer(
    settings: &Settings,
    theme: Theme,
    quiet: bool,
    http: reqwest::Client,
    out: PathBuf,
) -> (
    mpsc::UnboundedSender<RenderMessage>,
    JoinHandle<RenderSummary>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let renderer = Renderer::new(
        theme,
        quiet,
        Duration::from_millis(settings.ui.debounce_delay_ms),
        DocumentFetcher::new(http, settings.api.timeout()),
        out,
    );
    (tx, tokio::spawn(renderer.run(rx)))
}

async fn lookup(
    settings: &Settings,
    theme: Theme,
    id: &str,
    download: bool,
    out: PathBuf,
    json: bool,
) -> Result<()> {
    let http = build_http_client()?;
    let (tx, renderer) = spawn_renderer(settings, theme, json, http.clone(), out);
    let controller = http_controller(
        &settings.api,
        &settings.validation,
        http,
        TerminalView::new(tx),
    )?;

    let disposition = controller.submit(id).await;
    if download {
        if let SubmitDisposition::Checked(outcome) = &disposition {
            if outcome.is_found() {
                controller.download().await;
            }
        }
    }
    let displayed = match controller.phase().await {
        LookupPhase::Displaying { cert_id, .. } => Some(cert_id),
        _ => None,
    };
    // Dropping the controller closes the render channel.
    drop(controller);
    let summary = renderer.await.context("renderer task failed")?;

    let outcome = match disposition {
        SubmitDisposition::Checked(outcome) => outcome,
        SubmitDisposition::Invalid { reason, message } => {
            return Err(LookupFailure::new(reason.into(), message).into())
        }
        SubmitDisposition::Ignored | SubmitDisposition::Superseded => {
            return Err(anyhow!("lookup for {id} did not complete"))
        }
    };

    if let Some(report) = ErrorReport::from_outcome(&outcome) {
        return Err(LookupFailure::from(report).into());
    }
    if !summary.failed_downloads.is_empty() {
        return Err(LookupFailure::new(
            ErrorCode::DownloadFailed,
            BilingualMessage::server_unreachable(),
        )
        .into());
    }

    if json {
        let cert_id = displayed.ok_or_else(|| anyhow!("lookup for {id} found nothing to display"))?;
        let report = LookupReport {
            cert_id,
            outcome,
            saved: summary.saved,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
