use std::io::Write;

use anyhow::Context;
use client_core::{ExistenceProbe, LookupController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::{config::AppInfo, terminal::TerminalView};

const HELP: &str = "\
Type a registration number (B-YYYY:XX-XXXX-XXXXXX) and press enter to look it up.
  :download  save the displayed certificate
  :close     close the viewer, keep the result
  :reset     start a new search
  :help      show this text
  :quit      leave (ctrl-d works too)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand<'a> {
    Submit(&'a str),
    Download,
    Close,
    Reset,
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

impl<'a> SessionCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return SessionCommand::Empty;
        }
        let Some(command) = trimmed.strip_prefix(':') else {
            return SessionCommand::Submit(line);
        };
        match command.to_ascii_lowercase().as_str() {
            "download" | "d" => SessionCommand::Download,
            "close" | "c" => SessionCommand::Close,
            "reset" | "new" | "r" => SessionCommand::Reset,
            "help" | "h" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            _ => SessionCommand::Unknown(trimmed),
        }
    }
}

pub async fn run_session<P: ExistenceProbe>(
    controller: &LookupController<P, TerminalView>,
    app: &AppInfo,
) -> anyhow::Result<()> {
    println!("{} v{}", app.name, app.version);
    println!("{}", app.name_tamil);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        controller.view().flush().await;
        print!("certificate id> ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            println!();
            break;
        };

        match SessionCommand::parse(&line) {
            SessionCommand::Empty => {}
            SessionCommand::Quit => break,
            SessionCommand::Help => println!("{HELP}"),
            SessionCommand::Unknown(command) => println!("unknown command {command}; try :help"),
            SessionCommand::Download => {
                if controller.download().await.is_none() {
                    println!("No certificate is displayed yet.");
                }
            }
            SessionCommand::Close => {
                if !controller.close_viewer().await {
                    println!("The viewer is not open.");
                }
            }
            SessionCommand::Reset => controller.reset().await,
            SessionCommand::Submit(text) => {
                controller.input_changed(text).await;
                let disposition = controller.submit(text).await;
                debug!(?disposition, "interactive submission finished");
            }
        }
    }

    controller.view().flush().await;
    Ok(())
}

#[cfg(test)]
#[path = "tests/interactive_tests.rs"]
mod tests;
