use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::error;
use vasini_store::{SurveyService, UserId};
use vasini_survey::{Action, Inbound, Reply};

const CONSOLE_USER: UserId = 0;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ConsoleInput {
    Inbound(Inbound),
    Help,
    Quit,
    Empty,
}

/// Console command standing in for a button press.
pub(crate) fn command_for(action: Action) -> &'static str {
    match action {
        Action::StartSurvey => ":start",
        Action::BeginInventory => ":ready",
        Action::CancelSurvey => ":cancel",
        Action::Confirm => ":yes",
        Action::Decline => ":no",
        Action::ViewProfile => ":profile",
        Action::RequestAdvice => ":advice",
        Action::ResetProfile => ":reset",
        Action::MainMenu => ":menu",
    }
}

pub(crate) fn parse_console_line(line: &str) -> ConsoleInput {
    let line = line.trim();
    match line {
        "" => ConsoleInput::Empty,
        ":quit" | ":exit" => ConsoleInput::Quit,
        ":help" => ConsoleInput::Help,
        _ => Action::ALL
            .into_iter()
            .find(|action| command_for(*action) == line)
            .map(|action| ConsoleInput::Inbound(Inbound::Action(action)))
            .unwrap_or_else(|| ConsoleInput::Inbound(Inbound::text(line))),
    }
}

pub(crate) fn format_reply(reply: &Reply) -> String {
    let mut out = reply.render_text();
    if let Reply::ProfilePart { index, count, .. } = reply {
        if *count > 1 {
            out = format!("[part {}/{}]\n{out}", index + 1, count);
        }
    }
    for action in reply.actions() {
        let _ = write!(out, "\n  {:<9} {}", command_for(action), action.label());
    }
    out
}

fn help_text() -> String {
    let mut out = String::from("commands:");
    for action in Action::ALL {
        let _ = write!(out, "\n  {:<9} {}", command_for(action), action.label());
    }
    out.push_str("\n  :help     this list\n  :quit     leave the console\nanything else is sent as an answer");
    out
}

/// Drive a single session from stdin, printing replies as they stream in.
pub(crate) async fn run_console(service: Arc<SurveyService>) -> Result<()> {
    println!("console session; type :help for commands, :quit to leave");
    handle_line(&service, Inbound::Action(Action::MainMenu)).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_console_line(&line) {
            ConsoleInput::Empty => continue,
            ConsoleInput::Quit => break,
            ConsoleInput::Help => println!("{}", help_text()),
            ConsoleInput::Inbound(inbound) => handle_line(&service, inbound).await,
        }
    }

    println!("session closed");
    Ok(())
}

async fn handle_line(service: &SurveyService, inbound: Inbound) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Reply>();
    let printer = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            println!("{}\n", format_reply(&reply));
        }
    });

    let result = service.handle(CONSOLE_USER, inbound, &tx).await;
    drop(tx);
    let _ = printer.await;

    if let Err(err) = result {
        error!(error = %err, "console event failed");
        eprintln!("error: {err}");
    }
}
