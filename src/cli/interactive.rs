//! Line-driven front end for the conversion form.
//!
//! Input lines mutate the [`Converter`]; fetches run in the background and
//! the form is redrawn whenever a new [`ViewState`] snapshot is published.

use super::ui;
use crate::core::amount;
use crate::core::view::{Converter, FetchTicket, ViewState};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tracing::debug;

const HELP: &str = "\
Commands:
  <amount>          set the amount, e.g. 1.000 or 1000
  amount <amount>   same as above; no value clears the amount
  from <code>       set the source currency
  to <code>         set the target currency
  swap              exchange source and target currencies
  convert           fetch the rate again for the current inputs
  help              show this message
  quit              exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormCommand {
    Amount(String),
    From(String),
    To(String),
    Swap,
    Convert,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<FormCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if amount::to_canonical(line).is_some() {
        return Ok(Some(FormCommand::Amount(line.to_string())));
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };
    let command = match (name.to_ascii_lowercase().as_str(), arg) {
        ("amount" | "a", arg) => FormCommand::Amount(arg.to_string()),
        ("from" | "f", code) if !code.is_empty() => FormCommand::From(code.to_string()),
        ("to" | "t", code) if !code.is_empty() => FormCommand::To(code.to_string()),
        ("from" | "f" | "to" | "t", _) => bail!("Missing currency code for '{}'", name),
        ("swap" | "s", "") => FormCommand::Swap,
        ("convert" | "c", "") => FormCommand::Convert,
        ("help" | "h" | "?", "") => FormCommand::Help,
        ("quit" | "q" | "exit", "") => FormCommand::Quit,
        _ => bail!("Unknown command: {}", line),
    };
    Ok(Some(command))
}

/// Applies a form command and returns the fetch it triggered, if any.
pub async fn apply(converter: &Converter, command: FormCommand) -> Option<FetchTicket> {
    match command {
        FormCommand::Amount(text) => converter.edit_amount(&text).await,
        FormCommand::From(code) => converter.select_source(&code).await,
        FormCommand::To(code) => converter.select_target(&code).await,
        FormCommand::Swap => converter.swap().await,
        FormCommand::Convert => converter.convert().await,
        FormCommand::Help | FormCommand::Quit => None,
    }
}

/// Runs the form over `input` until it is exhausted or `quit` is entered.
///
/// Fetches still in flight at that point are awaited, so the returned state
/// and the last frame printed include their results. With no
/// `provider.timeout_secs` configured a hung request delays the exit.
pub async fn run<R>(converter: Arc<Converter>, input: R) -> Result<ViewState>
where
    R: AsyncBufRead + Unpin,
{
    let mut updates = converter.subscribe();
    let mut lines = input.lines();
    let mut pending = JoinSet::new();

    println!("{}", ui::style_text("Currency Converter", ui::StyleType::Title));
    println!("{}\n", ui::style_text(HELP, ui::StyleType::Subtle));
    println!("{}", ui::render_form(&updates.borrow_and_update()));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    debug!("Input closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(FormCommand::Quit)) => break,
                    Ok(Some(FormCommand::Help)) => println!("{HELP}"),
                    Ok(Some(command)) => {
                        if let Some(ticket) = apply(&converter, command).await {
                            // Completion is observed through `updates`
                            let converter = Arc::clone(&converter);
                            pending.spawn(async move { converter.run(ticket).await });
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                ui::print_separator();
                println!("{}", ui::render_form(&view));
            }
            Some(joined) = pending.join_next(), if !pending.is_empty() => {
                joined.context("Conversion task failed")?;
            }
        }
    }

    if !pending.is_empty() {
        debug!(pending = pending.len(), "Waiting for conversions in flight");
        while let Some(joined) = pending.join_next().await {
            joined.context("Conversion task failed")?;
        }
    }

    let view = converter.snapshot().await;
    if updates.has_changed().unwrap_or(false) {
        ui::print_separator();
        println!("{}", ui::render_form(&view));
    }
    Ok(view)
}
