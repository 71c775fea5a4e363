//! Live mode.
//!
//! Reads commands from stdin, one per line, using the same syntax as the
//! one-shot CLI (`add india --time 0930`, `correlate new I100 E100`, ...).
//! A single engine on a current-thread runtime applies them; saves are
//! debounced and the shared board is polled for other crews' changes.
//!
//! Extra keywords: `save` (save now), `pause` / `resume` (stop or restart
//! polling), `quit` / `exit`.

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{apply, Target};
use crate::cli::LiveLine;
use crate::error::{Error, Result};
use crate::sync::{run_live, BoardBackend, LiveEvent, LiveNotice};

/// Execute the live command.
///
/// # Errors
///
/// Returns `BoardNotFound` if there is no board, or `PersistenceFailure`
/// if the final save fails.
pub fn execute(board: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    let target = Target::resolve(board, actor)?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    let result = rt.block_on(run(target, json));
    // The stdin reader may still be parked in a blocking read.
    rt.shutdown_background();
    result
}

async fn run(target: Target, json: bool) -> Result<()> {
    let mut engine = target.open().await?;
    let (tx, rx) = mpsc::channel(32);

    if !json && !crate::is_silent() {
        eprintln!(
            "{} {} as {} ({}). Type 'quit' to leave.",
            "Live:".cyan().bold(),
            engine.backend().location(),
            engine.actor().bold(),
            engine.backend().name()
        );
    }

    let reader = tokio::spawn(read_commands(tx, json));
    run_live(&mut engine, rx, |notice| report(notice, json)).await?;
    reader.abort();
    Ok(())
}

async fn read_commands<B: BoardBackend>(tx: mpsc::Sender<LiveEvent<B>>, json: bool) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };
        let Some(event) = parse_line(&line, json) else {
            continue;
        };
        let quit = matches!(event, LiveEvent::Quit);
        if tx.send(event).await.is_err() || quit {
            break;
        }
    }
    debug!("Live input closed");
}

/// Turn one input line into a loop event. Blank lines, parse errors, and
/// help requests yield `None` after printing what clap has to say.
fn parse_line<B: BoardBackend>(line: &str, json: bool) -> Option<LiveEvent<B>> {
    let words = match split_words(line) {
        Ok(words) => words,
        Err(message) => {
            eprintln!("Error: {message}");
            return None;
        }
    };

    match words.first().map(String::as_str) {
        None => None,
        Some("quit" | "exit") => Some(LiveEvent::Quit),
        Some("save") => Some(LiveEvent::Flush),
        Some("pause") => Some(LiveEvent::Visible(false)),
        Some("resume") => Some(LiveEvent::Visible(true)),
        Some(_) => match LiveLine::try_parse_from(&words) {
            Ok(parsed) => {
                let command = parsed.command;
                Some(LiveEvent::Apply(Box::new(move |engine| {
                    apply(&command, engine, json)
                })))
            }
            Err(e) => {
                if let Err(io) = e.print() {
                    warn!(error = %io, "Failed to print usage");
                }
                None
            }
        },
    }
}

/// Split a line into words, honoring single and double quotes.
fn split_words(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn report(notice: LiveNotice, json: bool) {
    match notice {
        LiveNotice::Output(text) => println!("{text}"),
        LiveNotice::Failed(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if let Some(hint) = e.hint() {
                eprintln!("Error: {e}\n  Hint: {hint}");
            } else {
                eprintln!("Error: {e}");
            }
        }
        LiveNotice::Saved(saved) => {
            debug!(path = %saved.path.display(), hash = %saved.hash, "Live save complete");
        }
        LiveNotice::Reloaded { discarded_local } => {
            if json {
                eprintln!(
                    "{}",
                    serde_json::json!({ "event": "reloaded", "discardedLocal": discarded_local })
                );
            } else if discarded_local {
                eprintln!(
                    "{}",
                    "Board reloaded from a newer save; your unsaved edits were discarded".yellow()
                );
            } else {
                eprintln!("{}", "Board reloaded from a newer save".dimmed());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::FileBackend;

    #[test]
    fn test_split_words_honors_quotes() {
        assert_eq!(
            split_words(r#"add golf --info "two masts, rust hull" --time 0930"#).unwrap(),
            vec!["add", "golf", "--info", "two masts, rust hull", "--time", "0930"]
        );
        assert_eq!(split_words("edit I100 --info ''").unwrap(), vec!["edit", "I100", "--info", ""]);
        assert!(split_words("   ").unwrap().is_empty());
        assert!(split_words("add golf --info \"open").is_err());
    }

    #[test]
    fn test_parse_line_keywords_and_commands() {
        assert!(matches!(parse_line::<FileBackend>("quit", false), Some(LiveEvent::Quit)));
        assert!(matches!(parse_line::<FileBackend>("save", false), Some(LiveEvent::Flush)));
        assert!(matches!(
            parse_line::<FileBackend>("pause", false),
            Some(LiveEvent::Visible(false))
        ));
        assert!(matches!(
            parse_line::<FileBackend>("correlate new I100 E100", false),
            Some(LiveEvent::Apply(_))
        ));
        assert!(parse_line::<FileBackend>("", false).is_none());
        assert!(parse_line::<FileBackend>("frobnicate", false).is_none());
    }
}
