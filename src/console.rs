//! Interactive operator console
//!
//! Reads one command per line from stdin. Operations run as spawned tasks,
//! so a slow batch does not block a single prediction typed after it.
//! Visible panels are re-rendered from result-updated events.

use crate::client::PredictionClient;
use crate::display::{DisplayToggles, ResultPanel};
use crate::transport::Transport;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

pub const HELP: &str = "\
commands:
  predict <json>     score one transaction given as a JSON object
  batch <path>       score the JSON array of transactions in <path>
  generate [n]       synthesize n transactions (default 10) and score them
  toggle <name>      flip showSingleResult or showBatchResult
  show               print the visible result panels
  stats              print request statistics
  help               this text
  quit               leave the console";

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Predict(String),
    Batch(PathBuf),
    Generate(Option<i64>),
    Toggle(ResultPanel),
    Show,
    Stats,
    Help,
    Quit,
}

impl Command {
    /// Parse a console line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "predict" if rest.is_empty() => return Err("usage: predict <json>".to_string()),
            "predict" => Command::Predict(rest.to_string()),
            "batch" if rest.is_empty() => return Err("usage: batch <path>".to_string()),
            "batch" => Command::Batch(PathBuf::from(rest)),
            "generate" if rest.is_empty() => Command::Generate(None),
            "generate" => Command::Generate(Some(
                rest.parse()
                    .map_err(|_| format!("count must be an integer, got {rest:?}"))?,
            )),
            "toggle" => Command::Toggle(rest.parse()?),
            "show" => Command::Show,
            "stats" => Command::Stats,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command {other:?}, try `help`")),
        };
        Ok(Some(command))
    }
}

/// Render one panel from the client's cache
pub fn render_panel<T: Transport>(client: &PredictionClient<T>, panel: ResultPanel) -> String {
    match panel {
        ResultPanel::SingleResult => match client.single_entry() {
            Some(entry) => {
                let score = entry
                    .value
                    .score()
                    .map(|s| format!("\n{s}"))
                    .unwrap_or_default();
                format!(
                    "[single result #{} at {}]{}\n{}",
                    entry.sequence,
                    entry.received_at.format("%H:%M:%S"),
                    score,
                    entry.value
                )
            }
            None => "[single result] none yet".to_string(),
        },
        ResultPanel::BatchResult => match client.batch_entry() {
            Some(entry) => {
                let entries = entry
                    .value
                    .entries()
                    .map(|e| format!(" ({} entries)", e.len()))
                    .unwrap_or_default();
                format!(
                    "[batch result #{} at {}]{}\n{}",
                    entry.sequence,
                    entry.received_at.format("%H:%M:%S"),
                    entries,
                    entry.value
                )
            }
            None => "[batch result] none yet".to_string(),
        },
    }
}

fn visible(toggles: &Mutex<DisplayToggles>, panel: ResultPanel) -> bool {
    match toggles.lock() {
        Ok(t) => t.is_visible(panel),
        Err(poisoned) => poisoned.into_inner().is_visible(panel),
    }
}

/// Run the console until `quit` or end of input
pub async fn run<T: Transport + 'static>(client: Arc<PredictionClient<T>>) -> Result<()> {
    let toggles = Arc::new(Mutex::new(DisplayToggles::new()));

    let mut events = client.subscribe();
    let listener = {
        let client = client.clone();
        let toggles = toggles.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let panel = match event.kind {
                            crate::cache::ResultKind::Single => ResultPanel::SingleResult,
                            crate::cache::ResultKind::Batch => ResultPanel::BatchResult,
                        };
                        info!(panel = %panel, sequence = event.sequence, "Result updated");
                        if visible(&toggles, panel) {
                            println!("{}", render_panel(&*client, panel));
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Console fell behind on result events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            Command::Predict(text) => {
                let client = client.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.predict_single_text(&text).await {
                        println!("predict failed ({}): {e}", e.kind());
                    }
                });
            }
            Command::Batch(path) => {
                let client = client.clone();
                tokio::spawn(async move {
                    let text = match tokio::fs::read_to_string(&path).await {
                        Ok(text) => text,
                        Err(e) => {
                            println!("cannot read {}: {e}", path.display());
                            return;
                        }
                    };
                    if let Err(e) = client.predict_batch_text(&text).await {
                        println!("batch failed ({}): {e}", e.kind());
                    }
                });
            }
            Command::Generate(count) => {
                let client = client.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.generate_then_predict(count).await {
                        println!("generate failed ({}, cause: {}): {e}", e.kind(), e.root_kind());
                    }
                });
            }
            Command::Toggle(panel) => {
                let now_visible = match toggles.lock() {
                    Ok(mut t) => t.toggle(panel),
                    Err(poisoned) => poisoned.into_inner().toggle(panel),
                };
                println!("{panel} = {now_visible}");
                if now_visible {
                    println!("{}", render_panel(&*client, panel));
                }
            }
            Command::Show => {
                let mut shown = false;
                for panel in ResultPanel::ALL {
                    if visible(&toggles, panel) {
                        println!("{}", render_panel(&*client, panel));
                        shown = true;
                    }
                }
                if !shown {
                    println!("no panel visible; use `toggle showSingleResult` or `toggle showBatchResult`");
                }
            }
            Command::Stats => client.metrics().print_summary(),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    listener.abort();
    client.metrics().print_summary();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(
            Command::parse(r#"predict {"amount": 100}"#),
            Ok(Some(Command::Predict(r#"{"amount": 100}"#.to_string())))
        );
        assert_eq!(
            Command::parse("batch data/sample.json"),
            Ok(Some(Command::Batch(PathBuf::from("data/sample.json"))))
        );
        assert_eq!(Command::parse("generate"), Ok(Some(Command::Generate(None))));
        assert_eq!(Command::parse("generate -2"), Ok(Some(Command::Generate(Some(-2)))));
        assert_eq!(
            Command::parse("toggle showBatchResult"),
            Ok(Some(Command::Toggle(ResultPanel::BatchResult)))
        );
        assert_eq!(Command::parse("exit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("predict").is_err());
        assert!(Command::parse("batch").is_err());
        assert!(Command::parse("generate ten").is_err());
        assert!(Command::parse("toggle showResults").is_err());
        assert!(Command::parse("delete everything").is_err());
    }
}
