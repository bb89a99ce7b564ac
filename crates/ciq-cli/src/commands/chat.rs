//! Interactive rustyline-based collection session.

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use ciq_core::config::CiqConfig;

use crate::wiring;

const SLASH_COMMANDS: &[&str] = &["/progress", "/yaml"];

/// Tab completion for the slash commands; everything else is free text
/// for the assistant, so the other helper traits stay at their defaults.
#[derive(Clone)]
struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = SLASH_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {}

impl Hinter for CliHelper {
    type Hint = String;
}

impl Validator for CliHelper {}

fn print_assistant(text: &str) {
    for line in text.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
}

pub async fn run(config: &CiqConfig) -> Result<()> {
    let assistant = wiring::build_assistant(config);

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== CIQ Copilot ===".bright_magenta().bold());
    println!(
        "{}",
        "Type '/progress' to see where you are, '/yaml' for the merged output, or 'quit' to exit."
            .bright_black()
    );
    println!();

    // seed the session up front so its welcome and first question print
    // before the first prompt
    let session = assistant.create_or_resume(None).await;
    let session_id = session.id.clone();
    for message in &session.messages {
        print_assistant(&message.content);
    }

    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed == "/progress" {
                    let progress = assistant.progress(&session_id).await?;
                    println!(
                        "{}",
                        format!(
                            "{}/{} collected ({:.0}%)",
                            progress.collected_count,
                            progress.total_params,
                            progress.progress_percentage
                        )
                        .bright_yellow()
                    );
                    for param in &progress.missing_params {
                        println!("  {}", format!("- {param}").yellow());
                    }
                    println!();
                    continue;
                }

                if trimmed == "/yaml" {
                    match assistant.generate_yaml(&session_id).await {
                        Ok(yaml) => println!("{yaml}"),
                        Err(err) => println!("{}", format!("{err}").red()),
                    }
                    println!();
                    continue;
                }

                let outcome = assistant.process_turn(Some(&session_id), trimmed).await;
                print_assistant(&outcome.response);

                if outcome.is_complete && outcome.final_yaml.is_none() {
                    match assistant.generate_yaml(&session_id).await {
                        Ok(yaml) => {
                            println!("{}", "Here is your merged configuration:".bright_yellow());
                            println!("{yaml}");
                        }
                        Err(err) => println!("{}", format!("{err}").red()),
                    }
                }
            }
            Err(_) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
        }
    }

    Ok(())
}
