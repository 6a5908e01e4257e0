use colored::Colorize;
use dialoguer::Input;
use tracing::warn;

use super::runtime;
use crate::assistant::Assistant;
use crate::config::Config;
use crate::conversation::{Session, Speaker};
use crate::error::{NyayError, Result};

/// In-loop commands typed instead of a question.
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand {
    Reset,
    History,
    Exit,
    Ask,
}

fn parse_command(input: &str) -> ChatCommand {
    match input.trim().to_lowercase().as_str() {
        "/reset" => ChatCommand::Reset,
        "/history" => ChatCommand::History,
        "/exit" | "/quit" => ChatCommand::Exit,
        _ => ChatCommand::Ask,
    }
}

pub fn cmd_chat(config: &Config) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    let rt = runtime()?;
    let session = Session::new();
    let name = assistant.template().assistant_name.clone();

    println!(
        "{} Ask about Indian law. {} clears the conversation, {} shows it, {} leaves.",
        format!("{}:", name).green().bold(),
        "/reset".cyan(),
        "/history".cyan(),
        "/exit".cyan()
    );

    loop {
        let input: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| NyayError::Configuration(format!("Input cancelled: {}", e)))?;
        let question = input.trim();
        if question.is_empty() {
            continue;
        }

        match parse_command(question) {
            ChatCommand::Exit => break,
            ChatCommand::Reset => {
                rt.block_on(session.reset());
                println!("{} Conversation cleared.", "Done!".green().bold());
            }
            ChatCommand::History => {
                let turns = rt.block_on(session.history());
                if turns.is_empty() {
                    println!("{}", "No conversation yet.".yellow());
                }
                for turn in turns {
                    let label = turn.speaker.label(&name);
                    match turn.speaker {
                        Speaker::User => println!("  {} {}", format!("{}:", label).cyan(), turn.text),
                        Speaker::Assistant => {
                            println!("  {} {}", format!("{}:", label).green(), turn.text)
                        }
                    }
                }
            }
            ChatCommand::Ask => match rt.block_on(session.ask(&assistant, question)) {
                Ok(answer) => println!("{} {}\n", format!("{}:", name).green().bold(), answer),
                Err(e) if e.is_query_time() => {
                    warn!(error = %e, "chat turn failed");
                    println!("{} {}\n", "Error:".red(), e.user_message());
                }
                Err(e) => return Err(e),
            },
        }
    }

    Ok(())
}
