use colored::Colorize;

use super::runtime;
use crate::assistant::Assistant;
use crate::config::Config;
use crate::error::Result;

/// One-shot question with empty history.
pub fn cmd_ask(config: &Config, question: &str) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    let answer = runtime()?.block_on(assistant.ask(question, &[]))?;

    println!("{} {}", "NyaySetu:".green().bold(), answer);
    Ok(())
}
