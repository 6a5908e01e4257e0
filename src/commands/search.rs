use colored::Colorize;

use super::{preview, runtime};
use crate::assistant::open_retriever;
use crate::config::Config;
use crate::error::Result;

/// Retrieval only; needs no LLM credentials.
pub fn cmd_search(config: &Config, query: &str) -> Result<()> {
    let retriever = open_retriever(config)?;
    let results = runtime()?.block_on(retriever.retrieve(query))?;

    if results.is_empty() {
        println!("{}", "No matching passages.".yellow());
        return Ok(());
    }

    println!("{} for \"{}\"", "Top passages".green().bold(), query);
    for (rank, result) in results.iter().enumerate() {
        let location = match result.chunk.page {
            Some(page) => format!("{} p.{}", result.chunk.source, page),
            None => result.chunk.source.clone(),
        };
        println!(
            "  {}. [{:.3}] {}",
            rank + 1,
            result.score,
            location.cyan().bold()
        );
        println!("     {}", preview(&result.chunk.text, 160).dimmed());
    }

    Ok(())
}
