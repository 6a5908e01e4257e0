use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::runtime;
use crate::config::Config;
use crate::embeddings::provider::from_settings;
use crate::error::Result;
use crate::ingest;

pub fn cmd_ingest(config: &Config) -> Result<()> {
    let splitter = config.splitter()?;
    let provider = from_settings(&config.embedding_settings())?;

    println!(
        "{} {} with {} (chunk size {}, overlap {})",
        "Ingesting".green().bold(),
        config.source_dir.display().to_string().cyan(),
        provider.model_id().cyan(),
        config.chunk_size,
        config.chunk_overlap
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks embedded")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let result = runtime()?.block_on(ingest::ingest(
        &config.source_dir,
        &config.index_path,
        &splitter,
        provider.as_ref(),
        config.metric,
        config.embed_batch_size,
        |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        },
    ));
    pb.finish_and_clear();
    let report = result?;

    println!("{} Index written to {}", "Done!".green().bold(), report.index_path.display());
    println!("  Documents loaded: {}", report.documents);
    println!("  Chunks indexed:   {}", report.chunks);
    println!("  Files skipped:    {}", report.skipped.len());
    for skipped in &report.skipped {
        println!(
            "    {} {}: {}",
            "skipped".yellow(),
            skipped.path.display(),
            skipped.reason.dimmed()
        );
    }
    println!("\nAsk with:");
    println!("  {}", "nyaysetu ask \"What is Section 420 IPC?\"".cyan());

    Ok(())
}
