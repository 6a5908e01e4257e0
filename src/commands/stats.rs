use colored::Colorize;

use crate::config::Config;
use crate::embeddings::VectorIndex;
use crate::error::Result;

pub fn cmd_stats(config: &Config) -> Result<()> {
    let index = VectorIndex::open(&config.index_path)?;
    let manifest = index.manifest();
    let stats = index.stats();

    let on_disk: u64 = std::fs::read_dir(&config.index_path)?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum();

    println!("{}", "NyaySetu Index".green().bold());
    println!("{}", "=".repeat(40));
    println!(
        "  Location:          {}",
        config.index_path.display().to_string().cyan()
    );
    println!(
        "  Size on disk:      {}",
        humansize::format_size(on_disk, humansize::BINARY)
    );
    println!("  Embedding model:   {}", manifest.embedding_model.cyan());
    println!("  Dimensions:        {}", manifest.dimensions);
    println!("  Metric:            {}", manifest.metric);
    println!(
        "  Built at:          {}",
        manifest.built_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  Documents:         {}", stats.documents);
    println!("  Chunks:            {}", stats.total_chunks);
    println!("  By source:");
    for (source, count) in &stats.by_source {
        println!("    {}: {}", source, count);
    }

    Ok(())
}
