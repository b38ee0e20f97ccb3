//! Vector index status overview.
//!
//! Provides a quick summary of the configured index: dimension, vector
//! counts, fullness, and per-namespace breakdowns. Used by `ads status` to
//! give confidence that the index is reachable and populated before
//! searching or serving.

use anyhow::Result;

use crate::config::Config;
use crate::index::VectorIndex;
use crate::pinecone::PineconeIndex;

/// Run the status command: query the index and print a summary.
pub async fn run_status(config: &Config) -> Result<()> {
    let index = PineconeIndex::connect(&config.index).await?;
    let stats = index.stats().await?;

    println!("Ad Scout Index Status");
    println!("=====================");
    println!();
    println!("  Index:       {}", config.index.name);
    println!("  Dimension:   {}", stats.dimension);
    println!("  Vectors:     {}", stats.total_vectors);
    println!("  Fullness:    {:.1}%", stats.index_fullness * 100.0);

    if !stats.namespaces.is_empty() {
        println!();
        println!("  By namespace:");
        println!("  {:<24} {:>10}", "NAMESPACE", "VECTORS");
        println!("  {}", "-".repeat(36));

        for ns in &stats.namespaces {
            let display = if ns.name.is_empty() {
                "(default)"
            } else {
                ns.name.as_str()
            };
            println!("  {:<24} {:>10}", display, ns.vector_count);
        }
    }

    if stats.dimension != 0 && stats.dimension != config.index.dimension {
        println!();
        println!(
            "  WARNING: index dimension {} does not match configured dimension {}",
            stats.dimension, config.index.dimension
        );
    }

    println!();
    Ok(())
}
