//! Output module
//!
//! Writes the domain -> product URL mapping as a JSON file and prints a
//! human-readable statistics summary to stdout.

use crate::stats::StatsSnapshot;
use crate::CrawlError;
use std::collections::BTreeMap;
use std::path::Path;

/// Writes the results mapping as pretty-printed JSON
pub fn write_results(
    path: &Path,
    results: &BTreeMap<String, Vec<String>>,
) -> Result<(), CrawlError> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json)?;
    tracing::info!("results written to {}", path.display());
    Ok(())
}

/// Prints the crawl statistics and per-domain discovery counts
pub fn print_summary(results: &BTreeMap<String, Vec<String>>, stats: &StatsSnapshot) {
    println!("\nCrawling Statistics:");
    println!("Total Requests: {}", stats.requests);
    println!("Successful Requests: {}", stats.successes);
    println!("Failed Requests: {}", stats.failures);
    println!("Success Rate: {:.2}%", stats.success_rate * 100.0);

    if let Some(duration) = stats.duration {
        println!("Total Duration: {:.2} seconds", duration.as_secs_f64());
    }

    println!();
    for (domain, urls) in results {
        println!("{}: {} product URLs discovered", domain, urls.len());
    }
}
