use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::cache::PathCache;
use super::VaultClient;
use crate::error::Result;

/// Paths whose text contains `query`, case-insensitively.
pub fn matching_paths<'a>(files: &'a [String], query: &str) -> Vec<&'a str> {
    let needle = query.to_lowercase();
    files
        .iter()
        .filter(|path| path.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}

/// Search the vault index for `query` and print the matches.
pub async fn find_files<C>(client: &C, cache: &PathCache, query: &str) -> Result<()>
where
    C: VaultClient + ?Sized,
{
    let files = match cache.cached() {
        Some(files) => files,
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Indexing vault...");
            pb.enable_steady_tick(Duration::from_millis(100));
            let files = cache.files(client).await;
            pb.finish_and_clear();
            files?
        }
    };

    let matches = matching_paths(&files, query);
    if matches.is_empty() {
        println!("{}", "(no results)".dimmed());
        return Ok(());
    }
    for path in &matches {
        println!("{}", path);
    }
    println!("{}", format!("{} of {} files", matches.len(), files.len()).dimmed());
    Ok(())
}
