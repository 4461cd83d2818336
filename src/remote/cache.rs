use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::stream::{self, StreamExt};
use tracing::debug;

use super::rm::TRASH_DIR;
use super::VaultClient;
use crate::error::Result;

/// Folders listed concurrently while walking the vault.
const MAX_CONCURRENCY: usize = 4;

/// Lazily built index of every file path in the vault.
///
/// Mutating commands call [`PathCache::invalidate`]; the next lookup walks the
/// vault again.
#[derive(Default)]
pub struct PathCache {
    files: Mutex<Option<Arc<Vec<String>>>>,
    generation: AtomicU64,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the index stale.
    pub fn invalidate(&self) {
        *self.files.lock().unwrap_or_else(PoisonError::into_inner) = None;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "path cache invalidated");
    }

    /// Number of invalidations so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Current index without touching the network.
    pub fn cached(&self) -> Option<Arc<Vec<String>>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cached index, walking the vault first if it is stale.
    pub async fn files<C>(&self, client: &C) -> Result<Arc<Vec<String>>>
    where
        C: VaultClient + ?Sized,
    {
        if let Some(files) = self.cached() {
            return Ok(files);
        }

        let started_at = self.generation();
        let files = Arc::new(walk_vault(client).await?);

        // A walk that raced with an invalidation may have seen a stale vault.
        if self.generation() == started_at {
            *self.files.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&files));
        }
        debug!(count = files.len(), "vault indexed");
        Ok(files)
    }
}

/// List every file below the vault root, breadth first, skipping the trash folder.
async fn walk_vault<C>(client: &C) -> Result<Vec<String>>
where
    C: VaultClient + ?Sized,
{
    let mut files = Vec::new();
    let mut pending = vec![String::new()];

    while !pending.is_empty() {
        let level = std::mem::take(&mut pending);
        let listings = stream::iter(level)
            .map(|dir| async move {
                let entries = client.list_dir(&dir).await?;
                Ok::<_, crate::error::VaultError>((dir, entries))
            })
            .buffer_unordered(MAX_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        for listing in listings {
            let (dir, entries) = listing?;
            for entry in entries {
                let full = format!("{}{}", dir, entry);
                if full.ends_with('/') {
                    if full != TRASH_DIR {
                        pending.push(full);
                    }
                } else {
                    files.push(full);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}
