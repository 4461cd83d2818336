use tracing::info;

use super::cache::PathCache;
use super::path::basename;
use super::VaultClient;
use crate::error::{Result, VaultError};

/// Final path for a copy or move of `src` to `dst`. A folder destination
/// (ending in `/`, or the root) keeps the source file name.
pub fn destination(src: &str, dst: &str) -> String {
    if dst.is_empty() || dst.ends_with('/') {
        format!("{}{}", dst, basename(src))
    } else {
        dst.to_string()
    }
}

/// Check both ends of a copy/move and return the resolved destination.
pub(super) async fn prepare_transfer<C>(client: &C, src: &str, dst: &str) -> Result<String>
where
    C: VaultClient + ?Sized,
{
    let dst = destination(src, dst);
    if src == dst {
        return Err(VaultError::Validation(format!(
            "'{}' and '{}' are the same file",
            src, dst
        )));
    }
    if !client.file_exists(src).await? {
        return Err(VaultError::NotFound(src.to_string()));
    }
    if client.file_exists(&dst).await? {
        return Err(VaultError::Validation(format!(
            "Destination already exists: {}",
            dst
        )));
    }
    Ok(dst)
}

/// Copy a vault file. Returns the destination path.
pub async fn copy_file<C>(client: &C, cache: &PathCache, src: &str, dst: &str) -> Result<String>
where
    C: VaultClient + ?Sized,
{
    let dst = prepare_transfer(client, src, dst).await?;
    let content = client.read_file(src).await?;
    client.write_file(&dst, &content).await?;
    cache.invalidate();
    info!(src, dst = %dst, "file copied");
    Ok(dst)
}
