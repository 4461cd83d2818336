use std::path::Path;

use tracing::info;

use super::cache::PathCache;
use super::VaultClient;
use crate::error::{Result, VaultError};

/// Upload a local file to `remote_path`, refusing to overwrite an existing file.
/// Returns the number of bytes uploaded.
pub async fn put_file<C>(
    client: &C,
    cache: &PathCache,
    local_path: &Path,
    remote_path: &str,
) -> Result<usize>
where
    C: VaultClient + ?Sized,
{
    if remote_path.is_empty() || remote_path.ends_with('/') {
        return Err(VaultError::Validation(format!(
            "Invalid destination: '{}'",
            remote_path
        )));
    }
    if client.file_exists(remote_path).await? {
        return Err(VaultError::Validation(format!(
            "Remote file already exists: {}",
            remote_path
        )));
    }

    let content = tokio::fs::read(local_path).await?;
    client.write_file(remote_path, &content).await?;
    cache.invalidate();
    info!(local = %local_path.display(), remote = remote_path, bytes = content.len(), "uploaded");
    Ok(content.len())
}
