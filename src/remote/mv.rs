use tracing::{info, warn};

use super::cache::PathCache;
use super::cp::prepare_transfer;
use super::VaultClient;
use crate::error::Result;

/// Move or rename a vault file. Returns the destination path.
///
/// The REST API has no rename, so this is a copy followed by a delete; if the
/// delete fails the file exists at both paths.
pub async fn move_file<C>(client: &C, cache: &PathCache, src: &str, dst: &str) -> Result<String>
where
    C: VaultClient + ?Sized,
{
    let dst = prepare_transfer(client, src, dst).await?;
    let content = client.read_file(src).await?;
    client.write_file(&dst, &content).await?;
    if let Err(e) = client.delete_file(src).await {
        cache.invalidate();
        warn!(src, dst = %dst, error = %e, "copied but source was not deleted");
        return Err(e);
    }
    cache.invalidate();
    info!(src, dst = %dst, "file moved");
    Ok(dst)
}
