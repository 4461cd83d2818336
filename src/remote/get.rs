use std::path::Path;

use tracing::debug;

use super::VaultClient;
use crate::error::Result;

/// Print a vault file to stdout. Invalid UTF-8 is replaced.
pub async fn cat_file<C>(client: &C, remote_path: &str) -> Result<()>
where
    C: VaultClient + ?Sized,
{
    let content = client.read_file(remote_path).await?;
    let text = String::from_utf8_lossy(&content);
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Download a vault file to `local_path`. Returns the number of bytes written.
///
/// The caller decides whether overwriting is allowed.
pub async fn get_file<C>(client: &C, remote_path: &str, local_path: &Path) -> Result<usize>
where
    C: VaultClient + ?Sized,
{
    let content = client.read_file(remote_path).await?;
    tokio::fs::write(local_path, &content).await?;
    debug!(
        remote = remote_path,
        local = %local_path.display(),
        bytes = content.len(),
        "downloaded"
    );
    Ok(content.len())
}
