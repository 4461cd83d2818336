pub mod cache;
pub mod client;
pub mod cp;
pub mod find;
pub mod get;
pub mod ls;
pub mod mv;
pub mod path;
pub mod put;
pub mod rm;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

use crate::error::Result;

/// Remote operations on a vault, addressed by vault-relative paths.
///
/// Folder paths end with `/`; the vault root is the empty string.
#[async_trait]
pub trait VaultClient: Send + Sync {
    async fn file_exists(&self, path: &str) -> Result<bool>;

    /// Full content of a file, byte for byte.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Create or overwrite a file.
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<()>;

    async fn delete_file(&self, path: &str) -> Result<()>;

    /// Entry names directly inside `dir`, relative to it. Folders end with `/`.
    async fn list_dir(&self, dir: &str) -> Result<Vec<String>>;
}
