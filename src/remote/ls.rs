use colored::Colorize;

use super::VaultClient;
use crate::error::{Result, VaultError};

/// Entries of `dir`, folders first, each group sorted by name.
pub async fn folder_entries<C>(client: &C, dir: &str) -> Result<Vec<String>>
where
    C: VaultClient + ?Sized,
{
    let mut entries = client.list_dir(dir).await?;
    entries.sort_by(|a, b| (!a.ends_with('/'), a).cmp(&(!b.ends_with('/'), b)));
    Ok(entries)
}

/// List a vault folder and print it.
pub async fn list_remote_files<C>(client: &C, dir: &str) -> Result<()>
where
    C: VaultClient + ?Sized,
{
    let entries = folder_entries(client, dir).await?;
    if entries.is_empty() {
        println!("{}", "(empty)".dimmed());
        return Ok(());
    }

    for entry in entries {
        if entry.ends_with('/') {
            println!("{}", entry.blue());
        } else {
            println!("{}", entry);
        }
    }
    Ok(())
}

/// Whether `dir` is an existing folder. The root always exists.
pub async fn folder_exists<C>(client: &C, dir: &str) -> Result<bool>
where
    C: VaultClient + ?Sized,
{
    if dir.is_empty() {
        return Ok(true);
    }
    match client.list_dir(dir).await {
        Ok(_) => Ok(true),
        Err(VaultError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::MemoryVault;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_folders_listed_first() {
        let vault = MemoryVault::with_files(&[
            ("b.md", ""),
            ("a.md", ""),
            ("notes/x.md", ""),
            ("archive/y.md", ""),
        ]);

        let entries = folder_entries(&vault, "").await.unwrap();

        assert_eq!(entries, vec!["archive/", "notes/", "a.md", "b.md"]);
    }

    #[tokio::test]
    async fn test_folder_exists() {
        let vault = MemoryVault::with_files(&[("notes/x.md", "")]);
        assert!(folder_exists(&vault, "").await.unwrap());
        assert!(folder_exists(&vault, "notes/").await.unwrap());
        assert!(!folder_exists(&vault, "missing/").await.unwrap());
    }
}
