//! Deleting vault files, either into the trash folder or permanently.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::cache::PathCache;
use super::path::basename;
use super::VaultClient;
use crate::error::{Result, VaultError};

/// Vault folder that soft-deleted files are moved into.
pub const TRASH_DIR: &str = ".trash-http-mcp/";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DeleteRequest {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub confirm: bool,
    #[serde(default)]
    pub permanent: bool,
}

impl DeleteRequest {
    /// Checks that need no vault access.
    pub fn validate_path(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(VaultError::Validation(
                "path parameter is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a tool call. Serializes as `{"success":true,"data":..}` or
/// `{"success":false,"error":".."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(Value),
    Failure(String),
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolResult", 2)?;
        match self {
            ToolResult::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            ToolResult::Failure(error) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

/// Trash location for `path` at time `now`, e.g.
/// `.trash-http-mcp/2026-10-18T09-05-03-123Z_a.md`.
pub fn trash_path(path: &str, now: DateTime<Utc>) -> String {
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}{}_{}", TRASH_DIR, timestamp, basename(path))
}

/// Delete a vault file. Requires `confirm`; moves the file into the trash
/// folder unless `permanent` is set.
///
/// Never fails outward: every error, remote or not, ends up in
/// [`ToolResult::Failure`]. A soft delete is a read, a write and a delete with
/// no rollback, so a failure on the final delete leaves the file in both places.
pub async fn delete_file<C>(client: &C, cache: &PathCache, request: &DeleteRequest) -> ToolResult
where
    C: VaultClient + ?Sized,
{
    match try_delete(client, cache, request, Utc::now()).await {
        Ok(data) => ToolResult::Success(data),
        Err(e) => ToolResult::Failure(e.message()),
    }
}

async fn try_delete<C>(
    client: &C,
    cache: &PathCache,
    request: &DeleteRequest,
    now: DateTime<Utc>,
) -> Result<Value>
where
    C: VaultClient + ?Sized,
{
    request.validate_path()?;
    let path = request.path.as_str();
    if !request.confirm {
        return Err(VaultError::Validation(
            "confirm=true is required to delete a file (safety check)".to_string(),
        ));
    }

    if !client.file_exists(path).await? {
        return Err(VaultError::NotFound(path.to_string()));
    }

    if request.permanent {
        client.delete_file(path).await?;
        cache.invalidate();
        info!(path, "file permanently deleted");

        return Ok(json!({
            "deleted_path": path,
            "message": "File permanently deleted (irreversible)",
        }));
    }

    let trash = trash_path(path, now);
    let content = client.read_file(path).await?;
    client.write_file(&trash, &content).await?;
    if let Err(e) = client.delete_file(path).await {
        warn!(path, trash = %trash, error = %e, "copied to trash but original was not deleted");
        return Err(e);
    }
    cache.invalidate();
    info!(path, trash = %trash, "file moved to trash");

    Ok(json!({
        "original_path": path,
        "trash_location": trash,
        "message": "File moved to .trash-http-mcp/ (open in Obsidian to restore)",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::{Call, MemoryVault};
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;

    fn request(path: &str, confirm: bool, permanent: bool) -> DeleteRequest {
        DeleteRequest {
            path: path.to_string(),
            confirm,
            permanent,
        }
    }

    #[tokio::test]
    async fn test_missing_path_makes_no_calls() {
        let vault = MemoryVault::with_files(&[("notes/a.md", "hello")]);
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("", true, true)).await;

        assert_eq!(
            result,
            ToolResult::Failure("path parameter is required".to_string())
        );
        assert!(vault.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_confirm_makes_no_calls() {
        let vault = MemoryVault::with_files(&[("notes/a.md", "hello")]);
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("notes/a.md", false, true)).await;

        assert_eq!(
            result,
            ToolResult::Failure(
                "confirm=true is required to delete a file (safety check)".to_string()
            )
        );
        assert!(vault.calls().is_empty());
        assert!(vault.contains("notes/a.md"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_mutated() {
        let vault = MemoryVault::new();
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("notes/a.md", true, false)).await;

        assert_eq!(
            result,
            ToolResult::Failure("File not found: notes/a.md".to_string())
        );
        assert_eq!(vault.calls(), vec![Call::Exists("notes/a.md".to_string())]);
        assert_eq!(cache.generation(), 0);
    }

    #[tokio::test]
    async fn test_permanent_delete() {
        let vault = MemoryVault::with_files(&[("notes/a.md", "hello")]);
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("notes/a.md", true, true)).await;

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": true,
                "data": {
                    "deleted_path": "notes/a.md",
                    "message": "File permanently deleted (irreversible)",
                }
            })
        );
        assert_eq!(
            vault.calls(),
            vec![
                Call::Exists("notes/a.md".to_string()),
                Call::Delete("notes/a.md".to_string()),
            ]
        );
        assert_eq!(cache.generation(), 1);
        assert!(vault.paths().is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_moves_to_trash() {
        let vault = MemoryVault::with_files(&[("notes/a.md", "hello")]);
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("notes/a.md", true, false)).await;

        let ToolResult::Success(data) = result else {
            panic!("expected success");
        };
        let trash = data["trash_location"].as_str().unwrap().to_string();
        let timestamp = trash
            .strip_prefix(TRASH_DIR)
            .and_then(|rest| rest.strip_suffix("_a.md"))
            .unwrap();
        assert!(!timestamp.is_empty());
        assert!(!timestamp.contains(':') && !timestamp.contains('.'));

        assert_eq!(data["original_path"], "notes/a.md");
        assert_eq!(
            data["message"],
            "File moved to .trash-http-mcp/ (open in Obsidian to restore)"
        );
        assert_eq!(
            vault.calls(),
            vec![
                Call::Exists("notes/a.md".to_string()),
                Call::Read("notes/a.md".to_string()),
                Call::Write(trash.clone(), b"hello".to_vec()),
                Call::Delete("notes/a.md".to_string()),
            ]
        );
        assert_eq!(vault.paths(), vec![trash]);
        assert_eq!(cache.generation(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_trash_copy() {
        let vault = MemoryVault::with_files(&[("notes/a.md", "hello")]);
        vault.fail_on("delete", "locked");
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("notes/a.md", true, false)).await;

        assert_eq!(
            result,
            ToolResult::Failure("API error: 500 - locked".to_string())
        );
        let paths = vault.paths();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().any(|p| p.starts_with(TRASH_DIR)));
        assert!(vault.contains("notes/a.md"));
        assert_eq!(cache.generation(), 0);
    }

    #[tokio::test]
    async fn test_failed_read_writes_nothing() {
        let vault = MemoryVault::with_files(&[("notes/a.md", "hello")]);
        vault.fail_on("read", "timeout");
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("notes/a.md", true, false)).await;

        assert!(!result.is_success());
        assert!(!vault
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Write(..) | Call::Delete(_))));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_original() {
        let vault = MemoryVault::with_files(&[("notes/a.md", "hello")]);
        vault.fail_on("write", "disk full");
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("notes/a.md", true, false)).await;

        assert_eq!(
            result,
            ToolResult::Failure("API error: 500 - disk full".to_string())
        );
        assert!(!vault.calls().iter().any(|c| matches!(c, Call::Delete(_))));
        assert!(vault.contains("notes/a.md"));
        assert_eq!(vault.paths(), vec!["notes/a.md".to_string()]);
        assert_eq!(cache.generation(), 0);
    }

    #[tokio::test]
    async fn test_failed_existence_check() {
        let vault = MemoryVault::new();
        vault.fail_on("exists", "connection refused");
        let cache = PathCache::new();

        let result = delete_file(&vault, &cache, &request("a.md", true, true)).await;

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": false, "error": "API error: 500 - connection refused"})
        );
    }

    #[test]
    fn test_trash_path_format() {
        let now =
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 3).unwrap() + TimeDelta::milliseconds(123);
        assert_eq!(
            trash_path("a/b/c.md", now),
            ".trash-http-mcp/2026-10-18T09-05-03-123Z_c.md"
        );
        assert_eq!(
            trash_path("root.md", now),
            ".trash-http-mcp/2026-10-18T09-05-03-123Z_root.md"
        );
    }

    #[test]
    fn test_request_defaults() {
        let req: DeleteRequest = serde_json::from_value(json!({"path": "a.md"})).unwrap();
        assert_eq!(req, request("a.md", false, false));

        let req: DeleteRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.path.is_empty());
    }
}
