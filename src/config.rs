use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default address of the Local REST API plugin's plain HTTP listener.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:27123";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Credentials {
    pub fn config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not find config directory")?;
        Ok(base.join("shellvault"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("credentials.json"))
    }

    /// Saved credentials, or `None` if `login` has never been run.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials: {}", path.display()))?;
        let credentials = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials: {}", path.display()))?;
        Ok(Some(credentials))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize credentials")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write credentials: {}", path.display()))?;
        Ok(())
    }

    /// Combine command-line/environment overrides with saved credentials.
    ///
    /// An API key from the overrides wins outright; otherwise the saved key is
    /// used, with the URL overridden if one was given.
    pub fn resolve(
        url: Option<&str>,
        api_key: Option<&str>,
        insecure: bool,
        saved: Option<Credentials>,
    ) -> Result<Self> {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let base_url = url
                .map(str::to_string)
                .or_else(|| saved.as_ref().map(|c| c.base_url.clone()))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            return Ok(Self {
                base_url,
                api_key: key.to_string(),
                accept_invalid_certs: insecure,
            });
        }

        let mut saved = saved.context("Not logged in. Please run 'login' first.")?;
        if let Some(url) = url {
            saved.base_url = url.to_string();
        }
        saved.accept_invalid_certs |= insecure;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn saved() -> Credentials {
        Credentials {
            base_url: "https://127.0.0.1:27124".to_string(),
            api_key: "saved-key".to_string(),
            accept_invalid_certs: true,
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        saved().save_to(&path).unwrap();

        assert_eq!(Credentials::load_from(&path).unwrap(), Some(saved()));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        assert_eq!(Credentials::load_from(&path).unwrap(), None);
    }

    #[test]
    fn test_resolve_override_key_wins() {
        let creds = Credentials::resolve(None, Some("cli-key"), false, Some(saved())).unwrap();
        assert_eq!(creds.api_key, "cli-key");
        assert_eq!(creds.base_url, "https://127.0.0.1:27124");
        assert!(!creds.accept_invalid_certs);
    }

    #[test]
    fn test_resolve_defaults_url() {
        let creds = Credentials::resolve(None, Some("k"), false, None).unwrap();
        assert_eq!(creds.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_resolve_saved_with_url_override() {
        let creds =
            Credentials::resolve(Some("http://vault:27123"), None, false, Some(saved())).unwrap();
        assert_eq!(creds.api_key, "saved-key");
        assert_eq!(creds.base_url, "http://vault:27123");
        assert!(creds.accept_invalid_certs);
    }

    #[test]
    fn test_resolve_not_logged_in() {
        let err = Credentials::resolve(None, None, false, None).unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }
}
