use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::VaultClient;
use crate::config::Credentials;
use crate::error::{Result, VaultError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize, Debug)]
struct DirListing {
    files: Vec<String>,
}

/// Response of `GET /` on the Local REST API.
#[derive(Deserialize, Debug)]
pub struct ServerStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub service: Option<String>,
}

/// Vault client for the Obsidian Local REST API plugin.
pub struct HttpVaultClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpVaultClient {
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let base_url = Url::parse(&credentials.base_url)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(credentials.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key: credentials.api_key.clone(),
        })
    }

    /// Query `GET /`, which reports whether the API key was accepted.
    pub async fn server_status(&self) -> Result<ServerStatus> {
        let res = self
            .client
            .get(self.base_url.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let res = check_status(res, "/").await?;
        Ok(res.json().await?)
    }

    /// Build `<base>/vault/<path>` with every segment percent-encoded.
    fn vault_url(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| VaultError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("vault")
            .extend(path.trim_start_matches('/').split('/'));
        Ok(url)
    }
}

async fn check_status(res: Response, path: &str) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(VaultError::NotFound(path.to_string()));
    }
    let message = res.text().await.unwrap_or_default();
    Err(VaultError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl VaultClient for HttpVaultClient {
    async fn file_exists(&self, path: &str) -> Result<bool> {
        // A folder GET answers 200 with a listing; folders are not files.
        if path.ends_with('/') {
            return Ok(false);
        }
        let url = self.vault_url(path)?;
        debug!(%url, "checking file");
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        match check_status(res, path).await {
            Ok(_) => Ok(true),
            Err(VaultError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.vault_url(path)?;
        debug!(%url, "reading file");
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let res = check_status(res, path).await?;
        Ok(res.bytes().await?.to_vec())
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let url = self.vault_url(path)?;
        debug!(%url, bytes = content.len(), "writing file");
        let res = self
            .client
            .put(url)
            .bearer_auth(&self.api_key)
            .header(header::CONTENT_TYPE, "text/markdown")
            .body(content.to_vec())
            .send()
            .await?;
        check_status(res, path).await?;
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        let url = self.vault_url(path)?;
        debug!(%url, "deleting file");
        let res = self
            .client
            .delete(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check_status(res, path).await?;
        Ok(())
    }

    async fn list_dir(&self, dir: &str) -> Result<Vec<String>> {
        let dir = if dir.is_empty() || dir.ends_with('/') {
            dir.to_string()
        } else {
            format!("{}/", dir)
        };
        let url = self.vault_url(&dir)?;
        debug!(%url, "listing folder");
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let res = check_status(res, &dir).await?;
        let listing: DirListing = res.json().await?;
        Ok(listing.files)
    }
}
