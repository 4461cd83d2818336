use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{stdin, stdout, Write};

use crate::config::{Credentials, DEFAULT_BASE_URL};
use crate::remote::client::HttpVaultClient;

fn prompt(label: &str) -> Result<String> {
    print!("{}", label.yellow());
    stdout().flush()?;
    let mut answer = String::new();
    stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Ask for the REST API address and key, verify them against the server and
/// save them for later sessions.
pub async fn login(default_url: Option<&str>) -> Result<Credentials> {
    let default_url = default_url.unwrap_or(DEFAULT_BASE_URL);
    println!(
        "{}",
        "Copy the API key from Obsidian: Settings > Local REST API.".blue()
    );

    let base_url = prompt(&format!("Server URL [{}]: ", default_url))?;
    let base_url = if base_url.is_empty() {
        default_url.to_string()
    } else {
        base_url
    };

    let api_key = prompt("API key: ")?;
    if api_key.is_empty() {
        anyhow::bail!("An API key is required");
    }

    let accept_invalid_certs = base_url.starts_with("https://")
        && prompt("Accept the plugin's self-signed certificate? (y/N): ")?
            .eq_ignore_ascii_case("y");

    let credentials = Credentials {
        base_url,
        api_key,
        accept_invalid_certs,
    };

    let client = HttpVaultClient::new(&credentials)?;
    let status = client
        .server_status()
        .await
        .with_context(|| format!("Could not reach {}", credentials.base_url))?;
    if !status.authenticated {
        anyhow::bail!("The server rejected the API key");
    }
    if let Some(service) = &status.service {
        println!("Connected to {}", service.green());
    }

    let path = credentials.save()?;
    println!(
        "{}\n{}",
        "Login successful!".blue().bold(),
        format!("Credentials saved to {}", path.display()).green()
    );
    Ok(credentials)
}
