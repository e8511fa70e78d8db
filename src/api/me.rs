//! Launchpad identity endpoint (authorization.json)

use anyhow::{Context, Result};

use super::client::BasecampClient;
use crate::models::Authorization;

const AUTHORIZATION_URL: &str = "https://launchpad.37signals.com/authorization.json";

/// Fetch and display the signed-in identity and its accounts.
pub async fn whoami(client: &BasecampClient) -> Result<()> {
    let resp = client.get(AUTHORIZATION_URL).await?;
    let auth: Authorization = resp
        .json()
        .await
        .context("Failed to parse authorization response")?;

    println!();
    println!("Name:  {}", auth.identity.display_name());
    println!(
        "Email: {}",
        auth.identity.email_address.as_deref().unwrap_or("(none)")
    );
    println!("ID:    {}", auth.identity.id);

    println!("\nAccounts:");
    if auth.accounts.is_empty() {
        println!("  (no accounts)");
    }
    for account in &auth.accounts {
        println!("  {:<12} {:<6} {}", account.id, account.product, account.name);
    }

    Ok(())
}
