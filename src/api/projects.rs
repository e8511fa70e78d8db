//! Projects in the configured account

use anyhow::{Context, Result};

use super::client::BasecampClient;
use crate::models::Project;

/// List projects (first page only).
pub async fn list_projects(client: &BasecampClient) -> Result<()> {
    let resp = client.get("projects.json").await?;
    let projects: Vec<Project> = resp
        .json()
        .await
        .context("Failed to parse projects response")?;

    println!("\nProjects:");
    println!("{:-<60}", "");

    if projects.is_empty() {
        println!("  (no projects found)");
        return Ok(());
    }

    for project in &projects {
        println!("  {:<12} {}", project.id, project.name);
        if let Some(desc) = project.description.as_deref().filter(|d| !d.is_empty()) {
            println!("  {:<12} {}", "", desc);
        }
    }

    Ok(())
}
