//! Project models

use serde::{Deserialize, Serialize};

/// A Basecamp project, as listed by `projects.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub status: Option<String>,
    pub description: Option<String>,
    pub app_url: Option<String>,
    pub updated_at: Option<String>,
}
