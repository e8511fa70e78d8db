//! Launchpad authorization (identity and accessible accounts)

use serde::{Deserialize, Serialize};

/// Response of `GET https://launchpad.37signals.com/authorization.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authorization {
    pub expires_at: Option<String>,
    pub identity: Identity,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// The signed-in person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            "(none)".to_string()
        } else {
            name
        }
    }
}

/// An account the identity can reach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
    /// Product code, `bc3` for Basecamp 3/4
    pub product: String,
    pub href: Option<String>,
    pub app_href: Option<String>,
}
