use serde::{Deserialize, Serialize};

/// Role carried by the authenticated-user descriptor supplied by the host
/// application's session provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    Employee,
    Client,
}

/// Authenticated-user descriptor consumed from the external session provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl TryFrom<i64> for Role {
    type Error = anyhow::Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Manager),
            1 => Ok(Role::Employee),
            2 => Ok(Role::Client),
            _ => Err(anyhow::anyhow!("Invalid Role value: {}", value)),
        }
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        match role {
            Role::Manager => 0,
            Role::Employee => 1,
            Role::Client => 2,
        }
    }
}
