// ── Signed-in user ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Community role. Decides which pass operations the client offers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    #[default]
    Resident,
    Admin,
    SuperAdmin,
    Watchman,
}

impl Role {
    /// Gate staff and administrators check passes; residents issue them.
    pub fn can_verify(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin | Self::Watchman)
    }
}

/// Identity carried alongside the bearer token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub building_id: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl UserContext {
    pub fn with_role(role: Role) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_snake_case() {
        assert_eq!("super_admin".parse::<Role>().ok(), Some(Role::SuperAdmin));
        assert_eq!("Watchman".parse::<Role>().ok(), Some(Role::Watchman));
        assert_eq!(Role::SuperAdmin.to_string(), "super_admin");
    }

    #[test]
    fn residents_cannot_verify() {
        assert!(!Role::Resident.can_verify());
        assert!(Role::Watchman.can_verify());
        assert!(Role::Admin.can_verify());
    }
}
