use serde::{Deserialize, Serialize};

/// Coarse role attached to a user record. Stored and serialized uppercase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse a stored role value, falling back to `User` for anything
    /// unknown so a bad row never grants elevated access.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("admin") {
            Ok(Role::Admin)
        } else if s.eq_ignore_ascii_case("user") {
            Ok(Role::User)
        } else {
            Err(format!("invalid role: {}. valid roles: USER, ADMIN", s))
        }
    }
}

/// User view safe for client responses (no password hash). Every REST and
/// gRPC response that exposes a user is built from this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering_admin_outranks_user() {
        assert!(Role::Admin > Role::User);
        assert!(Role::Admin >= Role::Admin);
        assert!(Role::User >= Role::User);
    }

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_parse_lossy_defaults_to_user() {
        assert_eq!(Role::parse_lossy("ADMIN"), Role::Admin);
        assert_eq!(Role::parse_lossy("garbage"), Role::User);
        assert_eq!(Role::parse_lossy(""), Role::User);
    }

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"USER\"");
    }

    #[test]
    fn test_profile_serialization_has_no_password_field() {
        let profile = UserProfile {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            address: None,
            phone: None,
            role: Role::User,
        };
        let value = serde_json::to_value(&profile).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(!keys.contains(&"password_hash"));
        assert!(!keys.contains(&"password"));
        assert_eq!(value["role"], "USER");
    }
}
