use serde::{Deserialize, Serialize};

/// JWT claims. The token carries only the subject and its validity window;
/// roles are resolved from the user record at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verified identity bound to a single request. Produced only by token
/// verification; lives for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// Outcome of the credential validation protocol. Invalid credentials are a
/// normal outcome carried as data, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub valid: bool,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub message: String,
}

impl Verdict {
    pub fn accepted(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            valid: true,
            user_id: Some(user_id.into()),
            username: Some(username.into()),
            message: "validated".to_string(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            user_id: None,
            username: None,
            message: message.into(),
        }
    }
}
