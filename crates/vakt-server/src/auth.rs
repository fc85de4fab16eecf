use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use vakt_common::models::auth::{Claims, Principal};

/// Tokens are valid for a fixed 24-hour window from issuance.
pub const TOKEN_TTL_SECS: i64 = 86_400;

/// Hash a password using argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash. The comparison happens
/// inside the argon2 verifier and does not short-circuit on mismatch. An
/// unparseable stored hash is an error (corrupt store data), not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Why a presented token was rejected. Callers treat all three the same
/// (the request stays unauthenticated) but log them distinctly.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token is expired")]
    Expired,
}

/// Process-wide HMAC-SHA256 key pair used to sign and verify tokens.
/// Built once at startup and injected; never mutated afterwards.
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Build the signing key from the configured Base64 secret. A configured
    /// value that is not valid Base64 is a fatal startup error. Without a
    /// configured value the server runs on a random ephemeral key, so every
    /// restart invalidates all outstanding tokens.
    pub fn from_config(configured: Option<&str>) -> Result<Self> {
        match configured {
            Some(encoded) if !encoded.trim().is_empty() => {
                let secret = BASE64_STANDARD
                    .decode(encoded.trim())
                    .context("Failed to decode jwt_secret as base64")?;
                Ok(Self::from_secret(&secret))
            }
            _ => {
                use argon2::password_hash::rand_core::RngCore;
                tracing::warn!(
                    "No jwt_secret configured; using an ephemeral signing key, tokens will not verify across restarts"
                );
                let mut secret = [0u8; 32];
                OsRng.fill_bytes(&mut secret);
                Ok(Self::from_secret(&secret))
            }
        }
    }
}

/// Create a signed token for `subject` with issued-at = now and a fixed
/// 24-hour expiry.
pub fn issue_token(subject: &str, key: &SigningKey) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &key.encoding)
        .context("Failed to create access token")
}

/// Validate a token's signature and expiry, returning the bound principal.
///
/// Expiry is a strict whole-second comparison with no leeway: a token
/// presented at exactly its expiry instant is already expired. The library
/// check is disabled so the comparison here is the only one applied.
pub fn verify_token(token: &str, key: &SigningKey) -> Result<Principal, TokenError> {
    let mut validation = Validation::default();
    validation.validate_exp = false;

    let data =
        jsonwebtoken::decode::<Claims>(token, &key.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            }
        })?;

    let now = chrono::Utc::now().timestamp();
    if now >= data.claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(Principal::from(data.claims))
}
