//! Access token issuance and verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::AuthError;
use super::users::UserRole;

/// Fixed token lifetime (24 hours).
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// JWT claims.
///
/// The role is copied at issuance and never re-checked against the user
/// store, so role changes and deletions only take effect once outstanding
/// tokens expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// User role.
    pub role: UserRole,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Issues and verifies HS256 access tokens with a process-wide secret.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtManager {
    /// Create a manager for the given secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Create a manager from the configured secret, or a fresh random one.
    ///
    /// A random secret lives only as long as the process, so tokens issued
    /// with it stop verifying after a restart.
    #[must_use]
    pub fn from_configured(secret: Option<&str>) -> Self {
        if let Some(secret) = secret {
            return Self::new(secret.as_bytes());
        }
        tracing::warn!(
            "No JWT secret configured; using a random per-process secret (set YIAGA_JWT_SECRET)"
        );
        Self::new(Self::generate_hex_secret().as_bytes())
    }

    /// Generate a random 256-bit secret key.
    #[must_use]
    pub fn generate_secret() -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    /// Generate a random secret as hex string.
    #[must_use]
    pub fn generate_hex_secret() -> String {
        hex::encode(Self::generate_secret())
    }

    /// Issue a token for a subject, valid for 24 hours from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails.
    pub fn issue(&self, subject: &str, role: UserRole) -> Result<String, AuthError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue a token as if at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails.
    pub fn issue_at(
        &self,
        subject: &str,
        role: UserRole,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSignature` on a MAC mismatch,
    /// `AuthError::Expired` past expiry and `AuthError::Malformed` for
    /// anything that does not decode to the expected claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            })
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("algorithm", &"HS256")
            .field("lifetime_secs", &TOKEN_LIFETIME_SECS)
            .finish_non_exhaustive()
    }
}
