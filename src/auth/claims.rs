/// JWT Claims structure
///
/// Payload of an access token: who the subject is, plus the standard
/// registered claims (RFC 7519).

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    /// Subject display name (username)
    pub name: String,
    /// Unique token ID, fresh for every issuance
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    /// Create claims for an account, expiring `lifetime` after `now`
    pub fn new(
        account_id: Uuid,
        username: String,
        now: DateTime<Utc>,
        lifetime: Duration,
        issuer: String,
        audience: String,
    ) -> Self {
        let iat = now.timestamp();
        Self {
            sub: account_id.to_string(),
            name: username,
            jti: Uuid::new_v4().to_string(),
            exp: (now + lifetime).timestamp(),
            iat,
            iss: issuer,
            aud: audience,
        }
    }

    /// Extract account ID from claims
    ///
    /// # Errors
    /// Returns error if the subject is not a valid UUID
    pub fn account_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    /// `exp` as a timestamp
    ///
    /// # Errors
    /// Returns an internal error if `exp` is outside chrono's representable range
    pub fn expires_at(&self) -> Result<DateTime<Utc>, AppError> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .ok_or_else(|| AppError::Internal(format!("exp {} is out of range", self.exp)))
    }
}
