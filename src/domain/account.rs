/// Account identity record
///
/// Owned by the persistence layer; the auth components only read and
/// write it through an `AccountStore`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Refresh-token slot of an account
///
/// At most one refresh token is live per account. The token itself is
/// never kept, only its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTokenState {
    NoActiveRefreshToken,
    ActiveRefreshToken {
        token_hash: String,
        expires_at: DateTime<Utc>,
    },
}

impl RefreshTokenState {
    /// Rebuild the state from the two nullable columns it is stored in.
    /// A half-populated pair is treated as no token at all.
    pub fn from_columns(token_hash: Option<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        match (token_hash, expires_at) {
            (Some(token_hash), Some(expires_at)) => RefreshTokenState::ActiveRefreshToken {
                token_hash,
                expires_at,
            },
            _ => RefreshTokenState::NoActiveRefreshToken,
        }
    }

    pub fn to_columns(&self) -> (Option<&str>, Option<DateTime<Utc>>) {
        match self {
            RefreshTokenState::NoActiveRefreshToken => (None, None),
            RefreshTokenState::ActiveRefreshToken {
                token_hash,
                expires_at,
            } => (Some(token_hash.as_str()), Some(*expires_at)),
        }
    }

    pub fn token_hash(&self) -> Option<&str> {
        match self {
            RefreshTokenState::NoActiveRefreshToken => None,
            RefreshTokenState::ActiveRefreshToken { token_hash, .. } => Some(token_hash),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            RefreshTokenState::NoActiveRefreshToken => false,
            RefreshTokenState::ActiveRefreshToken { expires_at, .. } => *expires_at < now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub refresh_token: RefreshTokenState,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A freshly registered account with no refresh token
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            refresh_token: RefreshTokenState::NoActiveRefreshToken,
            created_at: Utc::now(),
        }
    }
}
