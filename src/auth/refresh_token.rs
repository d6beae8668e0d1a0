/// Refresh Token Management
///
/// Refresh tokens are:
/// - 64 random alphanumeric characters from a CSPRNG (about 380 bits)
/// - Stored only as a SHA-256 hex digest, never in plaintext
/// - One per account; issuing a new one replaces whatever was there
/// - Rotated on every use with a compare-and-swap on the previous digest,
///   so two concurrent refreshes with the same token cannot both succeed

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::jwt::generate_access_token;
use crate::configuration::JwtSettings;
use crate::domain::{Account, RefreshTokenState};
use crate::error::{AppError, AuthError, ValidationError};
use crate::store::AccountStore;

const REFRESH_TOKEN_LENGTH: usize = 64;

/// Access token, refresh token and the access token's expiry
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a new cryptographically secure refresh token
///
/// The plaintext goes to the client; the server keeps only its hash.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a refresh token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn new_refresh_token(config: &JwtSettings, now: DateTime<Utc>) -> (String, RefreshTokenState) {
    let token = generate_refresh_token();
    let state = RefreshTokenState::ActiveRefreshToken {
        token_hash: hash_token(&token),
        expires_at: now + config.refresh_token_lifetime(),
    };
    (token, state)
}

/// Issue an access token and a fresh refresh token for a just-authenticated account
///
/// Overwrites any refresh token the account already had.
///
/// # Errors
/// Returns error if signing fails or the account cannot be saved
#[tracing::instrument(name = "issue_tokens", skip(store, account, config), fields(account_id = %account.id))]
pub async fn issue_tokens(
    store: &dyn AccountStore,
    mut account: Account,
    config: &JwtSettings,
) -> Result<IssuedTokens, AppError> {
    let access = generate_access_token(&account, config)?;
    let (refresh_token, state) = new_refresh_token(config, Utc::now());

    account.refresh_token = state;
    store.save(&account).await?;

    Ok(IssuedTokens {
        access_token: access.token,
        refresh_token,
        expires_at: access.expires_at,
    })
}

/// Exchange a refresh token for a new token pair
///
/// 1. Empty token: validation error.
/// 2. No account holds it: `RefreshTokenInvalid`.
/// 3. Expired: the slot is cleared, then `RefreshTokenExpired`.
/// 4. Otherwise the slot is swapped for a new token. If another refresh
///    swapped it first, this one fails with `RefreshTokenInvalid`.
///
/// # Errors
/// See above; store failures propagate unchanged
#[tracing::instrument(name = "rotate_refresh_token", skip_all, fields(account_id = tracing::field::Empty))]
pub async fn rotate_refresh_token(
    store: &dyn AccountStore,
    presented: &str,
    config: &JwtSettings,
) -> Result<IssuedTokens, AppError> {
    if presented.is_empty() {
        return Err(ValidationError::EmptyField("refreshToken".to_string()).into());
    }

    let presented_hash = hash_token(presented);
    let account = match store.find_account_by_refresh_token(&presented_hash).await? {
        Some(account) => account,
        None => {
            tracing::warn!("Refresh token not found");
            return Err(AuthError::RefreshTokenInvalid.into());
        }
    };
    tracing::Span::current().record("account_id", tracing::field::display(account.id));

    let now = Utc::now();
    if account.refresh_token.is_expired_at(now) {
        store
            .swap_refresh_token(
                account.id,
                &presented_hash,
                &RefreshTokenState::NoActiveRefreshToken,
            )
            .await?;
        tracing::warn!("Expired refresh token presented, cleared");
        return Err(AuthError::RefreshTokenExpired.into());
    }

    let access = generate_access_token(&account, config)?;
    let (refresh_token, state) = new_refresh_token(config, now);

    if !store
        .swap_refresh_token(account.id, &presented_hash, &state)
        .await?
    {
        tracing::warn!("Refresh token was rotated concurrently");
        return Err(AuthError::RefreshTokenInvalid.into());
    }

    Ok(IssuedTokens {
        access_token: access.token,
        refresh_token,
        expires_at: access.expires_at,
    })
}

/// Drop the account's refresh token, if any
///
/// # Errors
/// Returns not-found if the account no longer exists
pub async fn revoke_refresh_token(store: &dyn AccountStore, account_id: Uuid) -> Result<(), AppError> {
    let mut account = store
        .find_account_by_id(account_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account {} not found", account_id)))?;

    account.refresh_token = RefreshTokenState::NoActiveRefreshToken;
    store.save(&account).await?;

    tracing::info!(account_id = %account_id, "Refresh token revoked");
    Ok(())
}
