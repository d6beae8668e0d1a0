/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed with the configured secret and carry
/// issuer, audience and expiry; any holder of the secret can verify them
/// without touching the store.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::domain::Account;
use crate::error::{AppError, AuthError};

/// A signed access token and the instant it stops being valid
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a new access token for an account
///
/// # Errors
/// Returns error if token encoding fails
pub fn generate_access_token(
    account: &Account,
    config: &JwtSettings,
) -> Result<AccessToken, AppError> {
    generate_access_token_at(account, config, Utc::now())
}

pub(crate) fn generate_access_token_at(
    account: &Account,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<AccessToken, AppError> {
    let claims = Claims::new(
        account.id,
        account.username.clone(),
        now,
        config.access_token_lifetime(),
        config.issuer.clone(),
        config.audience.clone(),
    );

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    Ok(AccessToken {
        token,
        expires_at: claims.expires_at()?,
    })
}

/// Validate and extract claims from an access token
///
/// # Errors
/// Returns error if the signature, issuer, audience or expiry do not check out
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT validation error: {}", e);
        AppError::Auth(AuthError::TokenInvalid)
    })
}
