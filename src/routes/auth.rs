/// Authentication Routes
///
/// Registration, login, token refresh, logout and current account lookup.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    hash_password, issue_tokens, revoke_refresh_token, rotate_refresh_token, verify_credentials,
    Claims, IssuedTokens,
};
use crate::configuration::JwtSettings;
use crate::domain::validation::{is_valid_password, is_valid_username, require};
use crate::domain::Account;
use crate::error::{AppError, ValidationError};
use crate::store::AccountStore;

/// Credentials body shared by register and login
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Token pair returned by login and refresh
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub token_type: String,
}

impl From<IssuedTokens> for TokenResponse {
    fn from(tokens: IssuedTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            token_type: "Bearer".to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
        }
    }
}

/// POST /auth/register
///
/// # Errors
/// - 400: invalid username or password
/// - 409: username already taken
pub async fn register(
    form: web::Json<CredentialsRequest>,
    store: web::Data<dyn AccountStore>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    is_valid_password(&form.password)?;

    if store.account_exists(&username).await? {
        return Err(AppError::conflict("Username already taken"));
    }

    let password_hash = hash_password(&form.password).await?;
    let account = Account::new(username, password_hash);
    store.insert(&account).await?;

    tracing::info!(account_id = %account.id, "Account registered successfully");

    Ok(HttpResponse::Created().json(AccountResponse::from(&account)))
}

/// POST /auth/login
///
/// # Errors
/// - 400: missing username or password
/// - 401: unknown username or wrong password, with the same body either way
pub async fn login(
    form: web::Json<CredentialsRequest>,
    store: web::Data<dyn AccountStore>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    // registration stores the trimmed username
    let username = form.username.trim();
    require("username", username)?;
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()).into());
    }

    let account = verify_credentials(store.get_ref(), username, &form.password).await?;
    let account_id = account.id;
    let tokens = issue_tokens(store.get_ref(), account, jwt_config.get_ref()).await?;

    tracing::info!(account_id = %account_id, "Account logged in successfully");

    Ok(HttpResponse::Ok().json(TokenResponse::from(tokens)))
}

/// POST /auth/refresh
///
/// Rotates the refresh token: the presented one stops working.
///
/// # Errors
/// - 400: refresh token missing or empty
/// - 401: unknown, already rotated, or expired refresh token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    store: web::Data<dyn AccountStore>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let tokens =
        rotate_refresh_token(store.get_ref(), &form.refresh_token, jwt_config.get_ref()).await?;

    tracing::info!("Token refreshed successfully");

    Ok(HttpResponse::Ok().json(TokenResponse::from(tokens)))
}

/// POST /auth/logout
///
/// **Requires valid JWT access token.** Drops the account's refresh token.
pub async fn logout(
    claims: web::ReqData<Claims>,
    store: web::Data<dyn AccountStore>,
) -> Result<HttpResponse, AppError> {
    let account_id = claims.account_id()?;
    revoke_refresh_token(store.get_ref(), account_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /auth/me
///
/// **Requires valid JWT access token.** Claims are injected by the JWT middleware.
///
/// # Errors
/// - 401: missing or invalid token (handled by middleware)
/// - 404: account no longer exists
pub async fn get_current_account(
    claims: web::ReqData<Claims>,
    store: web::Data<dyn AccountStore>,
) -> Result<HttpResponse, AppError> {
    let account_id = claims.account_id()?;

    let account = store
        .find_account_by_id(account_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account {} not found", account_id)))?;

    Ok(HttpResponse::Ok().json(AccountResponse::from(&account)))
}
