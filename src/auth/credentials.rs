use crate::auth::password::verify_password;
use crate::domain::Account;
use crate::error::{AppError, AuthError};
use crate::store::AccountStore;

/// Check a username/password pair against the stored bcrypt hash
///
/// An unknown username and a wrong password both end in
/// `AuthError::InvalidCredentials`, so callers cannot tell them apart.
///
/// # Errors
/// - `InvalidCredentials` if the account is missing or the password does not match
/// - store or hashing failures as-is
#[tracing::instrument(name = "verify_credentials", skip(store, password), fields(account_id = tracing::field::Empty))]
pub async fn verify_credentials(
    store: &dyn AccountStore,
    username: &str,
    password: &str,
) -> Result<Account, AppError> {
    let account = match store.find_account_by_username(username).await? {
        Some(account) => account,
        None => {
            tracing::warn!("Login failed: unknown username");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    tracing::Span::current().record("account_id", tracing::field::display(account.id));

    if !verify_password(password, &account.password_hash).await? {
        tracing::warn!("Login failed: password mismatch");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(account)
}
