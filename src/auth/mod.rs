/// Authentication module
///
/// Credential verification, access token signing/validation, password
/// hashing, and refresh token issuance and rotation.

mod claims;
mod credentials;
mod jwt;
mod password;
mod refresh_token;

pub use claims::Claims;
pub use credentials::verify_credentials;
pub use jwt::generate_access_token;
pub use jwt::validate_access_token;
pub use jwt::AccessToken;
pub use password::hash_password;
pub use password::verify_password;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::hash_token;
pub use refresh_token::issue_tokens;
pub use refresh_token::revoke_refresh_token;
pub use refresh_token::rotate_refresh_token;
pub use refresh_token::IssuedTokens;
