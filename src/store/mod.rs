/// Persistence adapters
///
/// The auth flow and the hero routes only talk to these traits. Handlers
/// receive them as `web::Data<dyn AccountStore>` / `web::Data<dyn HeroStore>`,
/// so the server runs unchanged over PostgreSQL or the in-memory stores.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, Hero, HeroFilter, NewHero, RefreshTokenState};
use crate::error::AppError;

mod memory;
mod postgres;

pub use memory::{InMemoryAccountStore, InMemoryHeroStore};
pub use postgres::{PgAccountStore, PgHeroStore};

/// Account lookup and update surface used by the auth flow
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Exact, case-sensitive username match
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Finds the account whose active refresh token hashes to `token_hash`.
    /// Expired tokens are still returned; callers decide what to do with them.
    async fn find_account_by_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<Account>, AppError>;

    async fn account_exists(&self, username: &str) -> Result<bool, AppError>;

    /// # Errors
    /// Returns a conflict error if the username is taken
    async fn insert(&self, account: &Account) -> Result<(), AppError>;

    /// Overwrites the stored account unconditionally
    async fn save(&self, account: &Account) -> Result<(), AppError>;

    /// Replaces the refresh-token state only if the stored token hash still
    /// equals `expected_hash`. Returns `false` when another writer got there first.
    async fn swap_refresh_token(
        &self,
        account_id: Uuid,
        expected_hash: &str,
        new_state: &RefreshTokenState,
    ) -> Result<bool, AppError>;
}

/// Hero catalog persistence
#[async_trait]
pub trait HeroStore: Send + Sync {
    /// Heroes matching a normalized filter, ordered by id
    async fn list(&self, filter: &HeroFilter) -> Result<Vec<Hero>, AppError>;

    async fn get(&self, id: i64) -> Result<Option<Hero>, AppError>;

    async fn create(&self, hero: &NewHero) -> Result<Hero, AppError>;

    /// Replaces scalar fields and the whole ability list. `false` if no such hero.
    async fn update(&self, id: i64, hero: &NewHero) -> Result<bool, AppError>;

    /// Deletes the hero and its abilities. `false` if no such hero.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}
