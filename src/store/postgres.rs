use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{Ability, Account, Hero, HeroFilter, HeroRole, NewHero, RefreshTokenState};
use crate::error::AppError;
use crate::store::{AccountStore, HeroStore};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    password_hash: String,
    refresh_token_hash: Option<String>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            refresh_token: RefreshTokenState::from_columns(
                row.refresh_token_hash,
                row.refresh_token_expires_at,
            ),
            created_at: row.created_at,
        }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, username, password_hash, refresh_token_hash, refresh_token_expires_at, created_at";

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE username = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn find_account_by_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE refresh_token_hash = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn account_exists(&self, username: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, account: &Account) -> Result<(), AppError> {
        let (token_hash, expires_at) = account.refresh_token.to_columns();

        // unique index on username turns a lost registration race into a conflict
        sqlx::query(
            r#"
            INSERT INTO accounts
                (id, username, password_hash, refresh_token_hash, refresh_token_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(token_hash)
        .bind(expires_at)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, account: &Account) -> Result<(), AppError> {
        let (token_hash, expires_at) = account.refresh_token.to_columns();

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2,
                password_hash = $3,
                refresh_token_hash = $4,
                refresh_token_expires_at = $5
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {} not found", account.id)));
        }
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        account_id: Uuid,
        expected_hash: &str,
        new_state: &RefreshTokenState,
    ) -> Result<bool, AppError> {
        let (token_hash, expires_at) = new_state.to_columns();

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET refresh_token_hash = $3,
                refresh_token_expires_at = $4
            WHERE id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(account_id)
        .bind(expected_hash)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[derive(sqlx::FromRow)]
struct HeroRow {
    id: i64,
    name: String,
    role: String,
    portrait: Option<String>,
    description: Option<String>,
    health: i32,
    armor: i32,
    shields: i32,
}

#[derive(sqlx::FromRow)]
struct AbilityRow {
    id: i64,
    hero_id: i64,
    name: String,
    description: Option<String>,
    icon: Option<String>,
}

impl HeroRow {
    fn into_hero(self, abilities: Vec<Ability>) -> Result<Hero, AppError> {
        let role = self
            .role
            .parse::<HeroRole>()
            .map_err(|_| AppError::Internal(format!("Stored hero {} has unknown role", self.id)))?;

        Ok(Hero {
            id: self.id,
            name: self.name,
            role,
            portrait: self.portrait,
            description: self.description,
            health: self.health,
            armor: self.armor,
            shields: self.shields,
            abilities,
        })
    }
}

#[derive(Clone)]
pub struct PgHeroStore {
    pool: PgPool,
}

impl PgHeroStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads abilities for the given heroes and stitches them together, keeping hero order
    async fn attach_abilities(&self, rows: Vec<HeroRow>) -> Result<Vec<Hero>, AppError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let ability_rows = sqlx::query_as::<_, AbilityRow>(
            r#"
            SELECT id, hero_id, name, description, icon
            FROM abilities
            WHERE hero_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_hero: HashMap<i64, Vec<Ability>> = HashMap::new();
        for row in ability_rows {
            by_hero.entry(row.hero_id).or_default().push(Ability {
                id: row.id,
                name: row.name,
                description: row.description,
                icon: row.icon,
            });
        }

        rows.into_iter()
            .map(|row| {
                let abilities = by_hero.remove(&row.id).unwrap_or_default();
                row.into_hero(abilities)
            })
            .collect()
    }
}

async fn insert_abilities(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    hero_id: i64,
    hero: &NewHero,
) -> Result<Vec<Ability>, AppError> {
    let mut abilities = Vec::with_capacity(hero.abilities.len());

    for ability in &hero.abilities {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO abilities (hero_id, name, description, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(hero_id)
        .bind(&ability.name)
        .bind(&ability.description)
        .bind(&ability.icon)
        .fetch_one(&mut *tx)
        .await?;

        abilities.push(Ability {
            id,
            name: ability.name.clone(),
            description: ability.description.clone(),
            icon: ability.icon.clone(),
        });
    }

    Ok(abilities)
}

#[async_trait]
impl HeroStore for PgHeroStore {
    async fn list(&self, filter: &HeroFilter) -> Result<Vec<Hero>, AppError> {
        let rows = sqlx::query_as::<_, HeroRow>(
            r#"
            SELECT id, name, role, portrait, description, health, armor, shields
            FROM heroes
            WHERE ($1::text IS NULL OR LOWER(role) = $1)
              AND ($2::text IS NULL OR STRPOS(LOWER(name), $2) > 0)
            ORDER BY id
            "#,
        )
        .bind(&filter.role)
        .bind(&filter.name)
        .fetch_all(&self.pool)
        .await?;

        self.attach_abilities(rows).await
    }

    async fn get(&self, id: i64) -> Result<Option<Hero>, AppError> {
        let row = sqlx::query_as::<_, HeroRow>(
            r#"
            SELECT id, name, role, portrait, description, health, armor, shields
            FROM heroes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_abilities(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, hero: &NewHero) -> Result<Hero, AppError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO heroes (name, role, portrait, description, health, armor, shields)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&hero.name)
        .bind(hero.role.as_str())
        .bind(&hero.portrait)
        .bind(&hero.description)
        .bind(hero.health)
        .bind(hero.armor)
        .bind(hero.shields)
        .fetch_one(&mut tx)
        .await?;

        let abilities = insert_abilities(&mut tx, id, hero).await?;
        tx.commit().await?;

        Ok(Hero {
            id,
            name: hero.name.clone(),
            role: hero.role,
            portrait: hero.portrait.clone(),
            description: hero.description.clone(),
            health: hero.health,
            armor: hero.armor,
            shields: hero.shields,
            abilities,
        })
    }

    async fn update(&self, id: i64, hero: &NewHero) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE heroes
            SET name = $2, role = $3, portrait = $4, description = $5,
                health = $6, armor = $7, shields = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&hero.name)
        .bind(hero.role.as_str())
        .bind(&hero.portrait)
        .bind(&hero.description)
        .bind(hero.health)
        .bind(hero.armor)
        .bind(hero.shields)
        .execute(&mut tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM abilities WHERE hero_id = $1")
            .bind(id)
            .execute(&mut tx)
            .await?;
        insert_abilities(&mut tx, id, hero).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        // abilities go with the hero via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM heroes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
