use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{Ability, Account, Hero, HeroFilter, NewHero, RefreshTokenState};
use crate::error::AppError;
use crate::store::{AccountStore, HeroStore};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
}

/// Account store backed by a mutex-guarded map
///
/// Every operation runs under a single lock, so `swap_refresh_token`
/// compares and writes atomically.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let accounts = lock(&self.accounts)?;
        Ok(accounts.values().find(|a| a.username == username).cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(lock(&self.accounts)?.get(&id).cloned())
    }

    async fn find_account_by_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<Account>, AppError> {
        let accounts = lock(&self.accounts)?;
        Ok(accounts
            .values()
            .find(|a| a.refresh_token.token_hash() == Some(token_hash))
            .cloned())
    }

    async fn account_exists(&self, username: &str) -> Result<bool, AppError> {
        let accounts = lock(&self.accounts)?;
        Ok(accounts.values().any(|a| a.username == username))
    }

    async fn insert(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = lock(&self.accounts)?;
        if accounts.values().any(|a| a.username == account.username) {
            return Err(AppError::conflict("Username already taken"));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn save(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = lock(&self.accounts)?;
        match accounts.get_mut(&account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(AppError::not_found(format!("Account {} not found", account.id))),
        }
    }

    async fn swap_refresh_token(
        &self,
        account_id: Uuid,
        expected_hash: &str,
        new_state: &RefreshTokenState,
    ) -> Result<bool, AppError> {
        let mut accounts = lock(&self.accounts)?;
        match accounts.get_mut(&account_id) {
            Some(account) if account.refresh_token.token_hash() == Some(expected_hash) => {
                account.refresh_token = new_state.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Debug)]
struct HeroTable {
    heroes: BTreeMap<i64, Hero>,
    next_hero_id: i64,
    next_ability_id: i64,
}

impl HeroTable {
    fn abilities_for(&mut self, hero: &NewHero) -> Vec<Ability> {
        hero.abilities
            .iter()
            .map(|ability| {
                let id = self.next_ability_id;
                self.next_ability_id += 1;
                Ability {
                    id,
                    name: ability.name.clone(),
                    description: ability.description.clone(),
                    icon: ability.icon.clone(),
                }
            })
            .collect()
    }
}

/// Hero store backed by an ordered map with serial ids
#[derive(Debug)]
pub struct InMemoryHeroStore {
    table: Mutex<HeroTable>,
}

impl InMemoryHeroStore {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HeroTable {
                heroes: BTreeMap::new(),
                next_hero_id: 1,
                next_ability_id: 1,
            }),
        }
    }
}

impl Default for InMemoryHeroStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HeroStore for InMemoryHeroStore {
    async fn list(&self, filter: &HeroFilter) -> Result<Vec<Hero>, AppError> {
        let table = lock(&self.table)?;
        Ok(table
            .heroes
            .values()
            .filter(|hero| filter.matches(hero))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Hero>, AppError> {
        Ok(lock(&self.table)?.heroes.get(&id).cloned())
    }

    async fn create(&self, hero: &NewHero) -> Result<Hero, AppError> {
        let mut table = lock(&self.table)?;
        let id = table.next_hero_id;
        table.next_hero_id += 1;
        let abilities = table.abilities_for(hero);

        let created = Hero {
            id,
            name: hero.name.clone(),
            role: hero.role,
            portrait: hero.portrait.clone(),
            description: hero.description.clone(),
            health: hero.health,
            armor: hero.armor,
            shields: hero.shields,
            abilities,
        };
        table.heroes.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, hero: &NewHero) -> Result<bool, AppError> {
        let mut table = lock(&self.table)?;
        if !table.heroes.contains_key(&id) {
            return Ok(false);
        }
        let abilities = table.abilities_for(hero);

        if let Some(stored) = table.heroes.get_mut(&id) {
            stored.name = hero.name.clone();
            stored.role = hero.role;
            stored.portrait = hero.portrait.clone();
            stored.description = hero.description.clone();
            stored.health = hero.health;
            stored.armor = hero.armor;
            stored.shields = hero.shields;
            stored.abilities = abilities;
        }
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(lock(&self.table)?.heroes.remove(&id).is_some())
    }
}
