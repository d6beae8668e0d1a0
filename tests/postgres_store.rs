//! Store tests against a real PostgreSQL server.
//!
//! Each test creates its own database from `configuration.yaml` (or `APP__DATABASE__*`)
//! and runs the migrations. Run with `cargo test -- --ignored` once Postgres is up.

use chrono::{Duration, Utc};
use heroes_api::auth::{generate_refresh_token, hash_token, issue_tokens, rotate_refresh_token};
use heroes_api::configuration::{get_configuration, DatabaseSettings, JwtSettings};
use heroes_api::domain::{Account, HeroFilter, HeroRole, NewAbility, NewHero, RefreshTokenState};
use heroes_api::error::{AppError, AuthError, DatabaseError};
use heroes_api::store::{AccountStore, HeroStore, PgAccountStore, PgHeroStore};
use sqlx::{Connection, Executor, PgConnection, PgPool};

struct TestDb {
    pool: PgPool,
    accounts: PgAccountStore,
    heroes: PgHeroStore,
    jwt_config: JwtSettings,
}

async fn spawn_db() -> TestDb {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let pool = configure_database(&configuration.database).await;

    TestDb {
        accounts: PgAccountStore::new(pool.clone()),
        heroes: PgHeroStore::new(pool.clone()),
        pool,
        jwt_config: configuration.jwt,
    }
}

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate the database.");
    pool
}

async fn insert_alice(db: &TestDb) -> Account {
    let account = Account::new("alice".to_string(), "hash".to_string());
    db.accounts.insert(&account).await.expect("Failed to insert account");
    account
}

fn active(token: &str, expires_in: Duration) -> RefreshTokenState {
    RefreshTokenState::ActiveRefreshToken {
        token_hash: hash_token(token),
        expires_at: Utc::now() + expires_in,
    }
}

fn new_hero(name: &str, role: HeroRole, abilities: &[&str]) -> NewHero {
    NewHero {
        name: name.to_string(),
        role,
        portrait: None,
        description: Some(format!("{} description", name)),
        health: 200,
        armor: 0,
        shields: 0,
        abilities: abilities
            .iter()
            .map(|name| NewAbility {
                name: name.to_string(),
                description: None,
                icon: None,
            })
            .collect(),
    }
}

async fn ability_count(pool: &PgPool, hero_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM abilities WHERE hero_id = $1")
        .bind(hero_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count abilities")
}

// --- Account Store Tests ---

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn insert_and_find_account() {
    let db = spawn_db().await;
    let account = insert_alice(&db).await;

    let by_name = db
        .accounts
        .find_account_by_username("alice")
        .await
        .unwrap()
        .expect("Account not found by username");
    assert_eq!(by_name.id, account.id);
    assert_eq!(by_name.refresh_token, RefreshTokenState::NoActiveRefreshToken);

    assert!(db.accounts.account_exists("alice").await.unwrap());
    assert!(!db.accounts.account_exists("Alice").await.unwrap());
    assert!(db.accounts.find_account_by_id(account.id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn duplicate_username_is_a_conflict() {
    let db = spawn_db().await;
    insert_alice(&db).await;

    let result = db
        .accounts
        .insert(&Account::new("alice".to_string(), "other".to_string()))
        .await;

    match result {
        Err(AppError::Database(DatabaseError::UniqueConstraintViolation(msg))) => {
            assert_eq!(msg, "Username already taken")
        }
        other => panic!("Expected conflict, got {:?}", other),
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn shared_refresh_token_hash_is_a_generic_duplicate() {
    let db = spawn_db().await;
    let mut alice = insert_alice(&db).await;
    let mut bob = Account::new("bob".to_string(), "hash".to_string());
    db.accounts.insert(&bob).await.unwrap();

    alice.refresh_token = active("shared", Duration::days(1));
    db.accounts.save(&alice).await.unwrap();
    bob.refresh_token = active("shared", Duration::days(1));

    match db.accounts.save(&bob).await {
        Err(AppError::Database(DatabaseError::UniqueConstraintViolation(msg))) => {
            assert_eq!(msg, "Duplicate entry")
        }
        other => panic!("Expected conflict, got {:?}", other),
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn swap_refresh_token_only_replaces_the_expected_hash() {
    let db = spawn_db().await;
    let mut account = insert_alice(&db).await;
    account.refresh_token = active("first", Duration::days(1));
    db.accounts.save(&account).await.unwrap();

    let found = db
        .accounts
        .find_account_by_refresh_token(&hash_token("first"))
        .await
        .unwrap()
        .expect("Account not found by refresh token");
    assert_eq!(found.id, account.id);

    let second = active("second", Duration::days(1));
    let stale = db
        .accounts
        .swap_refresh_token(account.id, &hash_token("never-issued"), &second)
        .await
        .unwrap();
    assert!(!stale);

    let swapped = db
        .accounts
        .swap_refresh_token(account.id, &hash_token("first"), &second)
        .await
        .unwrap();
    assert!(swapped);

    // the old hash no longer matches anything, including a second swap
    assert!(db
        .accounts
        .find_account_by_refresh_token(&hash_token("first"))
        .await
        .unwrap()
        .is_none());
    assert!(!db
        .accounts
        .swap_refresh_token(account.id, &hash_token("first"), &RefreshTokenState::NoActiveRefreshToken)
        .await
        .unwrap());

    let stored = db.accounts.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.token_hash(), Some(hash_token("second").as_str()));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn half_set_refresh_token_columns_are_rejected() {
    let db = spawn_db().await;
    let account = insert_alice(&db).await;

    let result = sqlx::query("UPDATE accounts SET refresh_token_hash = 'abc' WHERE id = $1")
        .bind(account.id)
        .execute(&db.pool)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn rotation_over_postgres() {
    let db = spawn_db().await;
    let account = insert_alice(&db).await;

    let issued = issue_tokens(&db.accounts, account, &db.jwt_config).await.unwrap();
    let rotated = rotate_refresh_token(&db.accounts, &issued.refresh_token, &db.jwt_config)
        .await
        .unwrap();

    let replay = rotate_refresh_token(&db.accounts, &issued.refresh_token, &db.jwt_config).await;
    assert!(matches!(replay, Err(AppError::Auth(AuthError::RefreshTokenInvalid))));

    let (a, b) = tokio::join!(
        rotate_refresh_token(&db.accounts, &rotated.refresh_token, &db.jwt_config),
        rotate_refresh_token(&db.accounts, &rotated.refresh_token, &db.jwt_config),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn expired_refresh_token_is_cleared() {
    let db = spawn_db().await;
    let mut account = insert_alice(&db).await;
    let token = generate_refresh_token();
    account.refresh_token = active(&token, -Duration::minutes(1));
    db.accounts.save(&account).await.unwrap();

    let result = rotate_refresh_token(&db.accounts, &token, &db.jwt_config).await;
    assert!(matches!(result, Err(AppError::Auth(AuthError::RefreshTokenExpired))));

    let stored = db.accounts.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token, RefreshTokenState::NoActiveRefreshToken);
}

// --- Hero Store Tests ---

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn create_get_and_filter_heroes() {
    let db = spawn_db().await;
    let reinhardt = db
        .heroes
        .create(&new_hero("Reinhardt", HeroRole::Tank, &["Charge", "Earthshatter"]))
        .await
        .unwrap();
    db.heroes
        .create(&new_hero("Tracer", HeroRole::Damage, &["Blink"]))
        .await
        .unwrap();

    let fetched = db.heroes.get(reinhardt.id).await.unwrap().expect("Hero not found");
    assert_eq!(fetched, reinhardt);

    let tanks = db
        .heroes
        .list(&HeroFilter { role: Some("TANK".to_string()), name: None }.normalized())
        .await
        .unwrap();
    assert_eq!(tanks.len(), 1);
    assert_eq!(tanks[0].name, "Reinhardt");

    let named = db
        .heroes
        .list(&HeroFilter { role: None, name: Some("RAC".to_string()) }.normalized())
        .await
        .unwrap();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].abilities.len(), 1);

    let all = db.heroes.list(&HeroFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].id < all[1].id);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn update_replaces_abilities() {
    let db = spawn_db().await;
    let hero = db
        .heroes
        .create(&new_hero("Ana", HeroRole::Support, &["Sleep Dart", "Biotic Grenade"]))
        .await
        .unwrap();

    let mut replacement = new_hero("Ana", HeroRole::Support, &["Nano Boost"]);
    replacement.health = 250;
    assert!(db.heroes.update(hero.id, &replacement).await.unwrap());

    let updated = db.heroes.get(hero.id).await.unwrap().unwrap();
    assert_eq!(updated.health, 250);
    assert_eq!(updated.abilities.len(), 1);
    assert_eq!(updated.abilities[0].name, "Nano Boost");
    assert_eq!(ability_count(&db.pool, hero.id).await, 1);

    assert!(!db.heroes.update(hero.id + 1000, &replacement).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn delete_cascades_to_abilities() {
    let db = spawn_db().await;
    let hero = db
        .heroes
        .create(&new_hero("Mercy", HeroRole::Support, &["Resurrect", "Guardian Angel"]))
        .await
        .unwrap();
    assert_eq!(ability_count(&db.pool, hero.id).await, 2);

    assert!(db.heroes.delete(hero.id).await.unwrap());

    assert!(db.heroes.get(hero.id).await.unwrap().is_none());
    assert_eq!(ability_count(&db.pool, hero.id).await, 0);
    assert!(!db.heroes.delete(hero.id).await.unwrap());
}
