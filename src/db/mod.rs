use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::utils::config::DbConfig;

pub type Db = SqlitePool;

pub mod profile;
pub mod token;
pub mod user;

use profile::Profile;
use token::LoginToken;
use user::User;

/// Create a new db connection pool, initializing and running migrations if necessary.
pub async fn init(db_config: &DbConfig) -> anyhow::Result<Db> {
    let url = format!("sqlite://{}", db_config.file.display());
    if !Sqlite::database_exists(&url).await? {
        Sqlite::create_database(&url).await?;
    }
    let db = SqlitePool::connect(&url).await?;

    sqlx::migrate!("./migrations").run(&db).await.context("running migrations")?;

    if let Some(seed_data) = &db_config.seed_data {
        seed_db(&db, seed_data).await?;
    }

    Ok(db)
}

/// A fresh, migrated in-memory database.
///
/// Every sqlite `:memory:` connection is its own database, so the pool is pinned to one connection.
#[cfg(test)]
pub async fn init_in_memory() -> anyhow::Result<Db> {
    let db = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    Ok(db)
}

#[derive(Deserialize)]
struct SeedData {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    profiles: Vec<Profile>,
    #[serde(default)]
    login_tokens: Vec<SeedLoginToken>,
}

#[derive(Deserialize)]
struct SeedLoginToken {
    user_id: Uuid,
    token: String,
}

impl SeedData {
    pub async fn load(file: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(file).await?;
        toml::from_str(&contents).with_context(|| format!("loading seed data={file:#?}"))
    }
}

async fn seed_db(db: &Db, seed_data_path: &Path) -> anyhow::Result<()> {
    let seed_data = SeedData::load(seed_data_path).await?;

    for user in seed_data.users {
        if User::lookup(db, user.id).await?.is_none() {
            User::create(db, &user).await?;
        }
    }

    for profile in seed_data.profiles {
        if Profile::lookup(db, profile.id).await?.is_none() {
            Profile::create(db, &profile).await?;
        }
    }

    for login_token in seed_data.login_tokens {
        LoginToken::insert(db, login_token.user_id, &login_token.token).await?;
    }

    tracing::info!("Seeded database from {}", seed_data_path.display());
    Ok(())
}
