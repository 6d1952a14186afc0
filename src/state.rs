use std::sync::Arc;

use anyhow::Context;

use crate::config::{AppConfig, HashingConfig, UserRules};
use crate::users::{
    memory::MemoryUserRepository,
    password::Argon2Encryptor,
    repo::{PgUserRepository, UserRepository},
    UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let repo: Arc<dyn UserRepository> = if config.use_memory_store {
            tracing::warn!("USE_MEMORY_STORE is set; users live only as long as the process");
            Arc::new(MemoryUserRepository::new())
        } else {
            let db = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await
                .context("connect to database")?;
            sqlx::migrate!("./migrations")
                .run(&db)
                .await
                .context("run migrations")?;
            Arc::new(PgUserRepository::new(db))
        };

        Self::from_parts(repo, config)
    }

    pub fn from_parts(repo: Arc<dyn UserRepository>, config: AppConfig) -> anyhow::Result<Self> {
        let encryptor = Argon2Encryptor::new(&config.hashing).context("argon2 parameters")?;
        let users = UserService::new(repo, Arc::new(encryptor), config.rules.clone());
        Ok(Self {
            users,
            config: Arc::new(config),
        })
    }

    /// In-memory store with the cheapest argon2 settings.
    pub fn fake() -> Self {
        let config = AppConfig {
            database_url: String::new(),
            max_connections: 1,
            use_memory_store: true,
            rules: UserRules::default(),
            hashing: HashingConfig::cheapest(),
        };
        let users = UserService::new(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(Argon2Encryptor::new(&config.hashing).expect("minimum argon2 params are valid")),
            config.rules.clone(),
        );
        Self {
            users,
            config: Arc::new(config),
        }
    }
}
