use std::str::FromStr;

use argon2::Params;
use serde::Deserialize;

/// Cost parameters handed to argon2.
#[derive(Debug, Clone, Deserialize)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    /// Smallest parameters argon2 accepts. Only meant for tests.
    pub fn cheapest() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

/// Rules applied by the user record on create, update and password reset.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRules {
    pub password_min_length: usize,
    pub password_max_length: usize,
    pub reset_password_within_minutes: i64,
}

impl Default for UserRules {
    fn default() -> Self {
        Self {
            password_min_length: 6,
            password_max_length: 128,
            reset_password_within_minutes: 6 * 60,
        }
    }
}

impl UserRules {
    pub fn reset_password_within(&self) -> time::Duration {
        time::Duration::minutes(self.reset_password_within_minutes)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub use_memory_store: bool,
    pub rules: UserRules,
    pub hashing: HashingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let use_memory_store = env_or("USE_MEMORY_STORE", false);
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) if use_memory_store => String::new(),
            Err(e) => return Err(anyhow::anyhow!("DATABASE_URL: {e}")),
        };

        let rule_defaults = UserRules::default();
        let rules = UserRules {
            password_min_length: env_or("PASSWORD_MIN_LENGTH", rule_defaults.password_min_length),
            password_max_length: env_or("PASSWORD_MAX_LENGTH", rule_defaults.password_max_length),
            reset_password_within_minutes: env_or(
                "RESET_PASSWORD_WITHIN_MINUTES",
                rule_defaults.reset_password_within_minutes,
            ),
        };
        anyhow::ensure!(
            rules.password_min_length >= 1 && rules.password_min_length <= rules.password_max_length,
            "PASSWORD_MIN_LENGTH must be between 1 and PASSWORD_MAX_LENGTH"
        );

        let hash_defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: env_or("ARGON2_MEMORY_KIB", hash_defaults.memory_kib),
            iterations: env_or("ARGON2_ITERATIONS", hash_defaults.iterations),
            parallelism: env_or("ARGON2_PARALLELISM", hash_defaults.parallelism),
        };

        Ok(Self {
            database_url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            use_memory_store,
            rules,
            hashing,
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
