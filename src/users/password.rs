use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::{config::HashingConfig, error::UserError};

/// One-way password hashing used for `encrypted_password`.
pub trait PasswordEncryptor: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, UserError>;
    fn verify(&self, plain: &str, hash: &str) -> Result<bool, UserError>;
}

#[derive(Clone)]
pub struct Argon2Encryptor {
    argon2: Argon2<'static>,
}

impl Argon2Encryptor {
    pub fn new(cfg: &HashingConfig) -> Result<Self, UserError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| UserError::Hash(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordEncryptor for Argon2Encryptor {
    fn hash(&self, plain: &str) -> Result<String, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                UserError::Hash(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, UserError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            UserError::Hash(e.to_string())
        })?;
        // Parameters embedded in the hash win over ours.
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encryptor() -> Argon2Encryptor {
        Argon2Encryptor::new(&HashingConfig::cheapest()).expect("valid params")
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = encryptor().hash(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(encryptor().verify(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = encryptor().hash("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!encryptor().verify("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = encryptor().hash("same").unwrap();
        let b = encryptor().hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = encryptor().verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, UserError::Hash(_)));
    }

    #[test]
    fn rejects_impossible_params() {
        let cfg = HashingConfig { memory_kib: 1, iterations: 0, parallelism: 0 };
        assert!(Argon2Encryptor::new(&cfg).is_err());
    }
}
