use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::{
    error::UserError,
    users::{model::User, service::UserService, validation::normalize_email},
};

impl UserService {
    /// Returns the user only when `password` matches the stored hash.
    #[instrument(skip(self, email, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, UserError> {
        let Some(user) = self.repo.find_by_email(&normalize_email(email)).await? else {
            debug!("authentication for unknown email");
            return Ok(None);
        };
        if password.is_empty() || !self.encryptor.verify(password, &user.encrypted_password)? {
            debug!(user_id = user.id, "authentication with wrong password");
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Starts a persistent session. An existing one keeps its start time.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn remember_me(&self, user: &mut User) -> Result<(), UserError> {
        if user.remember_created_at.is_some() {
            return Ok(());
        }
        let now = OffsetDateTime::now_utc();
        let mut candidate = user.clone();
        candidate.remember_created_at = Some(now);
        candidate.updated_at = now;
        self.save(user, candidate).await
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn forget_me(&self, user: &mut User) -> Result<(), UserError> {
        if user.remember_created_at.is_none() {
            return Ok(());
        }
        let mut candidate = user.clone();
        candidate.remember_created_at = None;
        candidate.updated_at = OffsetDateTime::now_utc();
        self.save(user, candidate).await
    }
}
