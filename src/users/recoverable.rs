use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    error::{Field, UserError, ValidationErrors, Violation},
    users::{model::User, service::UserService, validation::check_password},
};

const TOKEN_LEN: usize = 20;

fn friendly_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Value stored in `reset_password_token`; the clear token is never persisted.
pub(crate) fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn invalid_token() -> UserError {
    UserError::Validation(ValidationErrors::single(Field::ResetPasswordToken, Violation::Invalid))
}

impl UserService {
    /// Issues a new reset token and returns it in clear. Any earlier token
    /// stops working.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn send_reset_password_instructions(&self, user: &mut User) -> Result<String, UserError> {
        let token = friendly_token();
        let now = OffsetDateTime::now_utc();

        let mut candidate = user.clone();
        candidate.reset_password_token = Some(token_digest(&token));
        candidate.reset_password_sent_at = Some(now);
        candidate.updated_at = now;
        self.save(user, candidate).await?;

        info!("reset password token issued");
        Ok(token)
    }

    /// Replaces the password of whoever holds `token` and burns the token.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password_by_token(&self, token: &str, new_password: &str) -> Result<User, UserError> {
        if token.trim().is_empty() {
            return Err(invalid_token());
        }
        let Some(mut user) = self.repo.find_by_reset_token(&token_digest(token)).await? else {
            warn!("unknown reset password token");
            return Err(invalid_token());
        };

        let now = OffsetDateTime::now_utc();
        let mut errors = ValidationErrors::new();
        let in_window = user
            .reset_password_sent_at
            .is_some_and(|sent| now - sent <= self.rules.reset_password_within());
        if !in_window {
            warn!(user_id = user.id, "expired reset password token");
            errors.add(Field::ResetPasswordToken, Violation::Expired);
        }
        check_password(new_password, &self.rules, &mut errors);
        errors.into_result()?;

        let mut candidate = user.clone();
        candidate.encrypted_password = self.encryptor.hash(new_password)?;
        candidate.reset_password_token = None;
        candidate.reset_password_sent_at = None;
        candidate.updated_at = now;
        self.save(&mut user, candidate).await?;

        info!(user_id = user.id, "password reset");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        users::{params::UserParams, service::tests::service},
    };

    #[test]
    fn tokens_are_alphanumeric() {
        let token = friendly_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, friendly_token());
    }

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            token_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn token_resets_password_once() {
        let svc = service();
        let mut user = svc.create(UserParams::new("r@example.com", "old-password")).await.unwrap();

        let token = svc.send_reset_password_instructions(&mut user).await.unwrap();
        assert_eq!(user.reset_password_token.as_deref(), Some(token_digest(&token).as_str()));
        assert!(user.reset_password_sent_at.is_some());

        let reset = svc.reset_password_by_token(&token, "new-password").await.unwrap();
        assert!(reset.reset_password_token.is_none());
        assert!(reset.reset_password_sent_at.is_none());
        assert!(svc.authenticate("r@example.com", "new-password").await.unwrap().is_some());
        assert!(svc.authenticate("r@example.com", "old-password").await.unwrap().is_none());

        let err = svc.reset_password_by_token(&token, "another-one").await.unwrap_err();
        assert!(err.validation_errors().unwrap().has(Field::ResetPasswordToken, Violation::Invalid));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let svc = service();
        let mut user = svc.create(UserParams::new("e@example.com", "old-password")).await.unwrap();
        let token = svc.send_reset_password_instructions(&mut user).await.unwrap();

        let stale = OffsetDateTime::now_utc() - svc.rules().reset_password_within() - time::Duration::minutes(1);
        svc.update(
            &mut user,
            UserParams { reset_password_sent_at: Some(stale), ..Default::default() },
        )
        .await
        .unwrap();

        let err = svc.reset_password_by_token(&token, "new-password").await.unwrap_err();
        assert!(err.validation_errors().unwrap().has(Field::ResetPasswordToken, Violation::Expired));
        assert!(svc.authenticate("e@example.com", "old-password").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn new_password_is_validated() {
        let svc = service();
        let mut user = svc.create(UserParams::new("v@example.com", "old-password")).await.unwrap();
        let token = svc.send_reset_password_instructions(&mut user).await.unwrap();

        let err = svc.reset_password_by_token(&token, "").await.unwrap_err();
        assert!(err.validation_errors().unwrap().has(Field::Password, Violation::Blank));

        // still usable after a rejected attempt
        svc.reset_password_by_token(&token, "new-password").await.unwrap();
    }

    #[tokio::test]
    async fn blank_token_is_invalid() {
        let svc = service();
        let err = svc.reset_password_by_token("   ", "new-password").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
