use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    config::UserRules,
    error::{Field, UserError, ValidationErrors, Violation},
    users::{
        model::{NewUser, User},
        params::UserParams,
        password::PasswordEncryptor,
        repo::UserRepository,
        validation::{check_email, check_password, normalize_email},
    },
};

/// Validated record operations over a [`UserRepository`].
#[derive(Clone)]
pub struct UserService {
    pub(crate) repo: Arc<dyn UserRepository>,
    pub(crate) encryptor: Arc<dyn PasswordEncryptor>,
    pub(crate) rules: UserRules,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        encryptor: Arc<dyn PasswordEncryptor>,
        rules: UserRules,
    ) -> Self {
        Self { repo, encryptor, rules }
    }

    pub fn rules(&self) -> &UserRules {
        &self.rules
    }

    /// Validates and inserts a new user.
    ///
    /// A missing, `null` or empty `email`/`password` is rejected. Missing
    /// timestamps default to now. Nothing is written when validation fails.
    #[instrument(skip(self, params))]
    pub async fn create(&self, params: UserParams) -> Result<User, UserError> {
        let mut errors = ValidationErrors::new();

        let email = normalize_email(params.email.as_deref().unwrap_or_default());
        if check_email(&email, &mut errors) && self.repo.find_by_email(&email).await?.is_some() {
            errors.add(Field::Email, Violation::Taken);
        }
        let password = params.password.as_deref().unwrap_or_default();
        check_password(password, &self.rules, &mut errors);

        if let Err(e) = errors.into_result() {
            warn!(error = %e, "user rejected");
            return Err(e);
        }

        let now = OffsetDateTime::now_utc();
        let new = NewUser {
            email,
            encrypted_password: self.encryptor.hash(password)?,
            reset_password_sent_at: params.reset_password_sent_at,
            remember_created_at: params.remember_created_at,
            created_at: params.created_at.unwrap_or(now),
            updated_at: params.updated_at.unwrap_or(now),
        };
        let user = self.repo.insert(new).await?;
        info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn find(&self, id: i64) -> Result<Option<User>, UserError> {
        self.repo.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        self.repo.find_by_email(&normalize_email(email)).await
    }

    pub async fn count(&self) -> Result<i64, UserError> {
        self.repo.count().await
    }

    /// Applies the attributes present in `params`.
    ///
    /// `password: ""` is rejected while a missing or `null` password keeps
    /// the current one. `updated_at` is refreshed unless given explicitly.
    /// `user` is only modified once the row has been written.
    #[instrument(skip(self, user, params), fields(user_id = user.id))]
    pub async fn update(&self, user: &mut User, params: UserParams) -> Result<(), UserError> {
        let mut errors = ValidationErrors::new();
        let mut candidate = user.clone();

        if let Some(raw) = params.email.as_deref() {
            let email = normalize_email(raw);
            if check_email(&email, &mut errors) {
                if let Some(other) = self.repo.find_by_email(&email).await? {
                    if other.id != user.id {
                        errors.add(Field::Email, Violation::Taken);
                    }
                }
            }
            candidate.email = email;
        }

        let new_password = params
            .password
            .as_deref()
            .filter(|p| check_password(p, &self.rules, &mut errors));

        if let Err(e) = errors.into_result() {
            warn!(error = %e, "update rejected");
            return Err(e);
        }

        if let Some(password) = new_password {
            candidate.encrypted_password = self.encryptor.hash(password)?;
        }
        if let Some(created_at) = params.created_at {
            candidate.created_at = created_at;
        }
        if params.reset_password_sent_at.is_some() {
            candidate.reset_password_sent_at = params.reset_password_sent_at;
        }
        if params.remember_created_at.is_some() {
            candidate.remember_created_at = params.remember_created_at;
        }
        candidate.updated_at = params.updated_at.unwrap_or_else(OffsetDateTime::now_utc);

        self.save(user, candidate).await?;
        info!("user updated");
        Ok(())
    }

    /// Deletes the row for good.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn destroy(&self, user: User) -> Result<(), UserError> {
        if !self.repo.delete(user.id).await? {
            warn!("user already gone");
            return Err(UserError::NotFound(user.id));
        }
        info!("user destroyed");
        Ok(())
    }

    pub(crate) async fn save(&self, user: &mut User, candidate: User) -> Result<(), UserError> {
        *user = self.repo.update(&candidate).await?;
        Ok(())
    }
}
