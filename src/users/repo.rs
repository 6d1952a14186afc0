use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::{
    error::{Field, UserError, ValidationErrors, Violation},
    users::model::{NewUser, User},
};

/// Persistence for user rows.
///
/// Implementations enforce email uniqueness themselves and report a clash
/// as a `taken` validation error.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, new: NewUser) -> Result<User, UserError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
    async fn find_by_reset_token(&self, digest: &str) -> Result<Option<User>, UserError>;
    /// Writes every mutable column of `user`. `NotFound` when the row is gone.
    async fn update(&self, user: &User) -> Result<User, UserError>;
    /// `false` when there was nothing to delete.
    async fn delete(&self, id: i64) -> Result<bool, UserError>;
    async fn count(&self) -> Result<i64, UserError>;
}

const COLUMNS: &str = "id, email, encrypted_password, reset_password_token, \
     reset_password_sent_at, remember_created_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, new: NewUser) -> Result<User, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, encrypted_password, reset_password_sent_at,
                               remember_created_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.encrypted_password)
        .bind(new.reset_password_sent_at)
        .bind(new.remember_created_at)
        .bind(new.created_at)
        .bind(new.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_db_error)?;
        debug!(user_id = user.id, "user row inserted");
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_reset_token(&self, digest: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE reset_password_token = $1"
        ))
        .bind(digest)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, UserError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET email = $2,
                   encrypted_password = $3,
                   reset_password_token = $4,
                   reset_password_sent_at = $5,
                   remember_created_at = $6,
                   created_at = $7,
                   updated_at = $8
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.encrypted_password)
        .bind(&user.reset_password_token)
        .bind(user.reset_password_sent_at)
        .bind(user.remember_created_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_error)?;
        updated.ok_or(UserError::NotFound(user.id))
    }

    async fn delete(&self, id: i64) -> Result<bool, UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, UserError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }
}

fn map_db_error(e: sqlx::Error) -> UserError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(c) if c.contains("reset_password_token") => Field::ResetPasswordToken,
                _ => Field::Email,
            };
            return UserError::Validation(ValidationErrors::single(field, Violation::Taken));
        }
    }
    UserError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    async fn repo() -> PgUserRepository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for Postgres tests");
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to database");
        sqlx::migrate!("./migrations").run(&db).await.expect("run migrations");
        PgUserRepository::new(db)
    }

    fn new_user(email: &str) -> NewUser {
        let now = OffsetDateTime::now_utc();
        NewUser {
            email: email.into(),
            encrypted_password: "$argon2id$placeholder".into(),
            reset_password_sent_at: None,
            remember_created_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn unique_email() -> String {
        format!("pg-{}@example.com", OffsetDateTime::now_utc().unix_timestamp_nanos())
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn insert_find_delete() {
        let repo = repo().await;
        let email = unique_email();
        let user = repo.insert(new_user(&email)).await.expect("insert");
        assert!(user.id > 0);

        let found = repo.find_by_email(&email).await.unwrap().expect("found");
        assert_eq!(found.id, user.id);

        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.find_by_id(user.id).await.unwrap().is_none());
        assert!(!repo.delete(user.id).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn unique_violation_becomes_taken() {
        let repo = repo().await;
        let email = unique_email();
        let first = repo.insert(new_user(&email)).await.expect("insert");

        let err = repo.insert(new_user(&email)).await.unwrap_err();
        let errors = err.validation_errors().expect("validation error");
        assert!(errors.has(Field::Email, Violation::Taken));

        repo.delete(first.id).await.unwrap();
    }
}
