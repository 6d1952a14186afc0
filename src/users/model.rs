use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub encrypted_password: String, // argon2 PHC string
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>, // sha-256 digest of the issued token
    #[serde(with = "time::serde::rfc3339::option")]
    pub reset_password_sent_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub remember_created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Column names of the `users` table, in table order.
    pub const COLUMNS: [&'static str; 8] = [
        "id",
        "email",
        "encrypted_password",
        "reset_password_token",
        "reset_password_sent_at",
        "remember_created_at",
        "created_at",
        "updated_at",
    ];
}

/// Row about to be inserted; the store assigns `id`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub encrypted_password: String,
    pub reset_password_sent_at: Option<OffsetDateTime>,
    pub remember_created_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl NewUser {
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            email: self.email,
            encrypted_password: self.encrypted_password,
            reset_password_token: None,
            reset_password_sent_at: self.reset_password_sent_at,
            remember_created_at: self.remember_created_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
