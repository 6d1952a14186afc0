use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{Field, UserError, ValidationErrors, Violation},
    users::{
        model::{NewUser, User},
        repo::UserRepository,
    },
};

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Table {
    fn clash(&self, user_id: Option<i64>, email: &str, token: Option<&str>) -> Option<Field> {
        self.rows
            .values()
            .filter(|row| Some(row.id) != user_id)
            .find_map(|row| {
                if row.email == email {
                    Some(Field::Email)
                } else if token.is_some() && row.reset_password_token.as_deref() == token {
                    Some(Field::ResetPasswordToken)
                } else {
                    None
                }
            })
    }
}

/// Process-local user table. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryUserRepository {
    table: RwLock<Table>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn taken(field: Field) -> UserError {
    UserError::Validation(ValidationErrors::single(field, Violation::Taken))
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, new: NewUser) -> Result<User, UserError> {
        let mut table = self.table.write().await;
        if let Some(field) = table.clash(None, &new.email, None) {
            return Err(taken(field));
        }
        table.last_id += 1;
        let user = new.into_user(table.last_id);
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token(&self, digest: &str) -> Result<Option<User>, UserError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|u| u.reset_password_token.as_deref() == Some(digest))
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<User, UserError> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }
        if let Some(field) = table.clash(Some(user.id), &user.email, user.reset_password_token.as_deref()) {
            return Err(taken(field));
        }
        table.rows.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, UserError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn count(&self) -> Result<i64, UserError> {
        Ok(self.table.read().await.rows.len() as i64)
    }
}
