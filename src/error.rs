use std::fmt;

use axum::http::StatusCode;
use serde::Serialize;

/// Attribute a validation failure is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Password,
    ResetPasswordToken,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Password => "password",
            Field::ResetPasswordToken => "reset_password_token",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Violation {
    Blank,
    Taken,
    Invalid,
    TooShort { min: usize },
    TooLong { max: usize },
    Expired,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Blank => f.write_str("can't be blank"),
            Violation::Taken => f.write_str("has already been taken"),
            Violation::Invalid => f.write_str("is invalid"),
            Violation::TooShort { min } => write!(f, "is too short (minimum is {min} characters)"),
            Violation::TooLong { max } => write!(f, "is too long (maximum is {max} characters)"),
            Violation::Expired => f.write_str("has expired, please request a new one"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    #[serde(flatten)]
    pub violation: Violation,
}

/// Every failing attribute of a rejected create/update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: Field, violation: Violation) -> Self {
        let mut errors = Self::new();
        errors.add(field, violation);
        errors
    }

    pub fn add(&mut self, field: Field, violation: Violation) {
        self.0.push(FieldError { field, violation });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn has(&self, field: Field, violation: Violation) -> bool {
        self.0.iter().any(|e| e.field == field && e.violation == violation)
    }

    pub fn on(&self, field: Field) -> impl Iterator<Item = &Violation> {
        self.0.iter().filter(move |e| e.field == field).map(|e| &e.violation)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), UserError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(UserError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", e.field.as_str(), e.violation)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("user {0} not found")]
    NotFound(i64),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fieldless discriminant of [`UserError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Hash,
    Database,
}

impl UserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::Validation(_) => ErrorKind::Validation,
            UserError::NotFound(_) => ErrorKind::NotFound,
            UserError::Hash(_) => ErrorKind::Hash,
            UserError::Database(_) => ErrorKind::Database,
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            UserError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<UserError> for (StatusCode, String) {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::to_string(&errors).unwrap_or_else(|_| errors.to_string()),
            ),
            UserError::NotFound(id) => (StatusCode::NOT_FOUND, format!("User {id} not found")),
            other => {
                tracing::error!(error = %other, "user operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        }
    }
}
