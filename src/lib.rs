pub mod app;
pub mod config;
pub mod error;
pub mod state;
pub mod users;

pub use error::{ErrorKind, UserError};
