use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod params;
pub mod password;
mod recoverable;
pub mod repo;
pub mod service;
mod session;
mod validation;

pub use model::User;
pub use params::UserParams;
pub use service::UserService;
pub use validation::normalize_email;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
