use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::UserError,
    state::AppState,
    users::{
        dto::{PublicUser, ResetPasswordRequest, SignInRequest},
        params::UserParams,
    },
};

type Rejection = (StatusCode, String);

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/sign_in", post(sign_in))
        .route("/users/password", put(reset_password))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(destroy_user),
        )
}

fn reject(e: UserError) -> Rejection {
    e.into()
}

#[instrument(skip(state, params))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(params): Json<UserParams>,
) -> Result<(StatusCode, Json<PublicUser>), Rejection> {
    let user = state.users.create(params).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, Rejection> {
    let user = state
        .users
        .find(id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(UserError::NotFound(id)))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, params))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<UserParams>,
) -> Result<Json<PublicUser>, Rejection> {
    let mut user = state
        .users
        .find(id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(UserError::NotFound(id)))?;
    state.users.update(&mut user, params).await.map_err(reject)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn destroy_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Rejection> {
    let user = state
        .users
        .find(id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(UserError::NotFound(id)))?;
    state.users.destroy(user).await.map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<PublicUser>, Rejection> {
    let Some(mut user) = state
        .users
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(reject)?
    else {
        warn!("sign in rejected");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    };

    if payload.remember_me {
        state.users.remember_me(&mut user).await.map_err(reject)?;
    }
    info!(user_id = user.id, "user signed in");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<PublicUser>, Rejection> {
    let user = state
        .users
        .reset_password_by_token(&payload.reset_password_token, &payload.password)
        .await
        .map_err(reject)?;
    Ok(Json(user.into()))
}
