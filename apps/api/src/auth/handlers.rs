use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::password::{spawn_hash_password, spawn_verify_password};
use crate::auth::session::issue_session;
use crate::errors::AppError;
use crate::models::user::{normalize_email, NewUser};
use crate::state::AppState;
use crate::store::UserStore;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// POST /user/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }

    let password_hash = spawn_hash_password(req.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            name: name.to_string(),
            email,
            password_hash,
        })
        .await?;

    info!("Created user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Account created" })),
    ))
}

/// POST /user/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = normalize_email(&req.email);
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !spawn_verify_password(user.password_hash.clone(), req.password).await? {
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    let token = issue_session(&user, &state.config.jwt_secret, state.config.session_ttl_hours)?;
    Ok(Json(LoginResponse {
        message: "Logged in".to_string(),
        token,
    }))
}
