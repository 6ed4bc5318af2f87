use axum::{
    async_trait,
    extract::{FromRequest, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::Html,
    Form, Json,
};
use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::reset::page::reset_form;
use crate::reset::service::{consume_reset, issue_reset, update_password};
use crate::state::AppState;

const INVALID_LINK: &str = "Invalid or expired password reset request";

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct NewPasswordBody {
    #[serde(alias = "new_password")]
    pub newpassword: String,
}

/// Accepts the new password as JSON or as the urlencoded body the reset form posts.
pub struct NewPassword(pub String);

#[async_trait]
impl<S> FromRequest<S> for NewPassword
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);

        let body = if is_json {
            Json::<NewPasswordBody>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?
                .0
        } else {
            Form::<NewPasswordBody>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?
                .0
        };
        Ok(NewPassword(body.newpassword))
    }
}

/// POST /password/forgotpassword
///
/// Always 201 for a well-formed request, whether or not the email is known.
pub async fn handle_forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    issue_reset(
        state.store.as_ref(),
        state.notifier.as_ref(),
        &state.config.app_base_url,
        &req.email,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "If an account exists for that email, a reset link has been sent"
        })),
    ))
}

/// GET /password/resetpassword/:id
pub async fn handle_reset_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let token_id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound(INVALID_LINK.to_string()))?;
    let ttl = Duration::minutes(state.config.reset_token_ttl_minutes);

    match consume_reset(state.store.as_ref(), token_id, ttl).await {
        Ok(token) => Ok(Html(reset_form(token.id))),
        Err(AppError::NotFound(_)) | Err(AppError::InvalidState(_)) => {
            Err(AppError::NotFound(INVALID_LINK.to_string()))
        }
        Err(e) => Err(e),
    }
}

/// POST /password/updatepassword/:id
pub async fn handle_update_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    NewPassword(new_password): NewPassword,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token_id =
        Uuid::parse_str(&id).map_err(|_| AppError::NotFound("Reset token not found".to_string()))?;

    update_password(state.store.as_ref(), token_id, &new_password).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Successfully updated the new password" })),
    ))
}
