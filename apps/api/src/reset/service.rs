use chrono::{Duration, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::password::spawn_hash_password;
use crate::errors::AppError;
use crate::models::reset_token::ResetToken;
use crate::models::user::normalize_email;
use crate::notify::Notifier;
use crate::store::{ResetTokenStore, Store, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    Issued(Uuid),
    /// No account for the address. Nothing was written or sent.
    UnknownEmail,
}

pub fn reset_link(base_url: &str, token_id: Uuid) -> String {
    format!("{base_url}/password/resetpassword/{token_id}")
}

/// Creates a reset token for the account behind `email` and sends the link.
///
/// A notifier failure is logged and swallowed, so callers cannot tell a
/// delivery problem apart from an unknown address.
#[instrument(skip_all)]
pub async fn issue_reset(
    store: &dyn Store,
    notifier: &dyn Notifier,
    base_url: &str,
    email: &str,
) -> Result<IssueOutcome, AppError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!("Password reset requested for an unknown email");
        return Ok(IssueOutcome::UnknownEmail);
    };

    let token = ResetToken::new(user.id);
    store.insert_reset_token(&token).await?;
    info!(user_id = %user.id, "Issued password reset token");

    let link = reset_link(base_url, token.id);
    if let Err(e) = notifier.send_reset_link(&user.email, &user.name, &link).await {
        error!(user_id = %user.id, "Failed to deliver password reset link: {e}");
    }

    Ok(IssueOutcome::Issued(token.id))
}

/// Deactivates an active, unexpired token. Exactly one concurrent caller wins.
#[instrument(skip_all)]
pub async fn consume_reset(
    store: &dyn Store,
    token_id: Uuid,
    ttl: Duration,
) -> Result<ResetToken, AppError> {
    let cutoff = Utc::now() - ttl;
    if let Some(token) = store.consume_reset_token(token_id, cutoff).await? {
        info!(user_id = %token.user_id, "Reset token consumed");
        return Ok(token);
    }

    match store.find_reset_token(token_id).await? {
        None => Err(AppError::NotFound("Reset token not found".to_string())),
        Some(token) if !token.active => Err(AppError::InvalidState(
            "Reset token has already been used".to_string(),
        )),
        Some(token) if token.is_expired(ttl, Utc::now()) => {
            Err(AppError::InvalidState("Reset token has expired".to_string()))
        }
        Some(_) => Err(AppError::InvalidState(
            "Reset token could not be consumed".to_string(),
        )),
    }
}

/// Sets a new password using a token previously consumed by `consume_reset`.
/// A token yields at most one password change.
#[instrument(skip_all)]
pub async fn update_password(
    store: &dyn Store,
    token_id: Uuid,
    new_password: &str,
) -> Result<(), AppError> {
    if new_password.is_empty() {
        return Err(AppError::Validation("New password is required".to_string()));
    }

    let token = store
        .find_reset_token(token_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Reset token not found".to_string()))?;

    if token.active {
        return Err(AppError::InvalidState(
            "Reset link has not been opened".to_string(),
        ));
    }
    if !token.is_redeemable() {
        return Err(AppError::InvalidState(
            "Reset token has already been used".to_string(),
        ));
    }

    let user = store
        .find_user(token.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let password_hash = spawn_hash_password(new_password.to_string()).await?;

    if !store
        .redeem_reset_token(token_id, user.id, &password_hash)
        .await?
    {
        return Err(AppError::InvalidState(
            "Reset token has already been used".to_string(),
        ));
    }

    info!(user_id = %user.id, "Password updated through reset token");
    Ok(())
}
