pub mod export;
pub mod handlers;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::store::{Store, UserStore};

pub const LEADERBOARD_SIZE: i64 = 100;

/// Loads the caller and rejects non-premium accounts. The flag is read from
/// the store, not the session token, so an upgrade applies immediately.
pub async fn require_premium(store: &dyn Store, user_id: Uuid) -> Result<User, AppError> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;
    if !user.is_premium {
        return Err(AppError::Forbidden(
            "This feature requires a premium membership".to_string(),
        ));
    }
    Ok(user)
}
