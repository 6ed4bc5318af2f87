use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One-time password reset token.
///
/// Lifecycle: issued `active`, flipped to inactive exactly once when the reset
/// link is opened, then redeemed exactly once when the new password is saved.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl ResetToken {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            active: true,
            created_at: Utc::now(),
            redeemed_at: None,
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.created_at + ttl <= now
    }

    /// Consumed through the reset link and not yet used to set a password.
    pub fn is_redeemable(&self) -> bool {
        !self.active && self.redeemed_at.is_none()
    }
}
