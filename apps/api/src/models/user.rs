use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_premium: bool,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Row shape for the premium leaderboard.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub total_amount: i64,
}

/// Emails are matched case-insensitively; they are stored lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
