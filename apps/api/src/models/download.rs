use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A previously exported expense file.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Download {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
