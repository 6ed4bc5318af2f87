use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Minor currency units.
    pub amount: i64,
    pub description: String,
    pub category: String,
    pub spent_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub category: String,
    pub spent_on: NaiveDate,
}

/// Sum of a user's expenses in one category.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: i64,
}
