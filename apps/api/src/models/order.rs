use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Success,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Success => "success",
            OrderStatus::Failed => "failed",
        }
    }
}

/// A premium purchase. `order_id` is the identifier assigned by the gateway.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub status: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn pending(user_id: Uuid, order_id: String, amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            order_id,
            payment_id: None,
            status: OrderStatus::Pending.as_str().to_string(),
            amount,
            created_at: Utc::now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Success.as_str()
    }
}
