//! Persistence seams.
//!
//! Every entity has one trait and one Postgres mapping (`PgStore`). Handlers
//! see the union as `Arc<dyn Store>` in `AppState`. Read-then-write sequences
//! that must not race (token consume/redeem, expense totals, order settlement)
//! are single trait methods so each backend can make them atomic.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::download::Download;
use crate::models::expense::{CategoryTotal, Expense, NewExpense};
use crate::models::order::Order;
use crate::models::reset_token::ResetToken;
use crate::models::user::{LeaderboardEntry, NewUser, User};

pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AppError::Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError>;
}

#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), AppError>;
    async fn find_reset_token(&self, id: Uuid) -> Result<Option<ResetToken>, AppError>;

    /// Atomically flips `active` to false if the token is active and was
    /// created after `issued_after`. Returns the updated row, or `None` when
    /// nothing matched.
    async fn consume_reset_token(
        &self,
        id: Uuid,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, AppError>;

    /// Marks a consumed token redeemed and stores the new password hash in one
    /// unit. Returns `false` when the token was not redeemable any more.
    async fn redeem_reset_token(
        &self,
        id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Inserts the expense and adds its amount to the owner's total.
    async fn add_expense(&self, expense: NewExpense) -> Result<Expense, AppError>;
    /// Newest first.
    async fn list_expenses(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Expense>, AppError>;
    async fn count_expenses(&self, user_id: Uuid) -> Result<i64, AppError>;
    async fn all_expenses(&self, user_id: Uuid) -> Result<Vec<Expense>, AppError>;
    /// Deletes the expense if `user_id` owns it and subtracts it from the total.
    async fn delete_expense(&self, user_id: Uuid, id: Uuid) -> Result<Option<Expense>, AppError>;
    async fn category_totals(&self, user_id: Uuid) -> Result<Vec<CategoryTotal>, AppError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<(), AppError>;
    /// Marks the order paid and the owner premium. `None` if the user has no
    /// such order.
    async fn complete_order(
        &self,
        user_id: Uuid,
        order_id: &str,
        payment_id: &str,
    ) -> Result<Option<Order>, AppError>;
    /// Marks the order failed unless it already succeeded. Returns the order
    /// as stored afterwards.
    async fn fail_order(&self, user_id: Uuid, order_id: &str) -> Result<Option<Order>, AppError>;
}

#[async_trait]
pub trait DownloadStore: Send + Sync {
    async fn record_download(&self, user_id: Uuid, url: &str) -> Result<Download, AppError>;
    async fn list_downloads(&self, user_id: Uuid) -> Result<Vec<Download>, AppError>;
}

pub trait Store: UserStore + ResetTokenStore + ExpenseStore + OrderStore + DownloadStore {}

impl<T> Store for T where T: UserStore + ResetTokenStore + ExpenseStore + OrderStore + DownloadStore {}
