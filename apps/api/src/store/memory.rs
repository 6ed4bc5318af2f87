//! In-memory store used by handler tests. One mutex guards everything, so each
//! trait method is atomic the same way the SQL statements are.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::download::Download;
use crate::models::expense::{CategoryTotal, Expense, NewExpense};
use crate::models::order::{Order, OrderStatus};
use crate::models::reset_token::ResetToken;
use crate::models::user::{LeaderboardEntry, NewUser, User};
use crate::store::{DownloadStore, ExpenseStore, OrderStore, ResetTokenStore, UserStore};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    tokens: HashMap<Uuid, ResetToken>,
    expenses: Vec<Expense>,
    orders: Vec<Order>,
    downloads: Vec<Download>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reset_tokens_for(&self, user_id: Uuid) -> Vec<ResetToken> {
        let inner = self.inner.lock().await;
        inner
            .tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn reset_token_count(&self) -> usize {
        self.inner.lock().await.tokens.len()
    }

    /// Back-dates a token so expiry can be exercised without sleeping.
    pub async fn age_reset_token(&self, id: Uuid, by: chrono::Duration) {
        if let Some(token) = self.inner.lock().await.tokens.get_mut(&id) {
            token.created_at -= by;
        }
    }

    pub async fn orders_for(&self, user_id: Uuid) -> Vec<Order> {
        let inner = self.inner.lock().await;
        inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "An account for {} already exists",
                user.email
            )));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            is_premium: false,
            total_amount: 0,
            created_at: Utc::now(),
        };
        inner.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<LeaderboardEntry> = inner
            .users
            .values()
            .map(|u| LeaderboardEntry {
                name: u.name.clone(),
                total_amount: u.total_amount,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| a.name.cmp(&b.name))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[async_trait]
impl ResetTokenStore for MemoryStore {
    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .tokens
            .insert(token.id, token.clone());
        Ok(())
    }

    async fn find_reset_token(&self, id: Uuid) -> Result<Option<ResetToken>, AppError> {
        Ok(self.inner.lock().await.tokens.get(&id).cloned())
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, AppError> {
        let mut inner = self.inner.lock().await;
        match inner.tokens.get_mut(&id) {
            Some(token) if token.active && token.created_at > issued_after => {
                token.active = false;
                Ok(Some(token.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn redeem_reset_token(
        &self,
        id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        let redeemable = inner
            .tokens
            .get(&id)
            .map(|t| t.user_id == user_id && t.is_redeemable())
            .unwrap_or(false);
        if !redeemable {
            return Ok(false);
        }
        let Some(user) = inner.users.get_mut(&user_id) else {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        };
        user.password_hash = password_hash.to_string();
        if let Some(token) = inner.tokens.get_mut(&id) {
            token.redeemed_at = Some(Utc::now());
        }
        Ok(true)
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn add_expense(&self, expense: NewExpense) -> Result<Expense, AppError> {
        let mut inner = self.inner.lock().await;
        let created = Expense {
            id: Uuid::new_v4(),
            user_id: expense.user_id,
            amount: expense.amount,
            description: expense.description,
            category: expense.category,
            spent_on: expense.spent_on,
            created_at: Utc::now(),
        };
        if let Some(user) = inner.users.get_mut(&expense.user_id) {
            user.total_amount += expense.amount;
        }
        inner.expenses.push(created.clone());
        Ok(created)
    }

    async fn list_expenses(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Expense>, AppError> {
        let all = self.all_expenses(user_id).await?;
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_expenses(&self, user_id: Uuid) -> Result<i64, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.expenses.iter().filter(|e| e.user_id == user_id).count() as i64)
    }

    async fn all_expenses(&self, user_id: Uuid) -> Result<Vec<Expense>, AppError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Expense> = inner
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.spent_on
                .cmp(&a.spent_on)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    async fn delete_expense(&self, user_id: Uuid, id: Uuid) -> Result<Option<Expense>, AppError> {
        let mut inner = self.inner.lock().await;
        let Some(pos) = inner
            .expenses
            .iter()
            .position(|e| e.id == id && e.user_id == user_id)
        else {
            return Ok(None);
        };
        let removed = inner.expenses.remove(pos);
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.total_amount -= removed.amount;
        }
        Ok(Some(removed))
    }

    async fn category_totals(&self, user_id: Uuid) -> Result<Vec<CategoryTotal>, AppError> {
        let inner = self.inner.lock().await;
        let mut totals: HashMap<String, i64> = HashMap::new();
        for expense in inner.expenses.iter().filter(|e| e.user_id == user_id) {
            *totals.entry(expense.category.clone()).or_insert(0) += expense.amount;
        }
        let mut rows: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
        Ok(rows)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        self.inner.lock().await.orders.push(order.clone());
        Ok(())
    }

    async fn complete_order(
        &self,
        user_id: Uuid,
        order_id: &str,
        payment_id: &str,
    ) -> Result<Option<Order>, AppError> {
        let mut inner = self.inner.lock().await;
        let Some(order) = inner
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id && o.user_id == user_id)
        else {
            return Ok(None);
        };
        order.status = OrderStatus::Success.as_str().to_string();
        if order.payment_id.is_none() {
            order.payment_id = Some(payment_id.to_string());
        }
        let updated = order.clone();
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.is_premium = true;
        }
        Ok(Some(updated))
    }

    async fn fail_order(&self, user_id: Uuid, order_id: &str) -> Result<Option<Order>, AppError> {
        let mut inner = self.inner.lock().await;
        let order = inner
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id && o.user_id == user_id);
        Ok(order.map(|o| {
            if !o.is_paid() {
                o.status = OrderStatus::Failed.as_str().to_string();
            }
            o.clone()
        }))
    }
}

#[async_trait]
impl DownloadStore for MemoryStore {
    async fn record_download(&self, user_id: Uuid, url: &str) -> Result<Download, AppError> {
        let download = Download {
            id: Uuid::new_v4(),
            user_id,
            url: url.to_string(),
            created_at: Utc::now(),
        };
        self.inner.lock().await.downloads.push(download.clone());
        Ok(download)
    }

    async fn list_downloads(&self, user_id: Uuid) -> Result<Vec<Download>, AppError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Download> = inner
            .downloads
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
