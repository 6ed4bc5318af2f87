use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::download::Download;
use crate::models::expense::{CategoryTotal, Expense, NewExpense};
use crate::models::order::{Order, OrderStatus};
use crate::models::reset_token::ResetToken;
use crate::models::user::{LeaderboardEntry, NewUser, User};
use crate::store::{DownloadStore, ExpenseStore, OrderStore, ResetTokenStore, UserStore};

/// PostgreSQL-backed store. Owns a handle to the shared pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Users
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict(format!("An account for {} already exists", user.email)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        Ok(sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT name, total_amount FROM users ORDER BY total_amount DESC, name ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reset tokens
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ResetTokenStore for PgStore {
    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO reset_tokens (id, user_id, active, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(token.active)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_reset_token(&self, id: Uuid) -> Result<Option<ResetToken>, AppError> {
        Ok(
            sqlx::query_as::<_, ResetToken>("SELECT * FROM reset_tokens WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, AppError> {
        // Single conditional UPDATE: concurrent callers serialize on the row
        // lock and only the first one sees `active = true`.
        Ok(sqlx::query_as::<_, ResetToken>(
            r#"
            UPDATE reset_tokens
            SET active = FALSE
            WHERE id = $1 AND active AND created_at > $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(issued_after)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn redeem_reset_token(
        &self,
        id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let redeemed = sqlx::query(
            r#"
            UPDATE reset_tokens
            SET redeemed_at = now()
            WHERE id = $1 AND user_id = $2 AND NOT active AND redeemed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if redeemed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let updated = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }

        tx.commit().await?;
        info!(user_id = %user_id, "Redeemed reset token");
        Ok(true)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Expenses
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ExpenseStore for PgStore {
    async fn add_expense(&self, expense: NewExpense) -> Result<Expense, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (id, user_id, amount, description, category, spent_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(expense.user_id)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(expense.spent_on)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET total_amount = total_amount + $1 WHERE id = $2")
            .bind(expense.amount)
            .bind(expense.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn list_expenses(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Expense>, AppError> {
        Ok(sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE user_id = $1
            ORDER BY spent_on DESC, created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count_expenses(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM expenses WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn all_expenses(&self, user_id: Uuid) -> Result<Vec<Expense>, AppError> {
        Ok(sqlx::query_as::<_, Expense>(
            "SELECT * FROM expenses WHERE user_id = $1 ORDER BY spent_on DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_expense(&self, user_id: Uuid, id: Uuid) -> Result<Option<Expense>, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, Expense>(
            "DELETE FROM expenses WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(deleted) = deleted else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE users SET total_amount = total_amount - $1 WHERE id = $2")
            .bind(deleted.amount)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(deleted))
    }

    async fn category_totals(&self, user_id: Uuid) -> Result<Vec<CategoryTotal>, AppError> {
        Ok(sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT category, SUM(amount)::BIGINT AS total
            FROM expenses
            WHERE user_id = $1
            GROUP BY category
            ORDER BY total DESC, category ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orders
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, order_id, payment_id, status, amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.order_id)
        .bind(&order.payment_id)
        .bind(&order.status)
        .bind(order.amount)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete_order(
        &self,
        user_id: Uuid,
        order_id: &str,
        payment_id: &str,
    ) -> Result<Option<Order>, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1, payment_id = COALESCE(payment_id, $2)
            WHERE order_id = $3 AND user_id = $4
            RETURNING *
            "#,
        )
        .bind(OrderStatus::Success.as_str())
        .bind(payment_id)
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = order else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE users SET is_premium = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(order))
    }

    async fn fail_order(&self, user_id: Uuid, order_id: &str) -> Result<Option<Order>, AppError> {
        let failed = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1
            WHERE order_id = $2 AND user_id = $3 AND status <> $4
            RETURNING *
            "#,
        )
        .bind(OrderStatus::Failed.as_str())
        .bind(order_id)
        .bind(user_id)
        .bind(OrderStatus::Success.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if failed.is_some() {
            return Ok(failed);
        }

        Ok(
            sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1 AND user_id = $2")
                .bind(order_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Downloads
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl DownloadStore for PgStore {
    async fn record_download(&self, user_id: Uuid, url: &str) -> Result<Download, AppError> {
        Ok(sqlx::query_as::<_, Download>(
            "INSERT INTO downloads (id, user_id, url) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(url)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_downloads(&self, user_id: Uuid) -> Result<Vec<Download>, AppError> {
        Ok(sqlx::query_as::<_, Download>(
            "SELECT * FROM downloads WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
