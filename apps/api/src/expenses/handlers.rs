use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::session::AuthUser;
use crate::errors::AppError;
use crate::expenses::breakdown::{to_slices, ChartSlice};
use crate::expenses::{PageMeta, PageRequest};
use crate::models::expense::{Expense, NewExpense};
use crate::state::AppState;
use crate::store::ExpenseStore;

#[derive(Deserialize)]
pub struct AddExpenseRequest {
    pub amount: i64,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ExpensePage {
    pub expenses: Vec<Expense>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// POST /expense
pub async fn handle_add_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    if req.amount <= 0 {
        return Err(AppError::Validation("Amount must be positive".to_string()));
    }
    let category = req.category.trim();
    if category.is_empty() {
        return Err(AppError::Validation("Category is required".to_string()));
    }

    let expense = state
        .store
        .add_expense(NewExpense {
            user_id: auth.id,
            amount: req.amount,
            description: req.description.trim().to_string(),
            category: category.to_string(),
            spent_on: req.date.unwrap_or_else(|| Utc::now().date_naive()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /expense?page=&limit=
pub async fn handle_list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ExpensePage>, AppError> {
    let request = PageRequest::new(query.page, query.limit);
    let total = state.store.count_expenses(auth.id).await?;
    let expenses = state
        .store
        .list_expenses(auth.id, request.offset(), request.limit)
        .await?;

    Ok(Json(ExpensePage {
        expenses,
        meta: PageMeta::new(request, total),
    }))
}

/// DELETE /expense/:id
pub async fn handle_delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .delete_expense(auth.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Expense {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /expense/breakdown
pub async fn handle_breakdown(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ChartSlice>>, AppError> {
    let totals = state.store.category_totals(auth.id).await?;
    Ok(Json(to_slices(&totals)))
}
