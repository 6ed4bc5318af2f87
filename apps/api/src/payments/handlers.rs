use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::session::{issue_session, AuthUser};
use crate::errors::AppError;
use crate::models::order::Order;
use crate::payments::{verify_payment_signature, GatewayOrder};
use crate::state::AppState;
use crate::store::{OrderStore, UserStore};

#[derive(Serialize)]
pub struct PurchaseResponse {
    pub order: GatewayOrder,
    pub key_id: Option<String>,
}

#[derive(Deserialize)]
pub struct TransactionSuccess {
    pub order_id: String,
    pub payment_id: String,
    pub signature: Option<String>,
}

#[derive(Deserialize)]
pub struct TransactionFailure {
    pub order_id: String,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub message: String,
    pub token: String,
}

#[derive(Serialize)]
pub struct FailureResponse {
    pub message: String,
    pub status: String,
}

/// GET /purchase/premiummembership
pub async fn handle_buy_premium(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    let user = state
        .store
        .find_user(auth.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;
    if user.is_premium {
        return Err(AppError::Conflict("Already a premium member".to_string()));
    }

    let payment = &state.config.payment;
    let receipt = format!("premium_{}", user.id.simple());
    let order = state
        .payments
        .create_order(payment.premium_price, &payment.currency, &receipt)
        .await?;

    state
        .store
        .insert_order(&Order::pending(user.id, order.id.clone(), order.amount))
        .await?;
    info!(order_id = %order.id, user_id = %user.id, "Premium order created");

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            order,
            key_id: state.payments.key_id().map(str::to_string),
        }),
    ))
}

/// POST /purchase/updatetransactionstatus
///
/// Replaying the same callback re-applies the same state and is harmless.
pub async fn handle_transaction_success(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<TransactionSuccess>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    if req.order_id.trim().is_empty() || req.payment_id.trim().is_empty() {
        return Err(AppError::Validation(
            "order_id and payment_id are required".to_string(),
        ));
    }

    let payment = &state.config.payment;
    match (&req.signature, &payment.key_secret) {
        (Some(signature), Some(secret)) => {
            if !verify_payment_signature(secret, &req.order_id, &req.payment_id, signature) {
                return Err(AppError::Validation("Invalid payment signature".to_string()));
            }
        }
        (Some(_), None) => {
            return Err(AppError::Payment(
                "cannot verify signature without PAYMENT_KEY_SECRET".to_string(),
            ));
        }
        (None, _) if payment.require_signature => {
            return Err(AppError::Validation("Payment signature is required".to_string()));
        }
        (None, _) => {}
    }

    state
        .store
        .complete_order(auth.id, &req.order_id, &req.payment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", req.order_id)))?;

    let user = state
        .store
        .find_user(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    info!(order_id = %req.order_id, user_id = %user.id, "Premium purchase settled");

    let token = issue_session(&user, &state.config.jwt_secret, state.config.session_ttl_hours)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(TransactionResponse {
            message: "Transaction successful".to_string(),
            token,
        }),
    ))
}

/// POST /purchase/updatefailure
pub async fn handle_transaction_failure(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<TransactionFailure>,
) -> Result<Json<FailureResponse>, AppError> {
    let order = state
        .store
        .fail_order(auth.id, &req.order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", req.order_id)))?;

    if order.is_paid() {
        info!(order_id = %order.order_id, "Ignoring failure callback for a paid order");
    } else {
        info!(order_id = %order.order_id, "Payment failure recorded");
    }
    Ok(Json(FailureResponse {
        message: "Transaction failure recorded".to_string(),
        status: order.status,
    }))
}
