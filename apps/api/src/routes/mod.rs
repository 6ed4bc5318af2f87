pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::expenses::handlers as expenses;
use crate::payments::handlers as payments;
use crate::premium::handlers as premium;
use crate::reset::handlers as reset;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/user/signup", post(auth::handle_signup))
        .route("/user/login", post(auth::handle_login))
        // Password reset (legacy paths kept as aliases)
        .route(
            "/password/forgotpassword",
            post(reset::handle_forgot_password),
        )
        .route(
            "/password/forgetpassword",
            post(reset::handle_forgot_password),
        )
        .route(
            "/password/resetpassword/:id",
            get(reset::handle_reset_link),
        )
        .route("/resetpassword/:id", get(reset::handle_reset_link))
        .route(
            "/password/updatepassword/:id",
            post(reset::handle_update_password),
        )
        // Expenses
        .route(
            "/expense",
            post(expenses::handle_add_expense).get(expenses::handle_list_expenses),
        )
        .route("/expense/breakdown", get(expenses::handle_breakdown))
        .route("/expense/:id", delete(expenses::handle_delete_expense))
        // Premium purchase
        .route(
            "/purchase/premiummembership",
            get(payments::handle_buy_premium),
        )
        .route("/buypremium", get(payments::handle_buy_premium))
        .route(
            "/purchase/updatetransactionstatus",
            post(payments::handle_transaction_success),
        )
        .route(
            "/updatetransaction",
            post(payments::handle_transaction_success),
        )
        .route(
            "/purchase/updatefailure",
            post(payments::handle_transaction_failure),
        )
        .route("/updatefailure", post(payments::handle_transaction_failure))
        // Premium features
        .route("/premium/leaderboard", get(premium::handle_leaderboard))
        .route("/user/download", get(premium::handle_download))
        .route("/user/downloads", get(premium::handle_download_history))
        .with_state(state)
}
