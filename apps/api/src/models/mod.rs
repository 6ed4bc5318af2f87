pub mod download;
pub mod expense;
pub mod order;
pub mod reset_token;
pub mod user;
