//! One-time password reset tokens.
//!
//! issue (email) → consume (open link, token goes inactive) → update (token is
//! redeemed and the credential rewritten, once).

pub mod handlers;
pub mod page;
pub mod service;
