use std::sync::Arc;

use crate::config::Config;
use crate::notify::Notifier;
use crate::payments::PaymentGateway;
use crate::premium::export::ExportSink;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Delivers password reset links. Logs them when no mail API is configured.
    pub notifier: Arc<dyn Notifier>,
    pub payments: Arc<dyn PaymentGateway>,
    /// Destination for exported expense files.
    pub exports: Arc<dyn ExportSink>,
    pub config: Config,
}
