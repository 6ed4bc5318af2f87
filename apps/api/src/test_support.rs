//! Fakes and a router harness shared by handler tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::config::Config;
use crate::errors::AppError;
use crate::notify::Notifier;
use crate::payments::{GatewayOrder, PaymentGateway};
use crate::premium::export::ExportSink;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::MemoryStore;

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub link: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_reset_link(
        &self,
        to_email: &str,
        _to_name: &str,
        link: &str,
    ) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Notification("mailbox on fire".to_string()));
        }
        self.sent.lock().await.push(SentMessage {
            to: to_email.to_string(),
            link: link.to_string(),
        });
        Ok(())
    }
}

/// Hands out sequential order ids.
#[derive(Default)]
pub struct FakeGateway {
    created: Mutex<u32>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn key_id(&self) -> Option<&str> {
        Some("key_test")
    }

    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, AppError> {
        let mut created = self.created.lock().await;
        *created += 1;
        Ok(GatewayOrder {
            id: format!("order_{}", *created),
            amount,
            currency: currency.to_string(),
        })
    }
}

/// Keeps published files in memory and returns a fake URL.
#[derive(Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub async fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().await.clone()
    }
}

#[async_trait]
impl ExportSink for MemorySink {
    async fn publish(
        &self,
        key: &str,
        contents: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        self.files.lock().await.push((key.to_string(), contents));
        Ok(format!("https://files.test/{key}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub sink: Arc<MemorySink>,
    pub config: Config,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::for_tests())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let sink = Arc::new(MemorySink::default());
        let state = AppState {
            store: store.clone(),
            notifier: notifier.clone(),
            payments: Arc::new(FakeGateway::default()),
            exports: sink.clone(),
            config: config.clone(),
        };
        Self {
            router: build_router(state),
            store,
            notifier,
            sink,
            config,
        }
    }

    /// Sends a request and returns the status and the body as JSON (HTML and
    /// other text bodies come back as a JSON string, empty bodies as null).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    pub async fn send_form(&self, uri: &str, form: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> StatusCode {
        let (status, _) = self
            .send(
                Method::POST,
                "/user/signup",
                None,
                Some(json!({ "name": name, "email": email, "password": password })),
            )
            .await;
        status
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Option<String>) {
        let (status, body) = self
            .send(
                Method::POST,
                "/user/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        (status, body["token"].as_str().map(str::to_string))
    }

    /// Signs up and logs in, returning the session token.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        assert_eq!(self.signup(name, email, password).await, StatusCode::CREATED);
        let (status, token) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK);
        token.unwrap()
    }

    /// Buys premium through the purchase endpoints and returns the gateway order id.
    pub async fn upgrade(&self, token: &str) -> String {
        let (status, body) = self
            .send(Method::GET, "/purchase/premiummembership", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let order_id = body["order"]["id"].as_str().unwrap().to_string();
        let (status, _) = self
            .send(
                Method::POST,
                "/purchase/updatetransactionstatus",
                Some(token),
                Some(json!({ "order_id": order_id, "payment_id": "pay_1" })),
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        order_id
    }
}
