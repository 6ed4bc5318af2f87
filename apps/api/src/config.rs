use anyhow::{bail, Context, Result};

/// One year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
/// One week.
const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    /// Public origin used when building links that go out by email.
    pub app_base_url: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub reset_token_ttl_minutes: i64,
    pub mail: MailConfig,
    pub payment: PaymentConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    /// When unset, reset links are logged instead of emailed.
    pub api_key: Option<String>,
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub api_url: String,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub require_signature: bool,
    /// Premium price in minor currency units (paise, cents).
    pub premium_price: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub url_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port = parse_env("PORT", 8080u16)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10u32)?,
            port,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            app_base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}"))
                .trim_end_matches('/')
                .to_string(),
            jwt_secret: require_env("JWT_SECRET")?,
            session_ttl_hours: check_range(
                "SESSION_TTL_HOURS",
                parse_env("SESSION_TTL_HOURS", 24i64)?,
                MAX_SESSION_TTL_HOURS,
            )?,
            reset_token_ttl_minutes: check_range(
                "RESET_TOKEN_TTL_MINUTES",
                parse_env("RESET_TOKEN_TTL_MINUTES", 60i64)?,
                MAX_RESET_TOKEN_TTL_MINUTES,
            )?,
            mail: MailConfig {
                api_url: std::env::var("MAIL_API_URL")
                    .unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".to_string()),
                api_key: optional_env("MAIL_API_KEY"),
                sender: std::env::var("MAIL_SENDER")
                    .unwrap_or_else(|_| "noreply@expense.local".to_string()),
            },
            payment: PaymentConfig {
                api_url: std::env::var("PAYMENT_API_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
                key_id: optional_env("PAYMENT_KEY_ID"),
                key_secret: optional_env("PAYMENT_KEY_SECRET"),
                require_signature: parse_env("PAYMENT_REQUIRE_SIGNATURE", false)?,
                premium_price: parse_env("PREMIUM_PRICE", 2500i64)?,
                currency: std::env::var("CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            },
            export: ExportConfig {
                s3_bucket: optional_env("S3_BUCKET"),
                s3_endpoint: optional_env("S3_ENDPOINT"),
                s3_region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
                aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
                url_ttl_secs: parse_env("EXPORT_URL_TTL_SECS", 300u64)?,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn check_range(key: &str, value: i64, max: i64) -> Result<i64> {
    if !(1..=max).contains(&value) {
        bail!("{key} must be between 1 and {max}, got {value}");
    }
    Ok(value)
}

#[cfg(test)]
impl Config {
    /// Config with every optional integration switched off.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://unused".to_string(),
            db_max_connections: 1,
            port: 0,
            rust_log: "debug".to_string(),
            app_base_url: "http://localhost:8080".to_string(),
            jwt_secret: "test-secret".to_string(),
            session_ttl_hours: 1,
            reset_token_ttl_minutes: 60,
            mail: MailConfig {
                api_url: "http://mail.invalid".to_string(),
                api_key: None,
                sender: "noreply@expense.local".to_string(),
            },
            payment: PaymentConfig {
                api_url: "http://payments.invalid".to_string(),
                key_id: Some("key_test".to_string()),
                key_secret: Some("gateway-secret".to_string()),
                require_signature: false,
                premium_price: 2500,
                currency: "INR".to_string(),
            },
            export: ExportConfig {
                s3_bucket: None,
                s3_endpoint: None,
                s3_region: "us-east-1".to_string(),
                aws_access_key_id: None,
                aws_secret_access_key: None,
                url_ttl_secs: 300,
            },
        }
    }
}
