//! Expense history export. Files are rendered to CSV and handed to an
//! `ExportSink`, which returns a URL the owner can download from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ExportConfig;
use crate::errors::AppError;
use crate::models::expense::Expense;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn publish(
        &self,
        key: &str,
        contents: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;
}

pub fn export_key(user_id: Uuid, at: DateTime<Utc>) -> String {
    format!("expenses/{}/{}.csv", user_id, at.format("%Y%m%dT%H%M%SZ"))
}

/// Renders expenses as CSV with a header row. Amounts stay in minor units.
pub fn render_csv(expenses: &[Expense]) -> String {
    let mut csv = String::from("date,category,description,amount\n");
    for expense in expenses {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            expense.spent_on,
            csv_field(&expense.category),
            csv_field(&expense.description),
            expense.amount
        ));
    }
    csv
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Builds the S3 sink when a bucket is configured.
pub async fn from_config(config: &ExportConfig) -> Arc<dyn ExportSink> {
    let Some(bucket) = config.s3_bucket.clone() else {
        warn!("S3_BUCKET not set; expense downloads are disabled");
        return Arc::new(UnconfiguredSink);
    };

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()));
    if let (Some(key_id), Some(secret)) = (&config.aws_access_key_id, &config.aws_secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            key_id,
            secret,
            None,
            None,
            "expense-api-static",
        ));
    }
    if let Some(endpoint) = &config.s3_endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;

    // Path-style addressing for MinIO and other S3-compatible endpoints.
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(config.s3_endpoint.is_some())
        .build();

    info!("S3 export sink initialized (bucket: {bucket})");
    Arc::new(S3ExportSink {
        client: aws_sdk_s3::Client::from_conf(s3_config),
        bucket,
        url_ttl: Duration::from_secs(config.url_ttl_secs),
    })
}

pub struct S3ExportSink {
    client: aws_sdk_s3::Client,
    bucket: String,
    url_ttl: Duration,
}

#[async_trait]
impl ExportSink for S3ExportSink {
    async fn publish(
        &self,
        key: &str,
        contents: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(contents))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded export to s3://{}/{}", self.bucket, key);

        let presigning = PresigningConfig::expires_in(self.url_ttl)
            .map_err(|e| AppError::Storage(format!("Invalid presign duration: {e}")))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::Storage(format!("Presigning failed: {e}")))?;

        Ok(presigned.uri().to_string())
    }
}

pub struct UnconfiguredSink;

#[async_trait]
impl ExportSink for UnconfiguredSink {
    async fn publish(
        &self,
        _key: &str,
        _contents: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        Err(AppError::Storage("export storage is not configured".to_string()))
    }
}
