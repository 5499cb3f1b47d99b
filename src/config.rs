//! Component factory for environment-based configuration
//!
//! Every sink client is built here once at process start and injected into
//! the pipelines. Request handling never reads the environment.

use crate::ingester::DEFAULT_REGION;
use crate::timeseries::{
    HttpTimeSeriesStore, InMemoryTimeSeriesStore, TableCoordinates, TimeSeriesStore,
};
use crate::{Error, Result};

use object_store::{aws::AmazonS3Builder, memory::InMemory, ObjectStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Default HTTP timeout for the time-series store gateway
pub const DEFAULT_TIMESERIES_TIMEOUT_SECS: u64 = 30;

pub struct ComponentFactory;

impl ComponentFactory {
    /// Store coordinates from `TIMESERIES_DATABASE` and `TIMESERIES_TABLE`.
    ///
    /// Both are required.
    pub fn table_coordinates_from_env() -> Result<TableCoordinates> {
        Self::table_coordinates_from(&|name| std::env::var(name).ok())
    }

    /// Value of the `region` dimension, from `AWS_REGION`.
    pub fn region_from_env() -> String {
        non_empty(std::env::var("AWS_REGION").ok()).unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Create the time-series store client from environment
    ///
    /// Environment variables:
    /// - TIMESERIES_BACKEND: "memory" (default) or "http"
    /// - TIMESERIES_ENDPOINT: gateway base URL (required for http)
    /// - TIMESERIES_TIMEOUT_SECS: request timeout (default: 30)
    pub fn create_timeseries_store() -> Result<Arc<dyn TimeSeriesStore>> {
        let backend =
            std::env::var("TIMESERIES_BACKEND").unwrap_or_else(|_| "memory".to_string());

        match backend.as_str() {
            "memory" => {
                info!("Using in-memory time-series store (development mode)");
                Ok(Arc::new(InMemoryTimeSeriesStore::new()))
            }
            "http" => {
                let endpoint = non_empty(std::env::var("TIMESERIES_ENDPOINT").ok()).ok_or_else(
                    || {
                        Error::Config(
                            "TIMESERIES_ENDPOINT required when TIMESERIES_BACKEND=http"
                                .to_string(),
                        )
                    },
                )?;
                let timeout = match std::env::var("TIMESERIES_TIMEOUT_SECS") {
                    Ok(raw) => raw.trim().parse::<u64>().map_err(|e| {
                        Error::Config(format!("TIMESERIES_TIMEOUT_SECS must be an integer: {e}"))
                    })?,
                    Err(_) => DEFAULT_TIMESERIES_TIMEOUT_SECS,
                };

                info!(endpoint = %endpoint, timeout_secs = timeout, "Using HTTP time-series store");
                Ok(Arc::new(HttpTimeSeriesStore::new(
                    endpoint,
                    Duration::from_secs(timeout),
                )?))
            }
            _ => Err(Error::Config(format!(
                "Unknown TIMESERIES_BACKEND: {}. Use 'memory' or 'http'",
                backend
            ))),
        }
    }

    /// Create the raw event archive store from environment
    ///
    /// Environment variables:
    /// - STORAGE_BACKEND: "memory" (default) or "s3"
    /// - S3_BUCKET: S3 bucket name (required for s3)
    /// - S3_REGION: S3 region (default: us-east-1)
    /// - S3_ENDPOINT: Custom S3 endpoint (optional, for MinIO)
    /// - KMS_KEY_ID: key for SSE-KMS writes (optional, bucket default key otherwise)
    /// - AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY: optional, IAM role otherwise
    pub fn create_archive_store() -> Result<Arc<dyn ObjectStore>> {
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "memory".to_string());

        match backend.as_str() {
            "memory" => {
                info!("Using in-memory archive store (development mode)");
                Ok(Arc::new(InMemory::new()))
            }
            "s3" => {
                let bucket = std::env::var("S3_BUCKET").map_err(|_| {
                    Error::Config("S3_BUCKET required when STORAGE_BACKEND=s3".to_string())
                })?;
                let region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());

                info!(bucket = %bucket, region = %region, "Using S3 archive store");

                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&bucket)
                    .with_region(&region);

                if let Ok(endpoint) = std::env::var("S3_ENDPOINT") {
                    info!(endpoint = %endpoint, "Using custom S3 endpoint");
                    builder = builder.with_endpoint(&endpoint).with_allow_http(true);
                }

                if let Some(key_id) = non_empty(std::env::var("KMS_KEY_ID").ok()) {
                    info!(kms_key_id = %key_id, "Archive writes use SSE-KMS");
                    builder = builder.with_sse_kms_encryption(key_id);
                }

                if let Ok(key) = std::env::var("AWS_ACCESS_KEY_ID") {
                    builder = builder.with_access_key_id(&key);
                }
                if let Ok(secret) = std::env::var("AWS_SECRET_ACCESS_KEY") {
                    builder = builder.with_secret_access_key(&secret);
                }

                Ok(Arc::new(builder.build()?))
            }
            _ => Err(Error::Config(format!(
                "Unknown STORAGE_BACKEND: {}. Use 'memory' or 's3'",
                backend
            ))),
        }
    }

    fn table_coordinates_from(lookup: &dyn Fn(&str) -> Option<String>) -> Result<TableCoordinates> {
        let required = |name: &str| {
            non_empty(lookup(name))
                .ok_or_else(|| Error::Config(format!("{name} environment variable is required")))
        };
        Ok(TableCoordinates::new(
            required("TIMESERIES_DATABASE")?,
            required("TIMESERIES_TABLE")?,
        ))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_table_coordinates_required() {
        let err = ComponentFactory::table_coordinates_from(&lookup(&[(
            "TIMESERIES_DATABASE",
            "iot",
        )]))
        .unwrap_err();
        assert!(
            err.to_string().contains("TIMESERIES_TABLE"),
            "missing table should be named: {err}"
        );
    }

    #[test]
    fn test_table_coordinates_blank_is_missing() {
        let result = ComponentFactory::table_coordinates_from(&lookup(&[
            ("TIMESERIES_DATABASE", "  "),
            ("TIMESERIES_TABLE", "readings"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_table_coordinates_from_vars() {
        let coords = ComponentFactory::table_coordinates_from(&lookup(&[
            ("TIMESERIES_DATABASE", "iot"),
            ("TIMESERIES_TABLE", "readings"),
        ]))
        .unwrap();
        assert_eq!(coords, TableCoordinates::new("iot", "readings"));
    }
}
