use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use std::sync::Arc;

use super::object_reader::ObjectReader;

/// ObjectReader implementation for S3 objects
#[derive(Clone)]
pub struct S3ObjectReader {
    s3_client: Arc<S3Client>,
}

impl S3ObjectReader {
    pub fn new(s3_client: Arc<S3Client>) -> Self {
        Self { s3_client }
    }
}

#[async_trait]
impl ObjectReader for S3ObjectReader {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let response = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context("Failed to get S3 object")?;

        let bytes = response
            .body
            .collect()
            .await
            .context("Failed to collect S3 response body")?
            .into_bytes();

        Ok(bytes)
    }
}
