use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Abstraction for whole-object reads
/// This trait lets the handler fetch from S3 in production and from memory in tests
#[async_trait]
pub trait ObjectReader: Send + Sync {
    /// Read the entire object into memory
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes>;
}
