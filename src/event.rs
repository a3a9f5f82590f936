//! Decoding of S3 object-created notifications

use serde::Deserialize;
use serde_json::Value;

use crate::error::LoadError;

/// The object an invocation is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

// Only the fields the loader reads; everything else in the notification is ignored.

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: Option<String>,
}

/// Extract the bucket and key of the first record in a notification
///
/// Notifications can carry several records; only the first one is loaded.
pub fn decode(payload: Value) -> Result<ObjectLocation, LoadError> {
    let notification: Notification =
        serde_json::from_value(payload).map_err(|e| LoadError::Event(e.to_string()))?;

    let record = notification
        .records
        .into_iter()
        .next()
        .ok_or_else(|| LoadError::Event("notification has no records".to_string()))?;

    let bucket = record
        .s3
        .bucket
        .name
        .ok_or_else(|| LoadError::Event("first record has no bucket name".to_string()))?;
    let key = record
        .s3
        .object
        .key
        .ok_or_else(|| LoadError::Event("first record has no object key".to_string()))?;

    Ok(ObjectLocation { bucket, key })
}
