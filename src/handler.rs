//! High-level handler API for the S3 CSV loader.
//!
//! This module wires the pipeline stages together: decode the trigger event,
//! fetch the object, parse it, replace the table, and report the outcome.
//!
//! This is the primary API for the Lambda entry point.

use aws_config::SdkConfig;
use aws_sdk_s3::Client as S3Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::db::{DbConnection, TableDescriptor, replace_table, schema::table_name_for_key};
use crate::event;
use crate::formats::{self, DelimitedConfig};
use crate::io::S3ObjectReader;

pub use crate::config::{DbConfig, DbConfigBuilder, DbConfigBuilderError};
pub use crate::error::LoadError;
pub use crate::io::ObjectReader;

/// Response returned to the invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub status_code: u16,
    pub body: String,
}

impl LoadResponse {
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }

    pub fn failure(body: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: body.into(),
        }
    }
}

/// Result of a completed load
#[derive(Debug)]
pub struct LoadSummary {
    pub database: String,
    pub table: String,
    pub rows_inserted: u64,
}

/// Loads one CSV object per invocation into a MySQL table
pub struct Loader {
    reader: Arc<dyn ObjectReader>,
    db: DbConfig,
    // Test-only: load into this SQLite file instead of connecting to MySQL
    #[cfg(test)]
    pub(crate) test_sqlite_path: Option<std::path::PathBuf>,
}

impl Loader {
    pub fn new(reader: Arc<dyn ObjectReader>, db: DbConfig) -> Self {
        Self {
            reader,
            db,
            #[cfg(test)]
            test_sqlite_path: None,
        }
    }

    /// Create a loader that reads objects from S3 using `aws_config`
    pub fn from_aws_config(aws_config: &SdkConfig, db: DbConfig) -> Self {
        let s3_client = Arc::new(S3Client::new(aws_config));
        Self::new(Arc::new(S3ObjectReader::new(s3_client)), db)
    }

    /// Handle one trigger event
    ///
    /// Every failure is reported as a 500 response carrying the error text; this
    /// method itself never fails.
    pub async fn handle(&self, payload: Value) -> LoadResponse {
        info!("Triggered by S3 upload");

        match self.load(payload).await {
            Ok(summary) => LoadResponse::success(format!(
                "CSV data inserted into DB: {}, Table: {}",
                summary.database, summary.table
            )),
            Err(e) => {
                error!(stage = e.stage(), "Load failed: {}", e);
                LoadResponse::failure(e.to_string())
            }
        }
    }

    /// Run the pipeline for one trigger event
    pub async fn load(&self, payload: Value) -> Result<LoadSummary, LoadError> {
        let start = Instant::now();

        let object = event::decode(payload)?;
        let table_name = table_name_for_key(&object.key);
        info!(
            "File: {}, Database: {}, Table: {}",
            object.key, self.db.database, table_name
        );

        let bytes = self
            .reader
            .read_object(&object.bucket, &object.key)
            .await
            .map_err(|cause| LoadError::Fetch {
                bucket: object.bucket.clone(),
                key: object.key.clone(),
                cause,
            })?;

        let parsed = formats::parse(bytes, &DelimitedConfig::csv())?;
        info!("Header: {:?}", parsed.header);
        let table = TableDescriptor::new(table_name, parsed.header);

        let mut conn = self.connect().await.map_err(LoadError::Connect)?;
        info!("Connected to database");

        let result = replace_table(
            &mut conn,
            &self.db.database,
            &table,
            parsed.rows,
            self.db.table_lock_timeout,
        )
        .await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close connection cleanly: {}", e);
        }
        info!("Connection closed");

        let rows_inserted = result?;
        info!(
            rows = rows_inserted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Load complete"
        );

        Ok(LoadSummary {
            database: self.db.database.clone(),
            table: table.name,
            rows_inserted,
        })
    }

    async fn connect(&self) -> Result<DbConnection, sqlx::Error> {
        #[cfg(test)]
        if let Some(path) = &self.test_sqlite_path {
            return DbConnection::sqlite(path).await;
        }

        DbConnection::connect(&self.db).await
    }
}
