//! Configuration for the loader
//!
//! This module centralizes the tunable constants and the database settings that
//! are resolved once at process start and passed into the handler.

use derive_builder::Builder;
use std::fmt;
use std::time::Duration;

// ============================================================================
// Connection Configuration
// ============================================================================

/// Upper bound on establishing the database connection.
///
/// Kept short: a Lambda invocation that cannot reach the database should fail
/// fast and report, rather than spend its whole time budget waiting.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_PORT: u16 = 3306;

pub const DEFAULT_USERNAME: &str = "admin";

// ============================================================================
// Table Lock Configuration
// ============================================================================

/// How long an invocation waits for another invocation loading a table with the
/// same name before giving up.
pub const TABLE_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// MySQL rejects user-level lock names longer than this.
pub const MAX_LOCK_NAME_LEN: usize = 64;

/// Database connection settings
#[derive(Clone, Builder)]
pub struct DbConfig {
    #[builder(setter(into))]
    pub host: String,
    #[builder(default = "DEFAULT_PORT")]
    pub port: u16,
    #[builder(setter(into), default = "DEFAULT_USERNAME.to_string()")]
    pub username: String,
    #[builder(setter(into))]
    pub password: String,
    /// Database that receives the tables; created if missing
    #[builder(setter(into))]
    pub database: String,
    #[builder(default = "CONNECT_TIMEOUT")]
    pub connect_timeout: Duration,
    /// `None` disables the per-table advisory lock
    #[builder(default = "Some(TABLE_LOCK_TIMEOUT)")]
    pub table_lock_timeout: Option<Duration>,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("table_lock_timeout", &self.table_lock_timeout)
            .finish()
    }
}
