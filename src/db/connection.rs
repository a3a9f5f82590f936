//! Adapter over the sqlx MySQL driver for a single-invocation connection.
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::time::Duration;

use crate::config::DbConfig;
use crate::db::schema::TableDescriptor;

/// Connection that can be either MySQL or SQLite
///
/// One connection is opened per invocation and closed with [`DbConnection::close`],
/// which consumes it, so a connection cannot be closed twice or used afterwards.
pub enum DbConnection {
    MySql(MySqlConnection),
    #[cfg(test)]
    Sqlite(sqlx::SqliteConnection),
}

impl DbConnection {
    /// Connect to the MySQL server described by `config`
    ///
    /// No database is selected at connect time; see [`DbConnection::ensure_database`].
    pub async fn connect(config: &DbConfig) -> Result<Self, sqlx::Error> {
        let connect_options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password);

        let conn = tokio::time::timeout(config.connect_timeout, connect_options.connect())
            .await
            .map_err(|_| {
                sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!(
                        "connection to {}:{} timed out after {:?}",
                        config.host, config.port, config.connect_timeout
                    ),
                ))
            })??;

        Ok(DbConnection::MySql(conn))
    }

    /// Open (creating if missing) a SQLite database file for testing
    #[cfg(test)]
    pub async fn sqlite(path: &std::path::Path) -> Result<Self, sqlx::Error> {
        let conn = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .connect()
            .await?;
        Ok(DbConnection::Sqlite(conn))
    }

    /// Create `database` if needed and make it the session default
    pub async fn ensure_database(&mut self, database: &str) -> Result<(), sqlx::Error> {
        match self {
            DbConnection::MySql(conn) => {
                for statement in TableDescriptor::database_statements(database) {
                    sqlx::raw_sql(&statement).execute(&mut *conn).await?;
                }
                Ok(())
            }
            // A SQLite file is its own (only) database
            #[cfg(test)]
            DbConnection::Sqlite(_) => Ok(()),
        }
    }

    /// Take a session-scoped advisory lock, waiting up to `timeout`
    ///
    /// Returns `false` if another session still holds the lock when the timeout
    /// expires. The lock is released when the session ends.
    pub async fn lock_table(
        &mut self,
        lock_name: &str,
        timeout: Duration,
    ) -> Result<bool, sqlx::Error> {
        match self {
            DbConnection::MySql(conn) => {
                let granted: Option<i64> = sqlx::query_scalar("SELECT GET_LOCK(?, ?)")
                    .bind(lock_name)
                    .bind(timeout.as_secs() as i64)
                    .fetch_one(&mut *conn)
                    .await?;
                Ok(granted == Some(1))
            }
            // Another session's lock is a row in `held_locks`, when that table exists
            #[cfg(test)]
            DbConnection::Sqlite(conn) => {
                let lock_tables: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM sqlite_master \
                     WHERE type = 'table' AND name = 'held_locks'",
                )
                .fetch_one(&mut *conn)
                .await?;
                if lock_tables == 0 {
                    return Ok(true);
                }

                let holders: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM held_locks WHERE name = ?")
                        .bind(lock_name)
                        .fetch_one(&mut *conn)
                        .await?;
                Ok(holders == 0)
            }
        }
    }

    /// Execute a DDL statement outside of any transaction
    pub async fn execute(&mut self, sql: &str) -> Result<(), sqlx::Error> {
        match self {
            DbConnection::MySql(conn) => {
                sqlx::raw_sql(sql).execute(&mut *conn).await?;
            }
            #[cfg(test)]
            DbConnection::Sqlite(conn) => {
                sqlx::raw_sql(sql).execute(&mut *conn).await?;
            }
        }
        Ok(())
    }

    pub async fn begin(&mut self) -> Result<DbTransaction<'_>, sqlx::Error> {
        match self {
            DbConnection::MySql(conn) => Ok(DbTransaction::MySql(conn.begin().await?)),
            #[cfg(test)]
            DbConnection::Sqlite(conn) => Ok(DbTransaction::Sqlite(conn.begin().await?)),
        }
    }

    /// Close the connection, consuming it
    pub async fn close(self) -> Result<(), sqlx::Error> {
        match self {
            DbConnection::MySql(conn) => conn.close().await,
            #[cfg(test)]
            DbConnection::Sqlite(conn) => conn.close().await,
        }
    }
}

/// An open transaction on a [`DbConnection`]
pub enum DbTransaction<'c> {
    MySql(sqlx::Transaction<'c, sqlx::MySql>),
    #[cfg(test)]
    Sqlite(sqlx::Transaction<'c, sqlx::Sqlite>),
}

impl DbTransaction<'_> {
    /// Execute a parameterized statement, binding `fields` positionally as strings
    pub async fn insert(&mut self, sql: &str, fields: &[String]) -> Result<(), sqlx::Error> {
        match self {
            DbTransaction::MySql(tx) => {
                let mut query = sqlx::query(sql);
                for field in fields {
                    query = query.bind(field.as_str());
                }
                query.execute(&mut **tx).await?;
            }
            #[cfg(test)]
            DbTransaction::Sqlite(tx) => {
                // SQLite binds surplus values silently; MySQL rejects the count mismatch
                let placeholders = sql.matches('?').count();
                if placeholders != fields.len() {
                    return Err(sqlx::Error::Protocol(format!(
                        "statement has {} parameters but {} values were bound",
                        placeholders,
                        fields.len()
                    )));
                }

                let mut query = sqlx::query(sql);
                for field in fields {
                    query = query.bind(field.as_str());
                }
                query.execute(&mut **tx).await?;
            }
        }
        Ok(())
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        match self {
            DbTransaction::MySql(tx) => tx.commit().await,
            #[cfg(test)]
            DbTransaction::Sqlite(tx) => tx.commit().await,
        }
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        match self {
            DbTransaction::MySql(tx) => tx.rollback().await,
            #[cfg(test)]
            DbTransaction::Sqlite(tx) => tx.rollback().await,
        }
    }
}
