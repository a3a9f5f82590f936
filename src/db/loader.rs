use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::MAX_LOCK_NAME_LEN;
use crate::db::connection::{DbConnection, DbTransaction};
use crate::db::schema::TableDescriptor;
use crate::error::LoadError;
use crate::formats::DataRows;

/// Replace `table` in `database` with the given rows
///
/// Runs, in order:
/// 1. CREATE DATABASE IF NOT EXISTS / USE
/// 2. Take the per-table advisory lock (when `lock_timeout` is set)
/// 3. DROP TABLE IF EXISTS / CREATE TABLE
/// 4. One INSERT per row inside a single transaction
///
/// The DDL is not transactional. Rows are bound as-is, so a row whose field
/// count differs from the columns is rejected by the database. If any row
/// fails, the transaction is rolled back, the remaining rows are never read,
/// and the table is left empty.
/// Returns the number of rows inserted.
pub async fn replace_table(
    conn: &mut DbConnection,
    database: &str,
    table: &TableDescriptor,
    rows: DataRows,
    lock_timeout: Option<Duration>,
) -> Result<u64, LoadError> {
    conn.ensure_database(database)
        .await
        .map_err(LoadError::Execute)?;

    if let Some(timeout) = lock_timeout {
        let lock_name = lock_name(database, &table.name);
        debug!(lock_name = %lock_name, ?timeout, "Waiting for table lock");
        let granted = conn
            .lock_table(&lock_name, timeout)
            .await
            .map_err(LoadError::Execute)?;
        if !granted {
            return Err(LoadError::LockTimeout {
                table: table.name.clone(),
            });
        }
    }

    // DDL commits implicitly on MySQL, so a failure here has nothing to roll back
    for statement in table.replace_statements() {
        conn.execute(&statement).await.map_err(LoadError::Execute)?;
    }
    info!("Table `{}` created with columns: {:?}", table.name, table.columns);

    let mut tx = conn.begin().await.map_err(LoadError::Execute)?;
    match insert_rows(&mut tx, table, rows).await {
        Ok(inserted) => {
            tx.commit().await.map_err(LoadError::Execute)?;
            info!(rows = inserted, "Data inserted successfully");
            Ok(inserted)
        }
        Err(e) => {
            warn!("Insert failed, rolling back: {}", e);
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Insert rows until the cursor is exhausted or a row fails
async fn insert_rows(
    tx: &mut DbTransaction<'_>,
    table: &TableDescriptor,
    rows: DataRows,
) -> Result<u64, LoadError> {
    let insert_sql = table.insert_statement();
    let mut inserted = 0u64;

    for row in rows {
        let record = row?;
        tx.insert(&insert_sql, &record.fields)
            .await
            .map_err(|e| {
                warn!(line = record.line, "Row rejected by the database");
                LoadError::Execute(e)
            })?;
        inserted += 1;
    }

    Ok(inserted)
}

/// Name of the advisory lock guarding `database`.`table`, cut to the server's limit
fn lock_name(database: &str, table: &str) -> String {
    let full = format!("{}.{}", database, table);
    match full.char_indices().nth(MAX_LOCK_NAME_LEN) {
        Some((cut, _)) => full[..cut].to_string(),
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{DelimitedConfig, parse};
    use bytes::Bytes;
    use std::path::Path;
    use tempfile::TempDir;

    fn table_for(name: &str, content: &str) -> (TableDescriptor, DataRows) {
        let parsed = parse(Bytes::from(content.to_string()), &DelimitedConfig::csv()).unwrap();
        (TableDescriptor::new(name, parsed.header), parsed.rows)
    }

    async fn fetch_rows(path: &Path, sql: &str) -> Vec<(String, String)> {
        let DbConnection::Sqlite(mut conn) = DbConnection::sqlite(path).await.unwrap() else {
            panic!("expected SQLite connection");
        };
        let rows = sqlx::query_as::<_, (String, String)>(sql)
            .fetch_all(&mut conn)
            .await
            .unwrap();
        sqlx::Connection::close(conn).await.unwrap();
        rows
    }

    async fn load(path: &Path, name: &str, content: &str) -> Result<u64, LoadError> {
        let mut conn = DbConnection::sqlite(path).await.unwrap();
        let (table, rows) = table_for(name, content);
        let result = replace_table(&mut conn, "uploads", &table, rows, None).await;
        conn.close().await.unwrap();
        result
    }

    #[tokio::test]
    async fn test_replace_table_loads_rows_in_file_order() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("load.db");

        let inserted = load(&db_path, "sales", "id,amount\n1,100\n2,200\n3,300\n")
            .await
            .unwrap();
        assert_eq!(inserted, 3);

        let rows = fetch_rows(&db_path, "SELECT `id`, `amount` FROM `sales` ORDER BY rowid").await;
        assert_eq!(
            rows,
            vec![
                ("1".to_string(), "100".to_string()),
                ("2".to_string(), "200".to_string()),
                ("3".to_string(), "300".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_replace_table_header_only() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("load.db");

        let inserted = load(&db_path, "empty", "id,amount\n").await.unwrap();
        assert_eq!(inserted, 0);

        let rows = fetch_rows(&db_path, "SELECT `id`, `amount` FROM `empty`").await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_failed_row_rolls_back_whole_batch() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("load.db");

        let err = load(&db_path, "sales", "id,amount\n1,100\n2,200,extra\n3,300\n")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Execute(_)));

        // The table exists (DDL is not rolled back) but holds none of this load's rows
        let rows = fetch_rows(&db_path, "SELECT `id`, `amount` FROM `sales`").await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_second_load_replaces_first() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("load.db");

        load(&db_path, "sales", "id,amount\n1,100\n2,200\n")
            .await
            .unwrap();
        load(&db_path, "sales", "id,amount\n9,900\n").await.unwrap();

        let rows = fetch_rows(&db_path, "SELECT `id`, `amount` FROM `sales`").await;
        assert_eq!(rows, vec![("9".to_string(), "900".to_string())]);
    }

    #[tokio::test]
    async fn test_replace_table_changes_columns() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("load.db");

        load(&db_path, "people", "id,name,email\n1,a,a@x\n")
            .await
            .unwrap();
        load(&db_path, "people", "code,label\nX,Y\n").await.unwrap();

        let rows = fetch_rows(&db_path, "SELECT `code`, `label` FROM `people`").await;
        assert_eq!(rows, vec![("X".to_string(), "Y".to_string())]);
    }

    #[tokio::test]
    async fn test_duplicate_columns_rejected_by_database() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("load.db");

        let err = load(&db_path, "dupes", "a,a\n1,2\n").await.unwrap_err();
        assert!(matches!(err, LoadError::Execute(_)));
    }

    #[tokio::test]
    async fn test_lock_timeout_leaves_table_untouched() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("load.db");
        load(&db_path, "sales", "id,amount\n1,100\n").await.unwrap();

        let mut conn = DbConnection::sqlite(&db_path).await.unwrap();
        conn.execute("CREATE TABLE held_locks (name TEXT PRIMARY KEY)")
            .await
            .unwrap();
        conn.execute("INSERT INTO held_locks (name) VALUES ('uploads.sales')")
            .await
            .unwrap();

        let (table, rows) = table_for("sales", "code,label\nX,Y\n");
        let result =
            replace_table(&mut conn, "uploads", &table, rows, Some(Duration::from_secs(1))).await;
        conn.close().await.unwrap();

        assert!(matches!(result, Err(LoadError::LockTimeout { ref table }) if table == "sales"));

        // Neither DROP nor CREATE ran
        let rows = fetch_rows(&db_path, "SELECT `id`, `amount` FROM `sales`").await;
        assert_eq!(rows, vec![("1".to_string(), "100".to_string())]);
    }

    #[test]
    fn test_lock_name() {
        assert_eq!(lock_name("uploads", "sales"), "uploads.sales");

        let long_table = "t".repeat(100);
        let name = lock_name("uploads", &long_table);
        assert_eq!(name.chars().count(), MAX_LOCK_NAME_LEN);
        assert!(name.starts_with("uploads.ttt"));
    }
}
