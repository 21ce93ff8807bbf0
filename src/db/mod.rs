pub mod models;
pub mod posts;

use anyhow::Context;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use std::path::Path;

use crate::state::DbPool;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../migrations/001_initial.sql"),
)];

/// Anonymous request metadata columns, added outside the tracked
/// migration list so databases created before the tracking table
/// existed converge on the same schema.
const METADATA_COLUMNS: &[&str] = &[
    "raw_ip",
    "ip_hash",
    "user_agent",
    "accept_lang",
    "referer",
    "client_tz",
    "client_lang",
    "screen",
    "platform",
];

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path);
    let pool = Pool::builder().max_size(8).build(manager)?;

    // Configure SQLite for performance
    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    ensure_metadata_columns(&conn)?;

    tracing::info!("Database migrations complete");
    Ok(())
}

/// Additive column migration: "duplicate column name" is the only
/// tolerated failure, anything else aborts startup.
fn ensure_metadata_columns(conn: &Connection) -> anyhow::Result<()> {
    for column in METADATA_COLUMNS {
        let sql = format!("ALTER TABLE posts ADD COLUMN {column} TEXT NOT NULL DEFAULT ''");
        match conn.execute_batch(&sql) {
            Ok(()) => {}
            Err(e) if e.to_string().contains("duplicate column name") => {}
            Err(e) => {
                return Err(e).with_context(|| format!("adding posts.{column} column"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory();
        Pool::builder().max_size(1).build(manager).unwrap()
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn create_pool_creates_db_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("sub/dir/test.db");
        let pool = create_pool(&db_path).unwrap();
        assert!(db_path.exists());
        // Verify we can get a connection
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn migrations_run_successfully() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let tables: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .filter_map(|r| r.ok())
                .collect()
        };
        assert!(tables.contains(&"posts".to_string()));
    }

    #[test]
    fn migrations_are_idempotent() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap(); // Should not error on second run

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn metadata_columns_are_added() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let columns = table_columns(&conn, "posts");
        for expected in METADATA_COLUMNS {
            assert!(
                columns.contains(&expected.to_string()),
                "missing column {expected}"
            );
        }
    }

    #[test]
    fn metadata_columns_tolerate_reruns() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        // Columns already exist; a second pass must be a no-op
        ensure_metadata_columns(&conn).unwrap();
        ensure_metadata_columns(&conn).unwrap();
    }

    #[test]
    fn metadata_columns_converge_on_pre_tracking_schema() {
        // A database created by an older deployment: posts exists but
        // neither schema_version nor the metadata columns do.
        let pool = test_pool();
        let conn = pool.get().unwrap();
        conn.execute_batch(
            "CREATE TABLE posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                story TEXT NOT NULL,
                feeling TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .unwrap();
        drop(conn);

        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let columns = table_columns(&conn, "posts");
        assert!(columns.contains(&"ip_hash".to_string()));
    }

    #[test]
    fn missing_table_fails_loudly() {
        // Anything other than a duplicate column must surface
        let pool = test_pool();
        let conn = pool.get().unwrap();
        assert!(ensure_metadata_columns(&conn).is_err());
    }
}
