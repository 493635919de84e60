//! SQLite storage backend for MindGraph

use super::session::Session;
use super::traits::{OpenStore, StorageError, StorageResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed graph store
///
/// Uses a single SQLite database file with tables for resources (every
/// element kind, identifiers included), relations between them, and
/// friendships between users. Thread-safe via internal mutex on the
/// connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    ///
    /// Column names of `resources` are the persisted property names.
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Every graph element: vertices, edges, identifiers, schemas, properties
            CREATE TABLE IF NOT EXISTS resources (
                uri TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                kind TEXT NOT NULL,
                label TEXT,
                comment TEXT,
                images TEXT,
                creation_date INTEGER NOT NULL,
                last_modification_date INTEGER NOT NULL,
                shareLevel INTEGER,
                last_center_date INTEGER,
                number_of_visits INTEGER,
                nb_references INTEGER,
                colors TEXT,
                childrenIndexes TEXT,
                external_uri TEXT,
                is_pattern INTEGER NOT NULL DEFAULT 0,
                private_context TEXT,
                public_context TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_resources_owner
                ON resources(owner);
            CREATE INDEX IF NOT EXISTS idx_resources_kind
                ON resources(kind, owner);
            CREATE INDEX IF NOT EXISTS idx_resources_share_level
                ON resources(shareLevel);
            CREATE INDEX IF NOT EXISTS idx_resources_last_center_date
                ON resources(last_center_date);
            CREATE INDEX IF NOT EXISTS idx_resources_external_uri
                ON resources(external_uri);

            -- Directed relations; at most one per (from, kind, to)
            CREATE TABLE IF NOT EXISTS relations (
                from_uri TEXT NOT NULL,
                kind TEXT NOT NULL,
                to_uri TEXT NOT NULL,
                relation_external_uri TEXT,
                PRIMARY KEY (from_uri, kind, to_uri)
            );

            CREATE INDEX IF NOT EXISTS idx_relations_target
                ON relations(to_uri, kind);

            -- Symmetric friendships, stored once with user_a < user_b
            CREATE TABLE IF NOT EXISTS friendships (
                user_a TEXT NOT NULL,
                user_b TEXT NOT NULL,
                status TEXT NOT NULL,
                PRIMARY KEY (user_a, user_b)
            );

            CREATE INDEX IF NOT EXISTS idx_friendships_user_b
                ON friendships(user_b);

            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Self::migrate_add_sort_dates(conn)?;
        Ok(())
    }

    /// Add the nullable `sort_date` / `move_date` columns to databases
    /// created before elements could be reordered
    fn migrate_add_sort_dates(conn: &Connection) -> StorageResult<()> {
        let has_sort_date: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('resources') WHERE name = 'sort_date'",
            [],
            |row| row.get(0),
        )?;
        if !has_sort_date {
            conn.execute("ALTER TABLE resources ADD COLUMN sort_date INTEGER", [])?;
            conn.execute("ALTER TABLE resources ADD COLUMN move_date INTEGER", [])?;
        }
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` (or a panic) the transaction
    /// is dropped uncommitted and rolls back; the connection lock is
    /// released on every path.
    pub fn with_session<T, E>(&self, f: impl FnOnce(&Session<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let mut conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let tx = conn.transaction().map_err(StorageError::from)?;
        let session = Session::new(tx);
        let value = f(&session)?;
        session.commit()?;
        Ok(value)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}
